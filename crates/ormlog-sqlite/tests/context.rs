//! Entities written and read back through SQLite persistence contexts
use std::thread;

use chrono::{DateTime, FixedOffset, Local};
use ormlog_sql_common::schema::{ColumnType, EntityBuilder};
use ormlog_sql_common::stmt::{query, Column};
use ormlog_sql_common::{
    column_as_nullable_string, column_as_number, column_as_string, unpack_into, ContextFactory,
    Entity, Error, PersistenceContext,
};
use ormlog_sqlite::{memory, SqliteConfig, SqliteDatabase};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: i64,
    created: DateTime<FixedOffset>,
    kind: i32,
    body: String,
    note: Option<String>,
}

impl Entry {
    fn new(kind: i32, body: &str) -> Self {
        Self {
            id: 0,
            created: Local::now().fixed_offset(),
            kind,
            body: body.to_owned(),
            note: None,
        }
    }
}

impl Entity for Entry {
    fn configure(builder: &mut EntityBuilder) {
        builder.to_table("entries");
        builder.property("id").of_type(ColumnType::Integer);
        builder.property("created").of_type(ColumnType::Timestamp);
        builder.property("kind").of_type(ColumnType::Integer);
        builder.property("body").has_max_length(16);
        builder.property("note").is_required(false);
        builder.has_key("id", true);
    }

    fn to_values(&self) -> Vec<(&'static str, ormlog_sql_common::value::Value)> {
        vec![
            ("created", self.created.into()),
            ("kind", self.kind.into()),
            ("body", self.body.as_str().into()),
            ("note", self.note.clone().into()),
        ]
    }

    fn from_row(row: Vec<Column>) -> Result<Self, Error> {
        unpack_into!(let (id, created, kind, body, note) = row);
        Ok(Self {
            id: column_as_number!(id),
            created: column_as_string!(created, DateTime::parse_from_rfc3339),
            kind: column_as_number!(kind),
            body: column_as_string!(body),
            note: column_as_nullable_string!(note),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tag {
    id: Uuid,
    label: String,
}

impl Entity for Tag {
    fn configure(builder: &mut EntityBuilder) {
        builder.to_table("tags");
        builder.property("id").of_type(ColumnType::Uuid);
        builder.property("label");
        builder.has_key("id", false);
    }

    fn to_values(&self) -> Vec<(&'static str, ormlog_sql_common::value::Value)> {
        vec![("id", self.id.into()), ("label", self.label.as_str().into())]
    }

    fn from_row(row: Vec<Column>) -> Result<Self, Error> {
        unpack_into!(let (id, label) = row);
        Ok(Self {
            id: column_as_string!(id, Uuid::parse_str),
            label: column_as_string!(label),
        })
    }
}

#[test]
fn test_generated_keys_and_round_trip() {
    let db = memory::empty().expect("database");
    db.migrate::<Entry>().expect("migrated");

    let mut context = db.create_context().expect("context");
    let mut first = Entry::new(2, "first");
    first.note = Some("with a note".to_owned());
    context.add(first.clone()).expect("added");
    context.add(Entry::new(4, "second")).expect("added");
    assert_eq!(context.save_changes().expect("saved"), 2);

    let stored = db.context().all::<Entry>().expect("rows");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, 1);
    assert_eq!(stored[1].id, 2);
    assert_eq!(stored[0].created, first.created);
    assert_eq!(stored[0].note.as_deref(), Some("with a note"));
    assert_eq!(stored[1].kind, 4);
    assert_eq!(stored[1].note, None);
}

#[test]
fn test_client_keys_and_duplicates() {
    let db = memory::empty().expect("database");
    db.migrate::<Tag>().expect("migrated");

    let tag = Tag {
        id: Uuid::new_v4(),
        label: "first".to_owned(),
    };

    let mut context = db.context();
    context.add(tag.clone()).expect("added");
    context.save_changes().expect("saved");

    let mut context = db.context();
    context.add(tag.clone()).expect("added");
    assert!(matches!(context.save_changes(), Err(Error::Duplicate)));

    assert_eq!(db.context().all::<Tag>().expect("rows"), vec![tag]);
    assert_eq!(db.pool().in_use(), 0);
}

#[test]
fn test_migrate_is_idempotent() {
    let db = memory::empty().expect("database");
    db.migrate::<Entry>().expect("migrated");
    db.migrate::<Entry>().expect("migrated twice");

    let tables = query("SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = :name")
        .expect("valid sql")
        .bind("name", "entries")
        .pluck(&*db.pool().get().expect("connection"))
        .expect("count");
    assert_eq!(tables, Some(Column::Integer(1)));
}

#[test]
fn test_file_database_is_shared_across_threads() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = SqliteDatabase::new(SqliteConfig::file(dir.path().join("entries.sqlite")).with_max_size(4))
        .expect("database");
    db.migrate::<Entry>().expect("migrated");

    let handles = (0..8)
        .map(|i| {
            let db = db.clone();
            thread::spawn(move || {
                let mut context = db.context();
                context.add(Entry::new(i, "threaded")).expect("added");
                context.save_changes().expect("saved")
            })
        })
        .collect::<Vec<_>>();

    let saved: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .sum();
    assert_eq!(saved, 8);

    let reopened = SqliteDatabase::new(dir.path().join("entries.sqlite")).expect("database");
    assert_eq!(reopened.context().all::<Entry>().expect("rows").len(), 8);
}
