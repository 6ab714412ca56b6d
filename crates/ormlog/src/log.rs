//! Log record model
use std::fmt::Debug;

use chrono::{DateTime, FixedOffset, Local};
use ormlog_sql_common::stmt::Column;
use ormlog_sql_common::value::Value;
use ormlog_sql_common::{
    column_as_number, column_as_string, unpack_into, ColumnType, ConversionError, Entity,
    EntityBuilder, Error,
};
use uuid::Uuid;

use crate::model;

/// Primary key of a log row
///
/// Integer keys are generated by the store on insert. Other keys are generated here, before the
/// row is written.
pub trait LogKey: Clone + Debug + PartialEq + Send + Sync + 'static + Into<Value> {
    /// Whether the store generates the key
    const GENERATED: bool;

    /// Storage type of the key column
    const COLUMN_TYPE: ColumnType;

    /// Key of a row that was not stored yet
    fn new_key() -> Self;

    /// Reads the key back from its column
    fn from_column(column: Column) -> Result<Self, Error>;
}

impl LogKey for i32 {
    const GENERATED: bool = true;
    const COLUMN_TYPE: ColumnType = ColumnType::Integer;

    fn new_key() -> Self {
        0
    }

    fn from_column(column: Column) -> Result<Self, Error> {
        Ok(column_as_number!(column))
    }
}

impl LogKey for i64 {
    const GENERATED: bool = true;
    const COLUMN_TYPE: ColumnType = ColumnType::Integer;

    fn new_key() -> Self {
        0
    }

    fn from_column(column: Column) -> Result<Self, Error> {
        Ok(column_as_number!(column))
    }
}

impl LogKey for Uuid {
    const GENERATED: bool = false;
    const COLUMN_TYPE: ColumnType = ColumnType::Uuid;

    fn new_key() -> Self {
        Uuid::new_v4()
    }

    fn from_column(column: Column) -> Result<Self, Error> {
        Ok(column_as_string!(column, Uuid::parse_str))
    }
}

impl LogKey for String {
    const GENERATED: bool = false;
    const COLUMN_TYPE: ColumnType = ColumnType::Text;

    fn new_key() -> Self {
        Uuid::new_v4().to_string()
    }

    fn from_column(column: Column) -> Result<Self, Error> {
        Ok(column_as_string!(column))
    }
}

/// One persisted log record
#[derive(Debug, Clone, PartialEq)]
pub struct Log<K: LogKey = i32> {
    /// Primary key
    pub id: K,
    /// When the record was captured
    pub time_stamp: DateTime<FixedOffset>,
    /// Numeric [`LogLevel`](crate::LogLevel)
    pub level: i32,
    /// Numeric event id
    pub event_id: i32,
    /// Category the record was written for
    pub name: String,
    /// Rendered message
    pub message: String,
}

impl<K: LogKey> Default for Log<K> {
    fn default() -> Self {
        Self {
            id: K::new_key(),
            time_stamp: Local::now().fixed_offset(),
            level: 0,
            event_id: 0,
            name: String::new(),
            message: String::new(),
        }
    }
}

impl<K: LogKey> Log<K> {
    /// Number of columns of a plain log row
    pub const COLUMNS: usize = 6;

    /// Declares the log columns, in storage order
    ///
    /// Rows that embed a [`Log`] call this before declaring their own columns, and finish with
    /// [`model::build`].
    pub fn configure_columns(builder: &mut EntityBuilder) {
        builder.property("id");
        builder.property("time_stamp").of_type(ColumnType::Timestamp);
        builder.property("level").of_type(ColumnType::Integer);
        builder.property("event_id").of_type(ColumnType::Integer);
        builder.property("name");
        builder.property("message");
    }

    /// Column values of the log part of a row
    pub fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("time_stamp", self.time_stamp.into()),
            ("level", self.level.into()),
            ("event_id", self.event_id.into()),
            ("name", self.name.as_str().into()),
            ("message", self.message.as_str().into()),
        ]
    }

    /// Reads the log part of a row, returning the columns that follow it
    pub fn split_row(row: Vec<Column>) -> Result<(Self, Vec<Column>), Error> {
        if row.len() < Self::COLUMNS {
            return Err(ConversionError::MissingColumn(Self::COLUMNS, row.len()).into());
        }

        let mut log_columns = row;
        let rest = log_columns.split_off(Self::COLUMNS);
        unpack_into!(let (id, time_stamp, level, event_id, name, message) = log_columns);

        Ok((
            Self {
                id: K::from_column(id)?,
                time_stamp: column_as_string!(time_stamp, DateTime::parse_from_rfc3339),
                level: column_as_number!(level),
                event_id: column_as_number!(event_id),
                name: column_as_string!(name),
                message: column_as_string!(message),
            },
            rest,
        ))
    }
}

impl<K: LogKey> Entity for Log<K> {
    fn configure(builder: &mut EntityBuilder) {
        builder.to_table("logs");
        Self::configure_columns(builder);
        model::build::<K>(builder);
    }

    fn to_values(&self) -> Vec<(&'static str, Value)> {
        self.values()
    }

    fn from_row(row: Vec<Column>) -> Result<Self, Error> {
        Self::split_row(row).map(|(log, _)| log)
    }
}

/// A row type that carries a [`Log`]
///
/// The default creator fills the log part of a blank row; anything else the row stores is up to
/// the row's own activator.
pub trait LogEntity: Entity {
    /// Key type of the embedded log
    type Key: LogKey;

    /// Log part of the row
    fn log(&self) -> &Log<Self::Key>;

    /// Mutable log part of the row
    fn log_mut(&mut self) -> &mut Log<Self::Key>;
}

impl<K: LogKey> LogEntity for Log<K> {
    type Key = K;

    fn log(&self) -> &Log<K> {
        self
    }

    fn log_mut(&mut self) -> &mut Log<K> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_schema() {
        let schema = Log::<i32>::schema().expect("model");

        assert_eq!(schema.table, "logs");
        assert_eq!(
            schema
                .columns
                .iter()
                .map(|column| column.name.as_str())
                .collect::<Vec<_>>(),
            vec!["id", "time_stamp", "level", "event_id", "name", "message"]
        );
        assert_eq!(
            schema.insert_sql(),
            "INSERT INTO logs (time_stamp, level, event_id, name, message) VALUES (:time_stamp, :level, :event_id, :name, :message)"
        );
    }

    #[test]
    fn test_split_row() {
        let log = Log::<Uuid> {
            level: 3,
            event_id: 9,
            name: "app".to_owned(),
            message: "hello".to_owned(),
            ..Default::default()
        };

        let mut row = log
            .values()
            .into_iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>();
        row.push(Column::Text("extra".to_owned()));

        let (read, rest) = Log::<Uuid>::split_row(row).expect("valid row");
        assert_eq!(read, log);
        assert_eq!(rest, vec![Column::Text("extra".to_owned())]);
    }

    #[test]
    fn test_short_row() {
        assert!(matches!(
            Log::<i32>::split_row(vec![Column::Integer(1)]),
            Err(Error::Conversion(ConversionError::MissingColumn(6, 1)))
        ));
    }

    #[test]
    fn test_client_keys_are_unique() {
        assert_ne!(Log::<Uuid>::default().id, Log::<Uuid>::default().id);
    }
}
