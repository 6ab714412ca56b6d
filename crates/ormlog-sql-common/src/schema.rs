//! Entity model builder
//!
//! An [`EntityBuilder`] collects the table name, the columns, the primary key and the column
//! constraints of an entity. The finished [`TableSchema`] renders the statements the context and
//! the migrations need.

use crate::Error;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    /// Signed integer
    Integer,
    /// Floating point
    Real,
    /// Text
    #[default]
    Text,
    /// Binary data
    Blob,
    /// Date and time with offset, stored as RFC 3339 text
    Timestamp,
    /// UUID, stored as hyphenated text
    Uuid,
}

impl ColumnType {
    fn sql_type(&self, max_length: Option<usize>) -> String {
        match (self, max_length) {
            (ColumnType::Integer, _) => "INTEGER".to_owned(),
            (ColumnType::Real, _) => "REAL".to_owned(),
            (ColumnType::Text, Some(len)) => format!("VARCHAR({len})"),
            (ColumnType::Text, None) | (ColumnType::Timestamp, _) => "TEXT".to_owned(),
            (ColumnType::Blob, _) => "BLOB".to_owned(),
            (ColumnType::Uuid, _) => "CHAR(36)".to_owned(),
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Storage type
    pub column_type: ColumnType,
    /// Maximum length, for text columns
    pub max_length: Option<usize>,
    /// Whether the column accepts `NULL`
    pub nullable: bool,
}

/// Primary key definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDef {
    /// Key column
    pub column: String,
    /// Whether the store generates the key on insert
    pub generated: bool,
}

/// Finished table shape of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name
    pub table: String,
    /// Columns, in declaration order
    pub columns: Vec<ColumnDef>,
    /// Primary key
    pub key: KeyDef,
}

impl TableSchema {
    /// Looks up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Columns written on insert; a store-generated key is left out
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(move |column| !(self.key.generated && column.name == self.key.column))
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this schema
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut sql = format!(
                    "    {} {}",
                    column.name,
                    column.column_type.sql_type(column.max_length)
                );

                if column.name == self.key.column {
                    sql.push_str(" PRIMARY KEY");
                    if self.key.generated {
                        sql.push_str(" AUTOINCREMENT");
                    }
                } else if !column.nullable {
                    sql.push_str(" NOT NULL");
                }

                sql
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            self.table, columns
        )
    }

    /// `INSERT` statement with one `:column` placeholder per inserted column
    pub fn insert_sql(&self) -> String {
        let names = self
            .insert_columns()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            names
                .iter()
                .map(|name| format!(":{name}"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    /// `SELECT` of every column in declaration order, sorted by key
    pub fn select_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.columns
                .iter()
                .map(|column| column.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            self.table,
            self.key.column
        )
    }
}

/// Builder for a single column, returned by [`EntityBuilder::property`]
#[derive(Debug)]
pub struct ColumnBuilder<'a> {
    column: &'a mut ColumnDef,
}

impl ColumnBuilder<'_> {
    /// Sets the storage type
    pub fn of_type(self, column_type: ColumnType) -> Self {
        self.column.column_type = column_type;
        self
    }

    /// Bounds the length of a text column
    pub fn has_max_length(self, max_length: usize) -> Self {
        self.column.max_length = Some(max_length);
        self
    }

    /// Whether the column must hold a value
    pub fn is_required(self, required: bool) -> Self {
        self.column.nullable = !required;
        self
    }
}

/// Entity model builder
#[derive(Debug, Default)]
pub struct EntityBuilder {
    table: Option<String>,
    columns: Vec<ColumnDef>,
    key: Option<KeyDef>,
}

impl EntityBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the entity to a table
    pub fn to_table<T: Into<String>>(&mut self, table: T) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Returns the builder of a column, declaring it as a required text column on first use
    pub fn property(&mut self, name: &str) -> ColumnBuilder<'_> {
        let index = match self.columns.iter().position(|column| column.name == name) {
            Some(index) => index,
            None => {
                self.columns.push(ColumnDef {
                    name: name.to_owned(),
                    column_type: ColumnType::default(),
                    max_length: None,
                    nullable: false,
                });
                self.columns.len() - 1
            }
        };

        ColumnBuilder {
            column: &mut self.columns[index],
        }
    }

    /// Declares the primary key
    pub fn has_key(&mut self, name: &str, generated: bool) -> &mut Self {
        let _ = self.property(name);
        self.key = Some(KeyDef {
            column: name.to_owned(),
            generated,
        });
        self
    }

    /// Finishes the model
    pub fn finish(self) -> Result<TableSchema, Error> {
        let table = self
            .table
            .ok_or(Error::Internal("Entity is not mapped to a table".to_owned()))?;
        let key = self.key.ok_or_else(|| Error::MissingKey(table.clone()))?;

        Ok(TableSchema {
            table,
            columns: self.columns,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableSchema {
        let mut builder = EntityBuilder::new();
        builder.to_table("logs");
        builder.property("id").of_type(ColumnType::Integer);
        builder.property("name").has_max_length(255);
        builder.property("detail").is_required(false);
        builder.has_key("id", true);
        builder.finish().expect("valid model")
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            sample().create_table_sql(),
            "CREATE TABLE IF NOT EXISTS logs (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    name VARCHAR(255) NOT NULL,\n    detail TEXT\n);"
        );
    }

    #[test]
    fn test_generated_key_is_not_inserted() {
        assert_eq!(
            sample().insert_sql(),
            "INSERT INTO logs (name, detail) VALUES (:name, :detail)"
        );
    }

    #[test]
    fn test_property_is_reused() {
        let mut builder = EntityBuilder::new();
        builder.to_table("logs");
        builder.property("name").of_type(ColumnType::Text);
        builder.property("name").has_max_length(10);
        builder.has_key("name", false);

        let schema = builder.finish().expect("valid model");
        assert_eq!(schema.columns.len(), 1);
        assert_eq!(schema.columns[0].max_length, Some(10));
    }

    #[test]
    fn test_missing_key() {
        let mut builder = EntityBuilder::new();
        builder.to_table("logs");
        builder.property("name");

        assert!(matches!(builder.finish(), Err(Error::MissingKey(table)) if table == "logs"));
    }
}
