//! Entity trait
use crate::schema::{EntityBuilder, TableSchema};
use crate::stmt::Column;
use crate::value::Value;
use crate::Error;

/// A type persisted as one row of a table
pub trait Entity: Sized + Send + 'static {
    /// Declares the table, the columns, the key and the constraints of the entity
    fn configure(builder: &mut EntityBuilder);

    /// Finished model of the entity
    fn schema() -> Result<TableSchema, Error> {
        let mut builder = EntityBuilder::new();
        Self::configure(&mut builder);
        builder.finish()
    }

    /// Column values of this instance, by column name
    ///
    /// Columns without a value are written as `NULL`.
    fn to_values(&self) -> Vec<(&'static str, Value)>;

    /// Hydrates an instance from a row holding every column in declaration order
    fn from_row(row: Vec<Column>) -> Result<Self, Error>;
}
