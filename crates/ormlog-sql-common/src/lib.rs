//! Generic SQL persistence layer for ormlog
//!
//! Entities declare their table shape through an [`schema::EntityBuilder`], rows are written
//! through a short-lived [`context::DbContext`] that owns one pooled connection, and every backend
//! only has to provide a [`database::DatabaseConnector`] and a [`pool::DatabasePool`].

pub mod context;
pub mod database;
pub mod entity;
mod error;
mod macros;
pub mod pool;
pub mod schema;
pub mod stmt;
pub mod value;

pub use context::{ContextFactory, DbContext, PersistenceContext};
pub use entity::Entity;
pub use error::{ConversionError, Error};
pub use schema::{ColumnType, EntityBuilder, TableSchema};

#[cfg(test)]
mod test_utils;
