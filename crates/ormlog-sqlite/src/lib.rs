//! SQLite storage backend for ormlog

mod common;
mod connection;
mod database;
pub mod memory;

pub use common::{SqliteConfig, SqliteConnectionManager};
pub use connection::{SqliteConnection, SqliteTransaction};
pub use database::{SqliteContext, SqliteDatabase};
