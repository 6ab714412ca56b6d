//! In-memory database that is provided by the `ormlog-sqlite` crate, mainly for testing purposes.
use ormlog_sql_common::Error;

use crate::common::SqliteConfig;
use crate::database::SqliteDatabase;

/// Creates a new in-memory [`SqliteDatabase`] instance
pub fn empty() -> Result<SqliteDatabase, Error> {
    SqliteDatabase::new(SqliteConfig::memory())
}
