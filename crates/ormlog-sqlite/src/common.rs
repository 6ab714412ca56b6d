use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use ormlog_sql_common::pool::{self, DatabaseConfig, DatabasePool};
use ormlog_sql_common::value::Value;
use rusqlite::Connection;

use crate::connection::SqliteConnection;

/// Connections of a file database
const DEFAULT_MAX_CONNECTIONS: usize = 10;
/// How long to wait for a free connection, and for a lock held by another connection
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration of a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    path: Option<PathBuf>,
    max_size: usize,
    timeout: Duration,
}

impl SqliteConfig {
    /// File database at `path`
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            max_size: DEFAULT_MAX_CONNECTIONS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// In-memory database
    ///
    /// Every in-memory connection is a separate database, so the pool is limited to one.
    pub fn memory() -> Self {
        Self {
            path: None,
            max_size: 1,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Caps the number of open connections. Ignored for in-memory databases.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        if self.path.is_some() {
            self.max_size = max_size.max(1);
        }
        self
    }

    /// Sets the connection and busy timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether this is an in-memory database
    pub fn is_memory(&self) -> bool {
        self.path.is_none()
    }

    /// Path of the file database
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl From<&str> for SqliteConfig {
    fn from(path: &str) -> Self {
        if path.contains(":memory:") {
            Self::memory()
        } else {
            Self::file(path)
        }
    }
}

impl From<PathBuf> for SqliteConfig {
    fn from(path: PathBuf) -> Self {
        Self::file(path)
    }
}

impl From<&PathBuf> for SqliteConfig {
    fn from(path: &PathBuf) -> Self {
        Self::file(path)
    }
}

impl DatabaseConfig for SqliteConfig {
    fn max_size(&self) -> usize {
        self.max_size
    }

    fn default_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Opens and configures rusqlite connections for the pool
#[derive(Debug)]
pub struct SqliteConnectionManager;

impl DatabasePool for SqliteConnectionManager {
    type Connection = SqliteConnection;

    type Config = SqliteConfig;

    type Error = rusqlite::Error;

    fn new_resource(
        config: &Self::Config,
        _stale: Arc<AtomicBool>,
        timeout: Duration,
    ) -> Result<Self::Connection, pool::Error<Self::Error>> {
        let conn = match config.path() {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };

        conn.pragma_update(None, "busy_timeout", timeout.as_millis() as i64)?;
        if !config.is_memory() {
            conn.pragma_update(None, "journal_mode", "wal")?;
        }
        conn.pragma_update(None, "synchronous", "normal")?;
        conn.pragma_update(None, "temp_store", "memory")?;

        Ok(SqliteConnection::new(conn))
    }
}

/// Convert a generic value into its rusqlite counterpart
#[inline(always)]
pub fn to_sqlite(v: Value) -> rusqlite::types::Value {
    match v {
        Value::Blob(blob) => rusqlite::types::Value::Blob(blob),
        Value::Integer(i) => rusqlite::types::Value::Integer(i),
        Value::Null => rusqlite::types::Value::Null,
        Value::Text(t) => rusqlite::types::Value::Text(t),
        Value::Real(r) => rusqlite::types::Value::Real(r),
    }
}

/// Convert a rusqlite value back into a generic value
#[inline(always)]
pub fn from_sqlite(v: rusqlite::types::Value) -> Value {
    match v {
        rusqlite::types::Value::Blob(blob) => Value::Blob(blob),
        rusqlite::types::Value::Integer(i) => Value::Integer(i),
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Text(t) => Value::Text(t),
        rusqlite::types::Value::Real(r) => Value::Real(r),
    }
}
