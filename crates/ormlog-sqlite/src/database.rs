//! SQLite database
use std::sync::Arc;

use ormlog_sql_common::pool::Pool;
use ormlog_sql_common::stmt::query;
use ormlog_sql_common::{ContextFactory, DbContext, Entity, Error};

use crate::common::{SqliteConfig, SqliteConnectionManager};

/// Persistence context over a SQLite pool
pub type SqliteContext = DbContext<SqliteConnectionManager>;

/// SQLite database, the owner of the connection pool
///
/// Cloning is cheap, every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl SqliteDatabase {
    /// Opens the database and checks that a first connection can be established
    ///
    /// The first connection stays in the pool. For an in-memory database it is the database.
    pub fn new<X>(config: X) -> Result<Self, Error>
    where
        X: Into<SqliteConfig>,
    {
        let config = config.into();
        tracing::debug!(
            "Opening sqlite database {}",
            config
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| ":memory:".to_owned())
        );

        let pool = Pool::new(config);
        drop(pool.get()?);

        Ok(Self { pool })
    }

    /// Creates the table of the entity if it does not exist yet
    pub fn migrate<E: Entity>(&self) -> Result<(), Error> {
        let schema = E::schema()?;
        tracing::info!("Creating table {} if missing", schema.table);

        let conn = self.pool.get()?;
        query(&schema.create_table_sql())?.batch(&*conn)
    }

    /// Opens a new persistence context
    pub fn context(&self) -> SqliteContext {
        DbContext::new(self.pool.clone())
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &Arc<Pool<SqliteConnectionManager>> {
        &self.pool
    }
}

impl ContextFactory for SqliteDatabase {
    type Context = SqliteContext;

    fn create_context(&self) -> Result<Self::Context, Error> {
        Ok(self.context())
    }
}
