//! rusqlite connection
use std::time::Instant;

use ormlog_sql_common::database::{DatabaseConnector, DatabaseExecutor, DatabaseTransaction};
use ormlog_sql_common::stmt::{Column, ExpectedSqlResponse, Statement};
use ormlog_sql_common::{ConversionError, Error};
use rusqlite::{ffi, Connection, ErrorCode};

use crate::common::{from_sqlite, to_sqlite};

/// How many ms is considered a slow query, and it'd be logged for further debugging
const SLOW_QUERY_THRESHOLD_MS: u128 = 20;

#[derive(Debug)]
enum DbResponse {
    AffectedRows(usize),
    Pluck(Option<Column>),
    Row(Option<Vec<Column>>),
    Rows(Vec<Vec<Column>>),
    Ok,
}

#[derive(thiserror::Error, Debug)]
enum SqliteError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Inner(#[from] Error),

    /// Duplicate entry
    #[error("Duplicate")]
    Duplicate,

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl SqliteError {
    fn is_duplicate(&self) -> bool {
        matches!(
            self,
            SqliteError::Sqlite(rusqlite::Error::SqliteFailure(
                ffi::Error {
                    code,
                    extended_code,
                },
                _,
            )) if *code == ErrorCode::ConstraintViolation
                && (*extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || *extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
        )
    }

    /// Constraint violations on a key surface as [`SqliteError::Duplicate`]
    fn classify(self) -> Self {
        if self.is_duplicate() {
            SqliteError::Duplicate
        } else {
            self
        }
    }
}

impl From<SqliteError> for Error {
    fn from(val: SqliteError) -> Self {
        match val {
            SqliteError::Duplicate => Error::Duplicate,
            SqliteError::Conversion(e) => e.into(),
            SqliteError::Inner(e) => e,
            SqliteError::Sqlite(e) => Error::Database(Box::new(e)),
        }
    }
}

/// Process a query
#[inline(always)]
fn process_query(conn: &Connection, statement: Statement) -> Result<DbResponse, SqliteError> {
    let start = Instant::now();
    let expected_response = statement.expected_response;
    let (sql, placeholder_values) = statement.to_sql()?;

    if let ExpectedSqlResponse::Batch = expected_response {
        conn.execute_batch(&sql)?;
        return Ok(DbResponse::Ok);
    }

    let mut stmt = conn.prepare_cached(&sql)?;
    for (i, value) in placeholder_values.into_iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, to_sqlite(value))?;
    }

    let columns = stmt.column_count();

    let to_return = match expected_response {
        ExpectedSqlResponse::AffectedRows => DbResponse::AffectedRows(stmt.raw_execute()?),
        ExpectedSqlResponse::Batch => DbResponse::Ok,
        ExpectedSqlResponse::ManyRows => {
            let mut rows = stmt.raw_query();
            let mut results = vec![];

            while let Some(row) = rows.next()? {
                results.push(
                    (0..columns)
                        .map(|i| row.get(i).map(from_sqlite))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }

            DbResponse::Rows(results)
        }
        ExpectedSqlResponse::Pluck => {
            let mut rows = stmt.raw_query();
            DbResponse::Pluck(
                rows.next()?
                    .map(|row| row.get(0usize).map(from_sqlite))
                    .transpose()?,
            )
        }
        ExpectedSqlResponse::SingleRow => {
            let mut rows = stmt.raw_query();
            let row = rows
                .next()?
                .map(|row| {
                    (0..columns)
                        .map(|i| row.get(i).map(from_sqlite))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?;
            DbResponse::Row(row)
        }
    };

    let duration = start.elapsed();

    if duration.as_millis() > SLOW_QUERY_THRESHOLD_MS {
        tracing::warn!("[SLOW QUERY] Took {} ms: {}", duration.as_millis(), sql);
    }

    Ok(to_return)
}

/// A single rusqlite connection
#[derive(Debug)]
pub struct SqliteConnection {
    inner: Connection,
}

impl SqliteConnection {
    pub(crate) fn new(inner: Connection) -> Self {
        Self { inner }
    }

    fn run(
        &self,
        mut statement: Statement,
        expected: ExpectedSqlResponse,
    ) -> Result<DbResponse, Error> {
        statement.expected_response = expected;
        process_query(&self.inner, statement).map_err(|err| {
            let err = err.classify();
            tracing::debug!("Failed query with error {:?}", err);
            err.into()
        })
    }
}

impl DatabaseExecutor for SqliteConnection {
    fn name() -> &'static str {
        "sqlite"
    }

    fn execute(&self, statement: Statement) -> Result<usize, Error> {
        match self.run(statement, ExpectedSqlResponse::AffectedRows)? {
            DbResponse::AffectedRows(rows) => Ok(rows),
            _ => Err(Error::InvalidDbResponse),
        }
    }

    fn fetch_one(&self, statement: Statement) -> Result<Option<Vec<Column>>, Error> {
        match self.run(statement, ExpectedSqlResponse::SingleRow)? {
            DbResponse::Row(row) => Ok(row),
            _ => Err(Error::InvalidDbResponse),
        }
    }

    fn fetch_all(&self, statement: Statement) -> Result<Vec<Vec<Column>>, Error> {
        match self.run(statement, ExpectedSqlResponse::ManyRows)? {
            DbResponse::Rows(rows) => Ok(rows),
            _ => Err(Error::InvalidDbResponse),
        }
    }

    fn pluck(&self, statement: Statement) -> Result<Option<Column>, Error> {
        match self.run(statement, ExpectedSqlResponse::Pluck)? {
            DbResponse::Pluck(value) => Ok(value),
            _ => Err(Error::InvalidDbResponse),
        }
    }

    fn batch(&self, statement: Statement) -> Result<(), Error> {
        match self.run(statement, ExpectedSqlResponse::Batch)? {
            DbResponse::Ok => Ok(()),
            _ => Err(Error::InvalidDbResponse),
        }
    }

    fn last_insert_id(&self) -> Result<i64, Error> {
        Ok(self.inner.last_insert_rowid())
    }
}

impl DatabaseConnector for SqliteConnection {
    type Transaction = SqliteTransaction;
}

/// SQLite transaction handler
///
/// Transactions take the write lock up front (`BEGIN IMMEDIATE`), so a busy database fails at
/// begin, bounded by the busy timeout, instead of at commit.
#[derive(Debug)]
pub struct SqliteTransaction;

impl DatabaseTransaction<SqliteConnection> for SqliteTransaction {
    fn begin(conn: &mut SqliteConnection) -> Result<(), Error> {
        conn.inner
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| SqliteError::from(e).into())
    }

    fn commit(conn: &mut SqliteConnection) -> Result<(), Error> {
        conn.inner
            .execute_batch("COMMIT")
            .map_err(|e| SqliteError::from(e).into())
    }

    fn rollback(conn: &mut SqliteConnection) -> Result<(), Error> {
        conn.inner
            .execute_batch("ROLLBACK")
            .map_err(|e| SqliteError::from(e).into())
    }
}
