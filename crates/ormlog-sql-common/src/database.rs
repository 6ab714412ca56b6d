//! Database traits definition

use std::fmt::Debug;
#[cfg(test)]
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

#[cfg(test)]
use crate::stmt::query;
use crate::stmt::{Column, Statement};
use crate::Error;

/// Database Executor
///
/// This trait defines the expectations of a database execution. Calls are blocking, a log write
/// happens inline with the event that produced it.
pub trait DatabaseExecutor: Debug + Send {
    /// Database driver name
    fn name() -> &'static str;

    /// Executes a query and returns the affected rows
    fn execute(&self, statement: Statement) -> Result<usize, Error>;

    /// Runs the query and returns the first row or None
    fn fetch_one(&self, statement: Statement) -> Result<Option<Vec<Column>>, Error>;

    /// Runs the query and returns all the rows
    fn fetch_all(&self, statement: Statement) -> Result<Vec<Vec<Column>>, Error>;

    /// Fetches the first row and column from a query
    fn pluck(&self, statement: Statement) -> Result<Option<Column>, Error>;

    /// Batch execution
    fn batch(&self, statement: Statement) -> Result<(), Error>;

    /// Key generated by the store for the last inserted row on this connection
    fn last_insert_id(&self) -> Result<i64, Error>;
}

/// Database transaction trait
pub trait DatabaseTransaction<DB>
where
    DB: DatabaseExecutor,
{
    /// Commits the current transaction
    fn commit(conn: &mut DB) -> Result<(), Error>;

    /// Begin a transaction
    fn begin(conn: &mut DB) -> Result<(), Error>;

    /// Rolls back all changes of the current transaction
    fn rollback(conn: &mut DB) -> Result<(), Error>;
}

/// Database connector
pub trait DatabaseConnector: Debug + DatabaseExecutor + Send {
    /// Transaction handler for the connection
    type Transaction: DatabaseTransaction<Self>
    where
        Self: Sized;
}

/// Database connection with a transaction
///
/// The transaction is rolled back when the wrapper is dropped without an explicit commit.
#[derive(Debug)]
pub struct ConnectionWithTransaction<DB, W>
where
    DB: DatabaseConnector + 'static,
    W: Debug + Deref<Target = DB> + DerefMut<Target = DB> + Send + 'static,
{
    inner: Option<W>,
}

impl<DB, W> ConnectionWithTransaction<DB, W>
where
    DB: DatabaseConnector,
    W: Debug + Deref<Target = DB> + DerefMut<Target = DB> + Send + 'static,
{
    /// Creates a new transaction
    pub fn new(mut inner: W) -> Result<Self, Error> {
        DB::Transaction::begin(inner.deref_mut())?;
        Ok(Self { inner: Some(inner) })
    }

    /// Commits the transaction consuming it and releasing the connection back to the pool (or
    /// disconnecting)
    ///
    /// A failed commit is rolled back before the error is returned.
    pub fn commit(mut self) -> Result<(), Error> {
        let mut conn = self
            .inner
            .take()
            .ok_or(Error::Internal("Missing connection".to_owned()))?;

        DB::Transaction::commit(&mut conn).inspect_err(|_| {
            let _ = DB::Transaction::rollback(&mut conn);
        })
    }

    /// Rollback the transaction consuming it and releasing the connection back to the pool (or
    /// disconnecting)
    pub fn rollback(mut self) -> Result<(), Error> {
        let mut conn = self
            .inner
            .take()
            .ok_or(Error::Internal("Missing connection".to_owned()))?;

        DB::Transaction::rollback(&mut conn)
    }

    fn connection(&self) -> Result<&DB, Error> {
        self.inner
            .as_deref()
            .ok_or(Error::Internal("Missing internal connection".to_owned()))
    }
}

impl<DB, W> Drop for ConnectionWithTransaction<DB, W>
where
    DB: DatabaseConnector,
    W: Debug + Deref<Target = DB> + DerefMut<Target = DB> + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(mut conn) = self.inner.take() {
            let _ = DB::Transaction::rollback(conn.deref_mut());
        }
    }
}

impl<DB, W> DatabaseExecutor for ConnectionWithTransaction<DB, W>
where
    DB: DatabaseConnector,
    W: Debug + Deref<Target = DB> + DerefMut<Target = DB> + Send + 'static,
{
    fn name() -> &'static str {
        "Transaction"
    }

    fn execute(&self, statement: Statement) -> Result<usize, Error> {
        self.connection()?.execute(statement)
    }

    fn fetch_one(&self, statement: Statement) -> Result<Option<Vec<Column>>, Error> {
        self.connection()?.fetch_one(statement)
    }

    fn fetch_all(&self, statement: Statement) -> Result<Vec<Vec<Column>>, Error> {
        self.connection()?.fetch_all(statement)
    }

    fn pluck(&self, statement: Statement) -> Result<Option<Column>, Error> {
        self.connection()?.pluck(statement)
    }

    fn batch(&self, statement: Statement) -> Result<(), Error> {
        self.connection()?.batch(statement)
    }

    fn last_insert_id(&self) -> Result<i64, Error> {
        self.connection()?.last_insert_id()
    }
}

/// Generic transaction handler, for backends that speak plain ANSI transaction statements
#[cfg(test)]
#[derive(Debug)]
pub struct GenericTransactionHandler<W>(PhantomData<W>);

#[cfg(test)]
impl<W> DatabaseTransaction<W> for GenericTransactionHandler<W>
where
    W: DatabaseExecutor,
{
    fn commit(conn: &mut W) -> Result<(), Error> {
        query("COMMIT")?.execute(&*conn)?;
        Ok(())
    }

    fn begin(conn: &mut W) -> Result<(), Error> {
        query("BEGIN")?.execute(&*conn)?;
        Ok(())
    }

    fn rollback(conn: &mut W) -> Result<(), Error> {
        query("ROLLBACK")?.execute(&*conn)?;
        Ok(())
    }
}
