//! Persistence context
//!
//! A context is a short-lived unit of work: entities are added to it and written together by
//! [`PersistenceContext::save_changes`], inside a single transaction.
use std::fmt::Debug;
use std::sync::Arc;

use crate::database::{ConnectionWithTransaction, DatabaseExecutor};
use crate::entity::Entity;
use crate::pool::{DatabasePool, Pool};
use crate::stmt::{query, Statement};
use crate::value::Value;
use crate::Error;

/// Unit of work over the store
pub trait PersistenceContext {
    /// Tracks a new entity to be inserted on the next save
    fn add<E: Entity>(&mut self, entity: E) -> Result<(), Error>;

    /// Writes every tracked entity in one transaction, returning how many rows were inserted
    fn save_changes(&mut self) -> Result<usize, Error>;
}

/// Creates a fresh [`PersistenceContext`] per unit of work
pub trait ContextFactory: Debug + Send + Sync + 'static {
    /// Context type
    type Context: PersistenceContext;

    /// Opens a new context, never shared with any other caller
    fn create_context(&self) -> Result<Self::Context, Error>;
}

/// Pool-backed persistence context
#[derive(Debug)]
pub struct DbContext<RM>
where
    RM: DatabasePool + 'static,
{
    pool: Arc<Pool<RM>>,
    pending: Vec<Statement>,
}

impl<RM> DbContext<RM>
where
    RM: DatabasePool + 'static,
{
    /// Creates a new context over the pool
    pub fn new(pool: Arc<Pool<RM>>) -> Self {
        Self {
            pool,
            pending: Vec::new(),
        }
    }

    /// How many inserts are waiting for [`PersistenceContext::save_changes`]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Reads every row of the entity's table, ordered by key
    pub fn all<E: Entity>(&self) -> Result<Vec<E>, Error> {
        let schema = E::schema()?;
        let conn = self.pool.get()?;

        query(&schema.select_sql())?
            .fetch_all(&*conn)?
            .into_iter()
            .map(E::from_row)
            .collect()
    }
}

impl<RM> PersistenceContext for DbContext<RM>
where
    RM: DatabasePool + 'static,
{
    fn add<E: Entity>(&mut self, entity: E) -> Result<(), Error> {
        let schema = E::schema()?;
        let mut values = entity.to_values();

        let statement = schema
            .insert_columns()
            .fold(query(&schema.insert_sql())?, |statement, column| {
                let value = values
                    .iter()
                    .position(|(name, _)| *name == column.name)
                    .map(|index| values.swap_remove(index).1)
                    .unwrap_or(Value::Null);
                statement.bind(&column.name, value)
            });

        self.pending.push(statement);
        Ok(())
    }

    fn save_changes(&mut self) -> Result<usize, Error> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let tx = ConnectionWithTransaction::new(self.pool.get()?)?;
        let mut inserted = 0;

        for statement in std::mem::take(&mut self.pending) {
            inserted += tx.execute(statement)?;
        }

        tx.commit()?;

        Ok(inserted)
    }
}
