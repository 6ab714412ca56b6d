//! In-process doubles for the database traits
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::database::{DatabaseConnector, DatabaseExecutor, GenericTransactionHandler};
use crate::pool::{self, DatabaseConfig, DatabasePool};
use crate::stmt::{Column, Statement};
use crate::Error;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone)]
pub struct RecordingConfig {
    max_size: usize,
    pub statements: Arc<Mutex<Vec<String>>>,
    pub rows: Arc<Mutex<Vec<Vec<Column>>>>,
    pub fail_commit: Arc<AtomicBool>,
}

impl RecordingConfig {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            statements: Default::default(),
            rows: Default::default(),
            fail_commit: Default::default(),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().expect("statements").clone()
    }
}

impl DatabaseConfig for RecordingConfig {
    fn max_size(&self) -> usize {
        self.max_size
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(1)
    }
}

#[derive(Debug)]
pub struct RecordingConnection {
    pub id: usize,
    stale: Arc<AtomicBool>,
    config: RecordingConfig,
    pending: Mutex<Vec<Vec<Column>>>,
}

impl RecordingConnection {
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }
}

impl DatabaseExecutor for RecordingConnection {
    fn name() -> &'static str {
        "recording"
    }

    fn execute(&self, statement: Statement) -> Result<usize, Error> {
        let (sql, values) = statement.to_sql()?;
        self.config.statements.lock().expect("statements").push(sql.clone());

        match sql.as_str() {
            "COMMIT" => {
                if self.config.fail_commit.load(Ordering::SeqCst) {
                    return Err(Error::Internal("commit refused".to_owned()));
                }
                let pending = std::mem::take(&mut *self.pending.lock().expect("pending"));
                self.config.rows.lock().expect("rows").extend(pending);
            }
            "ROLLBACK" => self.pending.lock().expect("pending").clear(),
            _ if sql.starts_with("INSERT") => self.pending.lock().expect("pending").push(values),
            _ => {}
        }

        Ok(1)
    }

    fn fetch_one(&self, statement: Statement) -> Result<Option<Vec<Column>>, Error> {
        Ok(self.fetch_all(statement)?.into_iter().next())
    }

    fn fetch_all(&self, statement: Statement) -> Result<Vec<Vec<Column>>, Error> {
        let (sql, _) = statement.to_sql()?;
        self.config.statements.lock().expect("statements").push(sql);
        Ok(self.config.rows.lock().expect("rows").clone())
    }

    fn pluck(&self, statement: Statement) -> Result<Option<Column>, Error> {
        Ok(self
            .fetch_one(statement)?
            .and_then(|row| row.into_iter().next()))
    }

    fn batch(&self, statement: Statement) -> Result<(), Error> {
        self.execute(statement).map(|_| ())
    }

    fn last_insert_id(&self) -> Result<i64, Error> {
        Ok(self.config.rows.lock().expect("rows").len() as i64)
    }
}

impl DatabaseConnector for RecordingConnection {
    type Transaction = GenericTransactionHandler<Self>;
}

#[derive(Debug)]
pub struct RecordingPool;

impl DatabasePool for RecordingPool {
    type Connection = RecordingConnection;
    type Config = RecordingConfig;
    type Error = std::io::Error;

    fn new_resource(
        config: &Self::Config,
        stale: Arc<AtomicBool>,
        _timeout: Duration,
    ) -> Result<Self::Connection, pool::Error<Self::Error>> {
        Ok(RecordingConnection {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            stale,
            config: config.clone(),
            pending: Default::default(),
        })
    }
}
