//! Logger
//!
//! A logger is bound to one category. Every record it accepts is written by its own short-lived
//! persistence context: one connection, one transaction, one row.
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use chrono::Local;
use ormlog_sql_common::{ContextFactory, PersistenceContext};

use crate::filter::{self, Filter};
use crate::level::{EventId, LogLevel};
use crate::log::LogEntity;
use crate::model::MAX_NAME_LENGTH;
use crate::options::{Activator, Creator};
use crate::Error;

/// A failure attached to a record
pub type Failure<'a> = &'a (dyn StdError + 'static);

/// Scope guard returned by [`Logger::begin_scope`]
///
/// Scopes are not tracked, dropping the guard does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScope;

/// Logger contract
pub trait Logger: Send + Sync + 'static {
    /// Category this logger was created for
    fn name(&self) -> &str;

    /// Whether a record at `level` would be written
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Writes a record
    ///
    /// Fails only when the caller breaks the contract by passing no formatter. Records rejected by
    /// [`Logger::is_enabled`] or rendering to an empty message are dropped.
    fn log<S: ?Sized>(
        &self,
        level: LogLevel,
        event_id: EventId,
        state: &S,
        failure: Option<Failure<'_>>,
        formatter: Option<&dyn Fn(&S, Option<Failure<'_>>) -> Option<String>>,
    ) -> Result<(), Error>;

    /// Starts a logical scope
    fn begin_scope<S: ?Sized>(&self, _state: &S) -> NoopScope {
        NoopScope
    }
}

/// Everything a logger is built from
pub struct LoggerSetup<F, L> {
    /// Category
    pub name: String,
    /// Filter predicate
    pub filter: Filter,
    /// Custom creator, `None` for the default one
    pub creator: Option<Creator<L>>,
    /// Blank row factory used by the default creator
    pub activator: Activator<L>,
    /// Source of persistence contexts
    pub factory: Arc<F>,
}

impl<F: fmt::Debug, L> fmt::Debug for LoggerSetup<F, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerSetup")
            .field("name", &self.name)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

/// Constructor of the logger type a provider hands out
pub trait CreateLogger<F, L>: Logger + Sized {
    /// Builds a logger
    fn create(setup: LoggerSetup<F, L>) -> Self;
}

/// Renders a failure and its chain of sources
///
/// ```text
/// connection refused
///  ---> io error: timed out
/// ```
pub fn failure_text(failure: Failure<'_>) -> String {
    let mut text = failure.to_string();
    let mut source = failure.source();

    while let Some(inner) = source {
        text.push_str("\n ---> ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }

    text
}

/// Default creator: fills a blank row from `activator`, stamped with the local time
///
/// Names longer than [`MAX_NAME_LENGTH`] characters are cut.
pub fn default_creator<L: LogEntity>(activator: Activator<L>) -> Creator<L> {
    Arc::new(move |level, event_id, name, message| {
        let mut row = activator();
        let log = row.log_mut();

        log.time_stamp = Local::now().fixed_offset();
        log.level = level;
        log.event_id = event_id;
        log.name = name.chars().take(MAX_NAME_LENGTH).collect();
        log.message = message.to_owned();

        row
    })
}

/// Logger writing each record as a row, through a fresh persistence context
pub struct SqlLogger<F, L> {
    name: String,
    filter: Filter,
    creator: Creator<L>,
    factory: Arc<F>,
}

impl<F, L> SqlLogger<F, L>
where
    F: ContextFactory,
    L: LogEntity,
{
    /// Creates a logger for `name`
    pub fn new(setup: LoggerSetup<F, L>) -> Self {
        let creator = setup
            .creator
            .unwrap_or_else(|| default_creator(setup.activator));

        Self {
            name: setup.name,
            filter: setup.filter,
            creator,
            factory: setup.factory,
        }
    }

    /// Writes one row
    ///
    /// Errors while opening the context or saving the row are dropped; logging never fails the
    /// caller.
    pub fn write_message(&self, message: &str, level: LogLevel, event_id: i32) {
        let _ = self.try_write_message(message, level, event_id);
    }

    fn try_write_message(
        &self,
        message: &str,
        level: LogLevel,
        event_id: i32,
    ) -> Result<usize, ormlog_sql_common::Error> {
        let mut context = self.factory.create_context()?;
        let row = (self.creator)(level.as_i32(), event_id, &self.name, message);

        context.add(row)?;
        context.save_changes()
    }
}

impl<F, L> Logger for SqlLogger<F, L>
where
    F: ContextFactory,
    L: LogEntity,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None
            && !filter::is_reserved(&self.name)
            && (self.filter)(&self.name, level)
    }

    fn log<S: ?Sized>(
        &self,
        level: LogLevel,
        event_id: EventId,
        state: &S,
        failure: Option<Failure<'_>>,
        formatter: Option<&dyn Fn(&S, Option<Failure<'_>>) -> Option<String>>,
    ) -> Result<(), Error> {
        if !self.is_enabled(level) {
            return Ok(());
        }

        let formatter = formatter.ok_or(Error::MissingFormatter)?;

        let mut message = match formatter(state, failure) {
            Some(message) if !message.is_empty() => message,
            _ => return Ok(()),
        };

        if let Some(failure) = failure {
            message.push_str("\n\n");
            message.push_str(&failure_text(failure));
        }

        self.write_message(&message, level, event_id.id);

        Ok(())
    }
}

impl<F, L> CreateLogger<F, L> for SqlLogger<F, L>
where
    F: ContextFactory,
    L: LogEntity,
{
    fn create(setup: LoggerSetup<F, L>) -> Self {
        Self::new(setup)
    }
}

impl<F: fmt::Debug, L> fmt::Debug for SqlLogger<F, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlLogger")
            .field("name", &self.name)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}
