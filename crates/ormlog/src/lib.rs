//! Persist `tracing` events as rows of a SQL table
//!
//! The crate plugs into a `tracing_subscriber` registry as a [`Layer`](tracing_subscriber::Layer).
//! Every event is handed to the logger of its target; the logger renders the message, builds a
//! row and writes it through a short-lived persistence context, one transaction per event.
//!
//! ```rust,ignore
//! use ormlog::{Log, SqlLoggingExt};
//! use ormlog_sqlite::SqliteDatabase;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let database = SqliteDatabase::new("logs.sqlite")?;
//! database.migrate::<Log>()?;
//!
//! tracing_subscriber::registry()
//!     .with_sql_logger::<Log, _>(database)
//!     .init();
//!
//! tracing::info!(event_id = 1, "Handling request");
//! ```
//!
//! Rows are [`Log`] or any type that embeds one and implements [`LogEntity`]. The row can be
//! built by a custom creator ([`SqlLoggerOptions::creator`]) or, by default, from a blank row
//! produced by an activator ([`SqlLoggerProviderBuilder::activator`]).
//!
//! Failures of the store never reach the code that logs. Events of the persistence crates
//! themselves ([`filter::RESERVED_CATEGORIES`]) are never written.

pub mod config;
mod error;
pub mod ext;
pub mod filter;
pub mod layer;
pub mod level;
pub mod log;
pub mod logger;
pub mod model;
pub mod options;
pub mod provider;

pub use config::LoggerSettings;
pub use error::Error;
pub use ext::SqlLoggingExt;
pub use layer::SqlLoggerLayer;
pub use level::{EventId, LogLevel};
pub use log::{Log, LogEntity, LogKey};
pub use logger::{CreateLogger, Logger, LoggerSetup, NoopScope, SqlLogger};
pub use options::SqlLoggerOptions;
pub use provider::{LoggerProvider, SqlLoggerProvider, SqlLoggerProviderBuilder};
