//! Log levels and event ids
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::Error;

/// Severity of a log record
///
/// The discriminant is the value persisted in the `level` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(i32)]
pub enum LogLevel {
    /// Most detailed messages
    Trace = 0,
    /// Interactive investigation during development
    Debug = 1,
    /// General flow of the application
    #[default]
    Information = 2,
    /// Abnormal or unexpected events
    Warning = 3,
    /// Failures of the current activity
    Error = 4,
    /// Unrecoverable failures
    Critical = 5,
    /// Not a severity: disables logging
    None = 6,
}

impl LogLevel {
    /// Numeric value stored for this level
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Host-level filter equivalent to this minimum level
    ///
    /// `tracing` has no level above `ERROR`, so `Critical` enables errors as well.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Information => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
            LogLevel::None => LevelFilter::OFF,
        }
    }
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Information,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Information => "information",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::None => "none",
        };

        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "information" | "info" => Ok(LogLevel::Information),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            "none" | "off" => Ok(LogLevel::None),
            _ => Err(Error::UnknownLevel(s.to_owned())),
        }
    }
}

impl TryFrom<i32> for LogLevel {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Error> {
        Ok(match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Information,
            3 => LogLevel::Warning,
            4 => LogLevel::Error,
            5 => LogLevel::Critical,
            6 => LogLevel::None,
            _ => return Err(Error::UnknownLevel(value.to_string())),
        })
    }
}

impl TryFrom<String> for LogLevel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

/// Identifies a logging event
///
/// Only the numeric id is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventId {
    /// Numeric id
    pub id: i32,
    /// Optional name
    pub name: Option<String>,
}

impl EventId {
    /// Creates an event id with a name
    pub fn named<N: Into<String>>(id: i32, name: N) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self { id, name: None }
    }
}
