//! Errors

/// ormlog Error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `log` was called without a formatter
    #[error("A formatter is required to render the log message")]
    MissingFormatter,

    /// The provider was disposed
    #[error("Cannot access a disposed object: {0}")]
    Disposed(String),

    /// A log level name that is not recognised
    #[error("Unknown log level `{0}`")]
    UnknownLevel(String),
}
