//! Database errors

/// Conversion error between a database column and a Rust type
#[derive(thiserror::Error, Debug)]
pub enum ConversionError {
    /// Missing columns
    #[error("Not enough elements: expected {0}, got {1}")]
    MissingColumn(usize, usize),

    /// Missing parameter
    #[error("Missing parameter {0}")]
    MissingParameter(String),

    /// Invalid db type
    #[error("Invalid type from db, expected {0} got {1}")]
    InvalidType(String, String),

    /// Invalid data conversion in column
    #[error("Error converting {1}, expecting type {0}")]
    InvalidConversion(String, String),

    /// Invalid timestamp
    #[error(transparent)]
    Timestamp(#[from] chrono::ParseError),

    /// Invalid uuid
    #[error(transparent)]
    Uuid(#[from] uuid::Error),
}

/// Database Error
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Database Error
    #[error(transparent)]
    Database(Box<dyn std::error::Error + Send + Sync>),

    /// Internal error, with a description
    #[error("Internal: {0}")]
    Internal(String),

    /// A placeholder in the statement was never bound
    #[error("Missing placeholder value {0}")]
    MissingPlaceholder(String),

    /// The backend replied with a response the caller was not expecting
    #[error("Invalid response from the database")]
    InvalidDbResponse,

    /// Duplicate entry (primary key or unique constraint)
    #[error("Duplicate entry")]
    Duplicate,

    /// Error acquiring a connection from the pool
    #[error("Pool: {0}")]
    Pool(String),

    /// The entity was configured without a primary key
    #[error("Entity {0} has no primary key")]
    MissingKey(String),

    /// Conversion error
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
