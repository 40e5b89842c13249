//! Common error types for playdw

use thiserror::Error;

/// Common result type for playdw operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the playdw tools
#[derive(Error, Debug)]
pub enum Error {
    /// Could not open the warehouse connection (nothing has run yet)
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// A pipeline statement failed; statements before it remain committed
    #[error("{stage} step '{step}' failed: {source}")]
    Statement {
        stage: String,
        step: String,
        #[source]
        source: Box<Error>,
    },

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
