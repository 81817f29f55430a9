//! Error types for ghostreply

use thiserror::Error;

/// Result type alias for ghostreply operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a session
///
/// Every variant that reaches the command loop ends the session. Malformed
/// commands are reported through [`crate::session::CommandError`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Message store error (open, pool, query)
    #[error("message store error: {0}")]
    Store(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Reply generation error
    #[error("generator error: {0}")]
    Generator(String),

    /// Reply dispatch error
    #[error("send error: {0}")]
    Send(String),

    /// Line input error
    #[error("input error: {0}")]
    Input(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
