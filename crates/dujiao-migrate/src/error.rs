//! Error types for `dujiao-migrate`.
//!
//! A single unified error type covers the whole run. The orchestrator treats
//! most variants as item-recoverable (logged and counted); only setup and
//! phase-establishing failures propagate out of [`crate::Migrator::run`].

use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a migration run.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Legacy database error (connect, query, or row decode).
    #[error("legacy database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP transport failure talking to the new API.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Admin login was rejected or returned no token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The API answered with a non-zero status code.
    ///
    /// Carries the human-readable message from the response envelope.
    #[error("API error: {0}")]
    Api(String),

    /// The API answered success but the payload was not shaped as expected.
    #[error("malformed API response: {0}")]
    ResponseShape(String),

    /// A remote call failed on every attempt of the retry policy.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Name of the operation, for logs.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
        /// The last transport error observed.
        #[source]
        source: Box<Error>,
    },

    /// IO error (config file, image file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
