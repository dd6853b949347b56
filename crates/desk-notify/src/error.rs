//! Notifier setup errors.
//!
//! Delivery failures are never surfaced; only construction can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The configured DSN cannot be used.
    #[error("invalid tracker DSN: {0}")]
    InvalidDsn(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
