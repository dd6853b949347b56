//! The seam between errors and the error-tracking side channel.

use crate::error::AppError;

/// Reports an error to an external tracker.
///
/// Implementations must not panic and must not block on delivery; failures
/// are theirs to log and swallow.
pub trait Notify: Send + Sync {
    fn notify(&self, error: &AppError);
}
