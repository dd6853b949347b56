//! # desk-core
//!
//! Error and response types shared across the taskdesk API.
//!
//! - [`AppError`]: structured application error with a closed [`ErrorKind`] taxonomy
//! - [`envelope`]: the `{success, message, data, info?}` response envelope and [`ApiResponse`]
//! - [`RequestSource`] / [`RequestSnapshot`]: request diagnostics captured with an error
//! - [`Notify`]: the seam to the error-tracking side channel
//! - [`encode`]: JSON encoding that never fails

pub mod body;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod info;
pub mod kind;
pub mod notify;
pub mod request;

pub use body::{FailureBody, FailureInfo};
pub use envelope::ApiResponse;
pub use error::{AppError, UNHANDLED_ERROR_CODE};
pub use info::ErrInfo;
pub use kind::ErrorKind;
pub use notify::Notify;
pub use request::{RequestLine, RequestSnapshot, RequestSource, UserRef};
