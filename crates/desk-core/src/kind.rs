//! The closed error taxonomy.
//!
//! Each kind fixes an HTTP status, a canned user-facing message, and whether
//! errors of that kind are reported to the error tracker by default.

use http::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, fixed-status class of application error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or invalid caller input.
    BadRequest,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated but lacking privilege.
    Forbidden,
    /// Referenced entity is absent.
    NotFound,
    /// Uniqueness or state conflict.
    Conflict,
    /// Unexpected internal failure, including every unclassified error.
    ServerError,
    /// The base application error.
    App,
}

impl ErrorKind {
    pub const ALL: [Self; 7] = [
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::Conflict,
        Self::ServerError,
        Self::App,
    ];

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::ServerError | Self::App => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message used when the caller does not supply one.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Item not found",
            Self::Conflict => "Item exists",
            Self::ServerError => "Server error",
            Self::App => "Application Error",
        }
    }

    /// Whether errors of this kind are reported unless overridden.
    #[must_use]
    pub const fn notifies_by_default(self) -> bool {
        matches!(self, Self::ServerError | Self::App)
    }

    /// Class name reported to the error tracker as `err_class`.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequestError",
            Self::Unauthorized => "UnauthorizedError",
            Self::Forbidden => "ForbiddenError",
            Self::NotFound => "NotFoundError",
            Self::Conflict => "ConflictError",
            Self::ServerError => "ServerError",
            Self::App => "AppError",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::ServerError => "server_error",
            Self::App => "app",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
