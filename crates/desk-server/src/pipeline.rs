//! The exception pipeline.
//!
//! Every failure that escapes a handler ends here. Application errors pass
//! through as their own response; anything else becomes a `ServerError` with
//! code [`UNHANDLED_ERROR_CODE`]. Notification happens here, before the
//! response is produced, guarded by the error's own notified flag.

use desk_core::{ApiResponse, AppError, Notify, RequestSource, UNHANDLED_ERROR_CODE};
use http::StatusCode;
use serde_json::{Value, json};
use std::backtrace::BacktraceStatus;
use std::sync::Arc;

/// How unclassified failures are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerMode {
    /// Always normalize into the `ServerError` envelope.
    #[default]
    Normalized,
    /// In debug mode, render unclassified failures natively with full
    /// diagnostics instead.
    DebugNative,
}

/// Converts handler failures into responses.
#[derive(Clone, Default)]
pub struct ExceptionPipeline {
    debug: bool,
    mode: HandlerMode,
    notifier: Option<Arc<dyn Notify>>,
}

impl ExceptionPipeline {
    #[must_use]
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: HandlerMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Option<Arc<dyn Notify>>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub const fn mode(&self) -> HandlerMode {
        self.mode
    }

    /// Produce the response for a failed request.
    pub fn handle(&self, error: anyhow::Error, request: &dyn RequestSource) -> ApiResponse {
        match error.downcast::<AppError>() {
            Ok(app) => {
                let app = if app.request().is_none() {
                    app.with_request(request)
                } else {
                    app
                };
                tracing::debug!(
                    kind = %app.kind(),
                    err_code = app.error_code(),
                    message = %app.message(),
                    "application error"
                );
                self.respond(&app)
            }
            Err(foreign) if self.debug && self.mode == HandlerMode::DebugNative => {
                tracing::error!(error = %format!("{foreign:#}"), "unhandled error (debug)");
                native_response(&foreign)
            }
            Err(foreign) => {
                tracing::error!(error = %format!("{foreign:#}"), "unhandled error");
                let app = AppError::unhandled(foreign).with_request(request);
                self.respond(&app)
            }
        }
    }

    /// Notify if needed, then render `error`.
    pub fn respond(&self, error: &AppError) -> ApiResponse {
        error.notify_if_needed(self.notifier.as_deref(), false);
        error.to_response(self.debug)
    }
}

/// Framework-native rendering of an unclassified failure: the full error
/// chain and backtrace, outside the envelope.
#[must_use]
pub fn native_response(error: &anyhow::Error) -> ApiResponse {
    let causes: Vec<Value> = error
        .chain()
        .skip(1)
        .map(|cause| Value::String(cause.to_string()))
        .collect();

    let backtrace = error.backtrace();
    let frames: Value = if backtrace.status() == BacktraceStatus::Captured {
        backtrace
            .to_string()
            .lines()
            .map(|line| Value::String(line.to_string()))
            .collect()
    } else {
        Value::Null
    };

    ApiResponse::raw(
        json!({
            "detail": error.to_string(),
            "error_code": UNHANDLED_ERROR_CODE,
            "causes": causes,
            "backtrace": frames,
        }),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
