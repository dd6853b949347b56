//! The structured application error.
//!
//! An [`AppError`] is raised at the point of failure, carries everything the
//! client and the operator need, and is consumed once by the exception
//! pipeline. It is cheap to construct; diagnostics that are expensive to
//! compute (`err_info`, serialized request data) are computed on first read
//! and cached.

use serde_json::{Map, Value};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::body::{FailureBody, FailureInfo};
use crate::encode;
use crate::envelope::ApiResponse;
use crate::info::{self, ErrInfo};
use crate::kind::ErrorKind;
use crate::notify::Notify;
use crate::request::{RequestSnapshot, RequestSource};

/// Error code given to failures that were not raised as an [`AppError`].
pub const UNHANDLED_ERROR_CODE: i64 = 500_005;

/// An application failure with a fixed HTTP status and a client-safe body.
///
/// Build one with a kind constructor and the `with_*` methods:
///
/// ```
/// use desk_core::AppError;
/// use serde_json::json;
///
/// let err = AppError::not_found()
///     .with_code(404_001)
///     .with_message("Task not found")
///     .with_err_data(json!({"task_id": 9}));
///
/// assert_eq!(err.status().as_u16(), 404);
/// assert_eq!(err.body(false)["message"], "Task not found");
/// ```
pub struct AppError {
    kind: ErrorKind,
    error_code: i64,
    message: String,
    response_data: Map<String, Value>,
    err_data: Map<String, Value>,
    err_message: Option<String>,
    err_html: Option<String>,
    err_info_seed: Map<String, Value>,
    err_info: OnceLock<Map<String, Value>>,
    cause: Option<anyhow::Error>,
    cause_type: Option<String>,
    backtrace: Backtrace,
    should_notify: Option<bool>,
    notified: AtomicBool,
    request: Option<RequestSnapshot>,
    request_json: OnceLock<String>,
    err_data_json: OnceLock<String>,
    notifier: Option<Arc<dyn Notify>>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            error_code: 0,
            message: kind.default_message().to_string(),
            response_data: Map::new(),
            err_data: Map::new(),
            err_message: None,
            err_html: None,
            err_info_seed: Map::new(),
            err_info: OnceLock::new(),
            cause: None,
            cause_type: None,
            backtrace: Backtrace::force_capture(),
            should_notify: None,
            notified: AtomicBool::new(false),
            request: None,
            request_json: OnceLock::new(),
            err_data_json: OnceLock::new(),
            notifier: None,
        }
    }

    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(ErrorKind::BadRequest)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized)
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    #[must_use]
    pub fn conflict() -> Self {
        Self::new(ErrorKind::Conflict)
    }

    #[must_use]
    pub fn server_error() -> Self {
        Self::new(ErrorKind::ServerError)
    }

    /// Wrap a failure that escaped business logic unclassified.
    #[must_use]
    pub fn unhandled(cause: anyhow::Error) -> Self {
        Self::server_error()
            .with_code(UNHANDLED_ERROR_CODE)
            .with_cause(cause)
    }

    // ── Builders ───────────────────────────────────────────────────

    #[must_use]
    pub fn with_code(mut self, error_code: i64) -> Self {
        self.error_code = error_code;
        self
    }

    /// Replace the user-facing message. Empty strings keep the default.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.message = message;
        }
        self
    }

    /// Payload returned to the client as `data`. Non-object values are
    /// stored under `"data"`.
    #[must_use]
    pub fn with_response_data(mut self, data: Value) -> Self {
        self.response_data = into_map(data);
        self
    }

    /// Debug-only diagnostic payload.
    #[must_use]
    pub fn with_err_data(mut self, data: Value) -> Self {
        self.err_data = into_map(data);
        self.err_data_json = OnceLock::new();
        self
    }

    #[must_use]
    pub fn with_err_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.err_message = (!message.is_empty()).then_some(message);
        self
    }

    #[must_use]
    pub fn with_err_html(mut self, html: impl Into<String>) -> Self {
        self.err_html = Some(html.into());
        self
    }

    #[must_use]
    pub fn with_err_info(mut self, info: impl Into<ErrInfo>) -> Self {
        self.err_info_seed = info.into().into_map();
        self.err_info = OnceLock::new();
        self
    }

    /// Snapshot the request that was being served.
    #[must_use]
    pub fn with_request(mut self, request: &dyn RequestSource) -> Self {
        self.request = Some(RequestSnapshot::capture(request));
        self.request_json = OnceLock::new();
        self
    }

    /// Override the kind's default notification policy.
    #[must_use]
    pub fn with_notify(mut self, notify: bool) -> Self {
        self.should_notify = Some(notify);
        self
    }

    /// Record the lower-level failure behind this error.
    ///
    /// An `anyhow::Error` is named after its root cause rather than the
    /// wrapper.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Into<anyhow::Error> + 'static,
    {
        let cause = cause.into();
        self.cause_type = Some(if TypeId::of::<E>() == TypeId::of::<anyhow::Error>() {
            root_type_name(&cause)
        } else {
            std::any::type_name::<E>().to_string()
        });
        self.cause = Some(cause);
        self.err_info = OnceLock::new();
        self
    }

    /// Attach a notifier so the error reports itself when dropped, unless a
    /// notification decision was already made.
    #[must_use]
    pub fn attach_notifier(mut self, notifier: Arc<dyn Notify>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    // ── Accessors ──────────────────────────────────────────────────

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn status(&self) -> http::StatusCode {
        self.kind.status()
    }

    #[must_use]
    pub const fn error_code(&self) -> i64 {
        self.error_code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn response_data(&self) -> &Map<String, Value> {
        &self.response_data
    }

    #[must_use]
    pub const fn err_data(&self) -> &Map<String, Value> {
        &self.err_data
    }

    /// Internal message: supplied, else the cause chain, else `message`.
    #[must_use]
    pub fn err_message(&self) -> Cow<'_, str> {
        match (&self.err_message, &self.cause) {
            (Some(message), _) => Cow::Borrowed(message),
            (None, Some(cause)) => Cow::Owned(format!("{cause:#}")),
            (None, None) => Cow::Borrowed(&self.message),
        }
    }

    /// HTML diagnostic: supplied, else the caller-supplied `err_message`.
    #[must_use]
    pub fn err_html(&self) -> Option<&str> {
        self.err_html.as_deref().or(self.err_message.as_deref())
    }

    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    /// Type name of the cause, if any.
    #[must_use]
    pub fn cause_type(&self) -> Option<&str> {
        self.cause_type.as_deref()
    }

    #[must_use]
    pub const fn request(&self) -> Option<&RequestSnapshot> {
        self.request.as_ref()
    }

    /// Structured diagnostics, extended once with the backtrace and cause.
    pub fn err_info(&self) -> &Map<String, Value> {
        self.err_info.get_or_init(|| {
            let mut info = self.err_info_seed.clone();
            if info.contains_key("trace") {
                return info;
            }

            let backtrace = self
                .cause
                .as_ref()
                .map(anyhow::Error::backtrace)
                .filter(|bt| bt.status() == BacktraceStatus::Captured)
                .unwrap_or(&self.backtrace);
            info.insert("trace".into(), Value::Array(info::trace_frames(backtrace)));

            if let Some(cause) = &self.cause {
                let type_name = self.cause_type().unwrap_or(ANYHOW_TYPE);
                info.insert("type".into(), Value::String(type_name.to_string()));
                info.insert("message".into(), Value::String(format!("{cause:#}")));
            }
            info
        })
    }

    /// The request snapshot as JSON, `null` without a request.
    #[must_use]
    pub fn request_data(&self) -> Value {
        self.request
            .as_ref()
            .map_or(Value::Null, |snapshot| encode::to_value_lossy(snapshot))
    }

    /// Serialized request snapshot, computed once.
    pub fn request_data_json(&self) -> &str {
        self.request_json
            .get_or_init(|| encode::to_string(&self.request_data()))
    }

    /// Serialized `err_data`, computed once.
    pub fn err_data_json(&self) -> &str {
        self.err_data_json
            .get_or_init(|| encode::to_string_lossy(&self.err_data))
    }

    // ── Rendering ──────────────────────────────────────────────────

    /// The typed failure body. Diagnostics are included only when `debug`.
    #[must_use]
    pub fn failure_body(&self, debug: bool) -> FailureBody {
        let mut info = FailureInfo {
            error_code: self.error_code,
            error_message: self.err_message().into_owned(),
            error_html: self.err_html().map(str::to_string),
            request_data: None,
            error_info: None,
            error_data: None,
        };
        if debug {
            info.request_data = Some(self.request_data());
            info.error_info = Some(self.err_info().clone());
            info.error_data = Some(self.err_data.clone());
        }

        FailureBody {
            success: false,
            message: self.message.clone(),
            data: self.response_data.clone(),
            info,
        }
    }

    /// The failure body as JSON.
    #[must_use]
    pub fn body(&self, debug: bool) -> Value {
        encode::to_value_lossy(&self.failure_body(debug))
    }

    /// Render with this error's status through the response envelope.
    #[must_use]
    pub fn to_response(&self, debug: bool) -> ApiResponse {
        ApiResponse::new(self.body(debug), self.status())
    }

    // ── Notification ───────────────────────────────────────────────

    /// Resolved notification policy.
    #[must_use]
    pub fn should_notify(&self) -> bool {
        self.should_notify
            .unwrap_or_else(|| self.kind.notifies_by_default())
    }

    #[must_use]
    pub fn is_notified(&self) -> bool {
        self.notified.load(Ordering::Acquire)
    }

    /// Report unconditionally and mark this error as notified.
    ///
    /// Falls back to the attached notifier when `notifier` is `None`. Without
    /// any notifier this only records the decision.
    pub fn notify(&self, notifier: Option<&dyn Notify>) {
        self.notified.store(true, Ordering::Release);
        if let Some(notifier) = notifier.or(self.notifier.as_deref()) {
            notifier.notify(self);
        }
    }

    /// Report if the policy asks for it and no report was made yet.
    ///
    /// `force` re-notifies an already notified error. Returns whether a
    /// notification was attempted.
    pub fn notify_if_needed(&self, notifier: Option<&dyn Notify>, force: bool) -> bool {
        if !self.should_notify() {
            return false;
        }
        let already = self.notified.swap(true, Ordering::AcqRel);
        if already && !force {
            return false;
        }
        if let Some(notifier) = notifier.or(self.notifier.as_deref()) {
            notifier.notify(self);
        }
        true
    }
}

impl Drop for AppError {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier.take() {
            self.notify_if_needed(Some(notifier.as_ref()), false);
        }
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("error_code", &self.error_code)
            .field("message", &self.message)
            .field("err_message", &self.err_message())
            .field("cause", &self.cause)
            .field("notified", &self.is_notified())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|cause| {
            let inner: &(dyn std::error::Error + Send + Sync + 'static) = cause.as_ref();
            inner as &(dyn std::error::Error + 'static)
        })
    }
}

const ANYHOW_TYPE: &str = "anyhow::Error";

/// Best-effort type name of the innermost error in `cause`.
///
/// Known library errors are recognized by downcast; anything else is named
/// after the leading identifier of its `Debug` output.
fn root_type_name(cause: &anyhow::Error) -> String {
    let root = cause.root_cause();
    if root.is::<std::io::Error>() {
        return "std::io::Error".to_string();
    }
    if root.is::<serde_json::Error>() {
        return "serde_json::Error".to_string();
    }
    if root.is::<std::num::ParseIntError>() {
        return "std::num::ParseIntError".to_string();
    }
    if root.is::<std::num::ParseFloatError>() {
        return "std::num::ParseFloatError".to_string();
    }
    if root.is::<std::str::Utf8Error>() {
        return "std::str::Utf8Error".to_string();
    }
    if root.is::<AppError>() {
        return "AppError".to_string();
    }

    let debug = format!("{root:?}");
    let ident: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | ':'))
        .collect();
    if ident.is_empty() || !ident.starts_with(|c: char| c.is_alphabetic()) {
        ANYHOW_TYPE.to_string()
    } else {
        ident
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".into(), other);
            map
        }
    }
}
