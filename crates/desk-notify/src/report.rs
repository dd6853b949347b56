//! The event payload sent to the error tracker.

use chrono::{DateTime, SecondsFormat, Utc};
use desk_core::{AppError, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// One reported error with its tags, extras, and contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub platform: String,
    pub environment: String,
    pub message: String,
    pub tags: BTreeMap<String, String>,
    pub extra: BTreeMap<String, String>,
    pub contexts: BTreeMap<String, Value>,
    pub exception: ExceptionList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionList {
    pub values: Vec<ExceptionValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Report {
    /// Assemble a report for `error`.
    ///
    /// Reads only memoized or infallible accessors, so it cannot fail.
    #[must_use]
    pub fn from_error(error: &AppError, env: &str, app: &str) -> Self {
        let class = error.kind().class_name();
        let err_message = error.err_message().into_owned();

        let tags = BTreeMap::from([
            ("env".to_string(), env.to_string()),
            ("app".to_string(), app.to_string()),
            ("err_code".to_string(), error.error_code().to_string()),
            ("message".to_string(), error.message().to_string()),
            ("err_message".to_string(), err_message.clone()),
            ("err_class".to_string(), class.to_string()),
        ]);

        let extra = BTreeMap::from([
            ("request_data".to_string(), error.request_data_json().to_string()),
            ("data".to_string(), error.err_data_json().to_string()),
            ("error_info".to_string(), encode::to_string_lossy(error.err_info())),
            ("error_data".to_string(), error.err_data_json().to_string()),
            (
                "response_data".to_string(),
                encode::to_string_lossy(error.response_data()),
            ),
        ]);

        let mut contexts = BTreeMap::new();
        if let Some(request) = error.request() {
            contexts.insert("device".to_string(), json!({ "name": request.device }));
        }

        let mut values = Vec::new();
        if let Some(cause) = error.cause() {
            values.push(ExceptionValue {
                kind: error.cause_type().unwrap_or("anyhow::Error").to_string(),
                value: format!("{cause:#}"),
            });
        }
        values.push(ExceptionValue {
            kind: class.to_string(),
            value: err_message,
        });

        Self {
            event_id: event_id(),
            timestamp: Utc::now(),
            level: "error".to_string(),
            platform: "rust".to_string(),
            environment: env.to_string(),
            message: error.message().to_string(),
            tags,
            extra,
            contexts,
            exception: ExceptionList { values },
        }
    }
}

impl Report {
    /// Encode as a tracker envelope: envelope header, item header, and the
    /// event itself, one JSON document per line.
    #[must_use]
    pub fn to_envelope(&self) -> Vec<u8> {
        let event = encode::to_vec(&encode::to_value_lossy(self));
        let header = json!({
            "event_id": self.event_id,
            "sent_at": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        let item = json!({
            "type": "event",
            "content_type": "application/json",
            "length": event.len(),
        });

        let mut out = encode::to_vec(&header);
        out.push(b'\n');
        out.extend(encode::to_vec(&item));
        out.push(b'\n');
        out.extend(event);
        out.push(b'\n');
        out
    }
}

/// 32 lowercase hex characters from the OS RNG.
fn event_id() -> String {
    let mut bytes = [0u8; 16];
    if let Err(error) = getrandom::fill(&mut bytes) {
        tracing::warn!(%error, "event id: falling back to timestamp");
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        bytes = u128::from(nanos.unsigned_abs()).to_be_bytes();
    }
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
