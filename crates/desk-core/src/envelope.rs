//! The success/failure response envelope.
//!
//! Every body leaving the API has the shape
//! `{"success": bool, "message": string, "data": any, "info"?: object}`.
//! [`build`] normalizes arbitrary handler output into that shape.

use http::StatusCode;
use serde_json::{Map, Value};

use crate::encode;

/// Message used for successful responses that do not carry their own.
pub const SUCCESS_MESSAGE: &str = "Success";

/// Content type of every envelope on the wire.
pub const CONTENT_TYPE: &str = "application/json";

/// Normalize a value into the envelope shape.
///
/// - `null`, arrays, and objects without `message` become `data`.
/// - Objects with `message` are merged over the success defaults.
/// - Strings become the message.
/// - Any other scalar becomes `data`.
#[must_use]
pub fn build(value: Value) -> Value {
    match value {
        Value::Object(map) if map.contains_key("message") => {
            let mut merged = success_head(SUCCESS_MESSAGE);
            merged.extend(map);
            Value::Object(merged)
        }
        Value::String(message) => Value::Object(success_head(&message)),
        data => {
            let mut wrapped = success_head(SUCCESS_MESSAGE);
            wrapped.insert("data".into(), data);
            Value::Object(wrapped)
        }
    }
}

fn success_head(message: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("success".into(), Value::Bool(true));
    map.insert("message".into(), Value::String(message.to_string()));
    map
}

/// A rendered HTTP response: status plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// Envelope `value` and pair it with `status`.
    #[must_use]
    pub fn new(value: Value, status: StatusCode) -> Self {
        Self {
            status,
            body: build(value),
        }
    }

    /// Envelope `value` with `200 OK`.
    #[must_use]
    pub fn ok(value: Value) -> Self {
        Self::new(value, StatusCode::OK)
    }

    /// Use `body` verbatim, bypassing the envelope.
    #[must_use]
    pub const fn raw(body: Value, status: StatusCode) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.body.get("success").and_then(Value::as_bool) == Some(true)
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::to_vec(&self.body)
    }
}
