//! Lenient JSON encoding.
//!
//! Response bodies and tracker extras must always serialize. Values that
//! `serde_json` rejects (non-string map keys, failing `Serialize` impls) fall
//! back to their `Debug` representation instead of failing the response.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

/// Convert any value to JSON, substituting its `Debug` string on failure.
pub fn to_value_lossy<T>(value: &T) -> Value
where
    T: Serialize + Debug + ?Sized,
{
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{value:?}")))
}

/// Encode a JSON value to a compact string.
#[must_use]
pub fn to_string(value: &Value) -> String {
    // `Value` keys are always strings, so this cannot fail in practice.
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value}"))
}

/// Encode a JSON value to bytes for the wire.
#[must_use]
pub fn to_vec(value: &Value) -> Vec<u8> {
    to_string(value).into_bytes()
}

/// Encode any serializable value to a JSON string, lossily.
pub fn to_string_lossy<T>(value: &T) -> String
where
    T: Serialize + Debug + ?Sized,
{
    to_string(&to_value_lossy(value))
}
