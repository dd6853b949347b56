//! Diagnostic info payloads and backtrace frames.

use serde_json::{Map, Value};
use std::backtrace::{Backtrace, BacktraceStatus};

/// Caller-supplied diagnostic info.
///
/// Structured maps are kept as-is; any other value is wrapped under `"info"`.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrInfo {
    Structured(Map<String, Value>),
    Opaque(Value),
}

impl ErrInfo {
    /// Normalize to a mapping.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            Self::Structured(map) => map,
            Self::Opaque(Value::Null) => Map::new(),
            Self::Opaque(value) => {
                let mut map = Map::new();
                map.insert("info".to_string(), value);
                map
            }
        }
    }
}

impl From<Map<String, Value>> for ErrInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self::Structured(map)
    }
}

impl From<Value> for ErrInfo {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Structured(map),
            other => Self::Opaque(other),
        }
    }
}

impl From<&str> for ErrInfo {
    fn from(text: &str) -> Self {
        Self::Opaque(Value::String(text.to_string()))
    }
}

impl From<String> for ErrInfo {
    fn from(text: String) -> Self {
        Self::Opaque(Value::String(text))
    }
}

/// Render a captured backtrace as `{name, location}` frames.
///
/// Returns an empty list when capture was disabled (see `RUST_BACKTRACE`).
pub(crate) fn trace_frames(backtrace: &Backtrace) -> Vec<Value> {
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    parse_frames(&backtrace.to_string())
}

fn parse_frames(rendered: &str) -> Vec<Value> {
    let mut frames: Vec<Map<String, Value>> = Vec::new();

    for line in rendered.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                frame.insert("location".into(), Value::String(location.to_string()));
            }
            continue;
        }

        let Some((index, name)) = line.split_once(": ") else {
            continue;
        };
        if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
            let mut frame = Map::new();
            frame.insert("name".into(), Value::String(name.to_string()));
            frame.insert("location".into(), Value::Null);
            frames.push(frame);
        }
    }

    frames.into_iter().map(Value::Object).collect()
}
