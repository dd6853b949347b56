//! Request snapshots attached to errors for diagnostics and reporting.
//!
//! Two request representations reach the error layer: the raw transport
//! request and the decorated API request (authenticated user, parsed body).
//! Both implement [`RequestSource`]; [`RequestSnapshot::capture`] reads them
//! field by field and degrades each missing or unreadable field on its own.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Placeholder recorded when no user agent is available.
pub const UNKNOWN_DEVICE: &str = "Unknown";

/// Minimal identity of the user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

/// Read-only view of an inbound request.
///
/// Every accessor is optional; implementations return `None` for anything they
/// cannot provide rather than failing.
pub trait RequestSource {
    fn path(&self) -> Option<String>;

    fn method(&self) -> Option<String>;

    fn user(&self) -> Option<UserRef> {
        None
    }

    /// Parsed request body, when the representation has one.
    fn body(&self) -> Option<Value> {
        None
    }

    fn query_params(&self) -> Option<BTreeMap<String, String>>;

    fn user_agent(&self) -> Option<String>;

    /// Fallback description used when path or method are unavailable.
    fn describe(&self) -> String {
        String::from("<request>")
    }
}

/// The request line, or an opaque description when it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RequestLine {
    Line { url: String, method: String },
    Opaque(String),
}

/// Point-in-time copy of the request fields used in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub request: RequestLine,
    pub user: Option<UserRef>,
    #[serde(rename = "request_data")]
    pub body: Option<Value>,
    #[serde(rename = "param")]
    pub params: Option<BTreeMap<String, String>>,
    pub device: String,
}

impl RequestSnapshot {
    /// Copy the diagnostic fields out of a request.
    pub fn capture(source: &dyn RequestSource) -> Self {
        let request = match (source.path(), source.method()) {
            (Some(url), Some(method)) => RequestLine::Line { url, method },
            _ => RequestLine::Opaque(source.describe()),
        };

        Self {
            request,
            user: source.user(),
            body: source.body(),
            params: source.query_params(),
            device: source
                .user_agent()
                .filter(|agent| !agent.is_empty())
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
        }
    }

    /// Whether a real user agent was captured.
    #[must_use]
    pub fn has_device(&self) -> bool {
        self.device != UNKNOWN_DEVICE
    }
}

impl RequestSource for RequestSnapshot {
    fn path(&self) -> Option<String> {
        match &self.request {
            RequestLine::Line { url, .. } => Some(url.clone()),
            RequestLine::Opaque(_) => None,
        }
    }

    fn method(&self) -> Option<String> {
        match &self.request {
            RequestLine::Line { method, .. } => Some(method.clone()),
            RequestLine::Opaque(_) => None,
        }
    }

    fn user(&self) -> Option<UserRef> {
        self.user.clone()
    }

    fn body(&self) -> Option<Value> {
        self.body.clone()
    }

    fn query_params(&self) -> Option<BTreeMap<String, String>> {
        self.params.clone()
    }

    fn user_agent(&self) -> Option<String> {
        self.has_device().then(|| self.device.clone())
    }

    fn describe(&self) -> String {
        match &self.request {
            RequestLine::Line { url, method } => format!("{method} {url}"),
            RequestLine::Opaque(text) => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// A request that can only describe itself.
    struct Opaque;

    impl RequestSource for Opaque {
        fn path(&self) -> Option<String> {
            None
        }

        fn method(&self) -> Option<String> {
            Some("GET".into())
        }

        fn query_params(&self) -> Option<BTreeMap<String, String>> {
            None
        }

        fn user_agent(&self) -> Option<String> {
            None
        }

        fn describe(&self) -> String {
            "socket 127.0.0.1:9000".into()
        }
    }

    #[test]
    fn missing_fields_degrade_independently() {
        let snapshot = RequestSnapshot::capture(&Opaque);
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "request": "socket 127.0.0.1:9000",
                "user": null,
                "request_data": null,
                "param": null,
                "device": "Unknown",
            })
        );
        assert!(!snapshot.has_device());
    }

    #[test]
    fn full_snapshot_serializes_request_line() {
        let snapshot = RequestSnapshot {
            request: RequestLine::Line {
                url: "/tasks/3".into(),
                method: "PATCH".into(),
            },
            user: Some(UserRef {
                id: 7,
                username: "maria".into(),
            }),
            body: Some(json!({"status": "done"})),
            params: Some(BTreeMap::from([("page".to_string(), "2".to_string())])),
            device: "curl/8.5".into(),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["request"], json!({"url": "/tasks/3", "method": "PATCH"}));
        assert_eq!(value["user"]["username"], "maria");
        assert_eq!(value["param"]["page"], "2");

        // A snapshot can stand in for the request it was taken from.
        assert_eq!(RequestSnapshot::capture(&snapshot), snapshot);
    }
}
