//! Request adapters.
//!
//! [`RawRequest`] is the transport-level view copied out of a `tiny_http`
//! request. [`ApiRequest`] decorates it with the parsed JSON body and the
//! authenticated user. Both feed error diagnostics through [`RequestSource`].

use desk_core::{RequestSource, UserRef};
use serde_json::Value;
use std::collections::BTreeMap;

/// Transport-level request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub method: String,
    /// Path plus optional query string, as received.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub remote_addr: Option<String>,
}

impl RawRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            remote_addr: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Copy the request line and headers out of a `tiny_http` request.
    #[must_use]
    pub fn from_tiny(request: &tiny_http::Request) -> Self {
        Self {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            headers: request
                .headers()
                .iter()
                .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
                .collect(),
            remote_addr: request.remote_addr().map(ToString::to_string),
        }
    }

    /// Path without the query string.
    #[must_use]
    pub fn path_only(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(path, _)| path)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl RequestSource for RawRequest {
    fn path(&self) -> Option<String> {
        Some(self.path_only().to_string())
    }

    fn method(&self) -> Option<String> {
        Some(self.method.clone())
    }

    fn query_params(&self) -> Option<BTreeMap<String, String>> {
        let query = self.url.split_once('?').map_or("", |(_, query)| query);
        Some(parse_query(query))
    }

    fn user_agent(&self) -> Option<String> {
        self.header("User-Agent").map(str::to_string)
    }

    fn describe(&self) -> String {
        match &self.remote_addr {
            Some(addr) => format!("{} {} from {addr}", self.method, self.url),
            None => format!("{} {}", self.method, self.url),
        }
    }
}

/// A request as seen by API handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub raw: RawRequest,
    pub body: Option<Value>,
    pub user: Option<UserRef>,
}

impl ApiRequest {
    #[must_use]
    pub const fn new(raw: RawRequest) -> Self {
        Self {
            raw,
            body: None,
            user: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: UserRef) -> Self {
        self.user = Some(user);
        self
    }

    /// Query parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        self.raw.query_params()?.remove(name)
    }
}

impl RequestSource for ApiRequest {
    fn path(&self) -> Option<String> {
        self.raw.path()
    }

    fn method(&self) -> Option<String> {
        self.raw.method()
    }

    fn user(&self) -> Option<UserRef> {
        self.user.clone()
    }

    fn body(&self) -> Option<Value> {
        self.body.clone()
    }

    fn query_params(&self) -> Option<BTreeMap<String, String>> {
        self.raw.query_params()
    }

    fn user_agent(&self) -> Option<String> {
        self.raw.user_agent()
    }

    fn describe(&self) -> String {
        self.raw.describe()
    }
}

/// Decode `a=1&b=x%20y` into a map. Undecodable pairs keep their raw text.
fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(text: &str) -> String {
    let spaced = text.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |decoded| decoded.into_owned())
}
