//! Typed failure body emitted for every [`AppError`](crate::AppError).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"success": false, "message", "data", "info"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailureBody {
    pub success: bool,
    pub message: String,
    pub data: Map<String, Value>,
    pub info: FailureInfo,
}

/// Error details. The last three fields exist only in debug mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailureInfo {
    pub error_code: i64,
    pub error_message: String,
    pub error_html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<Map<String, Value>>,
}
