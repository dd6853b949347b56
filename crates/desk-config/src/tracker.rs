//! Error-tracking service configuration.

use serde::{Deserialize, Serialize};

/// Default delivery timeout in seconds.
const fn default_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Tracker DSN (`https://<key>@<host>/<project>`). Empty disables reporting.
    #[serde(default)]
    pub dsn: String,

    /// Overrides `general.app_name` in the `app` tag of reports.
    #[serde(default)]
    pub app_name: String,

    /// HTTP timeout for a single report delivery.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            app_name: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TrackerConfig {
    /// Reporting is active only when a DSN is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.dsn.trim().is_empty()
    }
}
