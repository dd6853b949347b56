//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_env() -> String {
    String::from("local")
}

fn default_app_name() -> String {
    String::from("taskdesk")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Expose diagnostics in error bodies and use framework-native handling
    /// for unclassified failures.
    #[serde(default)]
    pub debug: bool,

    /// Deployment environment name (e.g., "production", "staging").
    #[serde(default = "default_env")]
    pub env: String,

    /// Application name used when reporting errors.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debug: false,
            env: default_env(),
            app_name: default_app_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert!(!config.debug);
        assert_eq!(config.env, "local");
        assert_eq!(config.app_name, "taskdesk");
    }
}
