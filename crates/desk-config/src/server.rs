//! HTTP server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::ConfigError;

fn default_bind() -> String {
    String::from("127.0.0.1:8000")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address the API listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ServerConfig {
    /// Parse `bind` as a socket address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `bind` is not `host:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|e| ConfigError::InvalidValue {
            field: "server.bind".into(),
            reason: format!("{e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind_parses() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let config = ServerConfig {
            bind: "localhost".into(),
        };
        let err = config.socket_addr().unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }
}
