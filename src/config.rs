//! Client configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable naming the backend base URL.
const SERVER_URL_VAR: &str = "CHATGATE_SERVER_URL";

/// Configuration shared by both gateways.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout applied to every gateway call.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment. `CHATGATE_SERVER_URL` is
    /// required; the timeout keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(SERVER_URL_VAR)
            .map_err(|_| ConfigError::MissingEnvVar(SERVER_URL_VAR.to_string()))?;
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: SERVER_URL_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_localhost() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }
}
