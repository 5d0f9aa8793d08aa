//! Remote decoder configuration with environment overrides.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default remote decode endpoint
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://api.qrserver.com/v1/read-qr-code/";
/// Default service name shown in the consent prompt
pub const DEFAULT_REMOTE_SERVICE: &str = "QR Server (api.qrserver.com)";
/// Default remote call timeout
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for the network-bound decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Multipart POST target
    pub endpoint: String,
    /// Name shown to the user before consent
    pub service_name: String,
    /// Whole-request timeout
    #[serde(with = "millis")]
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            service_name: DEFAULT_REMOTE_SERVICE.to_string(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

impl RemoteConfig {
    /// Defaults overridden by `QR_REMOTE_ENDPOINT`, `QR_REMOTE_SERVICE` and
    /// `QR_REMOTE_TIMEOUT_MS`. Blank or invalid values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = non_blank_env("QR_REMOTE_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(service) = non_blank_env("QR_REMOTE_SERVICE") {
            config.service_name = service;
        }
        if let Some(timeout) = timeout_from_env() {
            config.timeout = timeout;
        }
        config
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timeout_from_env() -> Option<Duration> {
    match non_blank_env("QR_REMOTE_TIMEOUT_MS")?.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        if ms == 0 {
            return Err(serde::de::Error::custom("timeout must be positive"));
        }
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial() {
        let config: RemoteConfig = serde_json::from_str(r#"{"timeout": 2500}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.endpoint, DEFAULT_REMOTE_ENDPOINT);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(serde_json::from_str::<RemoteConfig>(r#"{"timeout": 0}"#).is_err());
    }
}
