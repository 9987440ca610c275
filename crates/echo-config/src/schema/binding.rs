use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Controller-side settings: where the relay lives and who we are.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// WebSocket URL of the relay, e.g. `wss://skill.example.com/qiviconWebsocket`.
    pub address: Option<String>,
    /// Opaque identity the relay routes commands by.
    pub identity: Option<String>,
    /// Seconds between keepalive pings.
    pub keepalive_interval_secs: u64,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            address: None,
            identity: None,
            keepalive_interval_secs: 30,
        }
    }
}

impl BindingConfig {
    /// Both `address` and `identity`, if set to something non-blank.
    pub fn endpoint(&self) -> Option<(&str, &str)> {
        let address = non_blank(self.address.as_deref())?;
        let identity = non_blank(self.identity.as_deref())?;
        Some((address, identity))
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_requires_both_values() {
        let mut config = BindingConfig::default();
        assert!(config.endpoint().is_none());

        config.address = Some("ws://localhost:8080/qiviconWebsocket".into());
        assert!(config.endpoint().is_none());

        config.identity = Some("echo-123".into());
        assert_eq!(
            config.endpoint(),
            Some(("ws://localhost:8080/qiviconWebsocket", "echo-123"))
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = BindingConfig {
            address: Some("ws://localhost:8080".into()),
            identity: Some("   ".into()),
            ..Default::default()
        };
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn keepalive_interval_is_seconds() {
        let config = BindingConfig {
            keepalive_interval_secs: 5,
            ..Default::default()
        };
        assert_eq!(config.keepalive_interval(), Duration::from_secs(5));
    }
}
