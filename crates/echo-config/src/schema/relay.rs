use serde::{Deserialize, Serialize};

/// Configuration for the relay's WebSocket listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Request path bindings connect to; other paths are refused.
    pub path: String,
    /// Outbound frames queued per session before senders wait.
    pub session_buffer: usize,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            path: "/qiviconWebsocket".into(),
            session_buffer: 64,
        }
    }
}

impl RelayServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
