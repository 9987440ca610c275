use tokio_tungstenite::tungstenite;

use crate::status::ConnectorState;

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("configuration pending: relay address and identity are required")]
    ConfigurationPending,

    #[error("cannot connect while {0}")]
    InvalidState(ConnectorState),

    #[error("handshake with {address} failed: {source}")]
    Handshake {
        address: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("a keepalive task is already running")]
    KeepaliveAlreadyRunning,

    #[error("binding is shutting down")]
    ShuttingDown,
}
