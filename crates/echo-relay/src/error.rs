use echo_common::{BridgeError, ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RelayError> for BridgeError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Config(e) => BridgeError::Config(e),
            RelayError::Transport(msg) => BridgeError::Transport(msg),
            RelayError::Bind { addr, source } => BridgeError::Io(std::io::Error::new(
                source.kind(),
                format!("failed to bind {addr}: {source}"),
            )),
        }
    }
}
