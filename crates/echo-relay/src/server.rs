//! TCP listener and WebSocket handshake for the relay.

use std::net::SocketAddr;
use std::sync::Arc;

use echo_config::RelayServerConfig;
use echo_protocol::Dispatcher;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::connection::{handle_connection, register_dispatcher, SessionContext};
use crate::error::RelayError;
use crate::registry::Registry;

pub struct RelayServer {
    listener: TcpListener,
    registry: Registry,
    path: Arc<str>,
    dispatcher: Arc<Dispatcher<SessionContext>>,
    shutdown: CancellationToken,
}

impl RelayServer {
    pub async fn bind(config: &RelayServerConfig) -> Result<Self, RelayError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;

        Ok(Self {
            listener,
            registry: Registry::new(config.session_buffer),
            path: Arc::from(config.path.as_str()),
            dispatcher: Arc::new(register_dispatcher()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        self.listener
            .local_addr()
            .map_err(|e| RelayError::Transport(e.to_string()))
    }

    /// Handle for issuing commands while the server runs.
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Cancelling this stops the accept loop and closes every connection.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!(addr = %addr, path = %self.path, "echo-relay listening"),
            Err(e) => warn!(error = %e, "Listening on unknown address"),
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(serve(
                            stream,
                            peer,
                            Arc::clone(&self.path),
                            self.registry.clone(),
                            Arc::clone(&self.dispatcher),
                            self.shutdown.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "TCP accept error"),
                },
            }
        }

        info!("echo-relay stopped accepting connections");
    }
}

async fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    path: Arc<str>,
    registry: Registry,
    dispatcher: Arc<Dispatcher<SessionContext>>,
    shutdown: CancellationToken,
) {
    let check_path = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        if request.uri().path() == &*path {
            return Ok(response);
        }
        warn!(peer = %peer, path = %request.uri().path(), "Rejecting connection to unknown path");
        let mut error = ErrorResponse::new(Some("not found".to_string()));
        *error.status_mut() = StatusCode::NOT_FOUND;
        Err(error)
    };

    match accept_hdr_async(stream, check_path).await {
        Ok(ws) => handle_connection(ws, peer, registry, dispatcher, shutdown).await,
        Err(e) => warn!(peer = %peer, error = %e, "WS handshake failed"),
    }
}
