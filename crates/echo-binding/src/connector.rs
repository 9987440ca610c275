//! Outbound connection to the relay.
//!
//! One [`Connector`] per configured relay. `connect()` performs the
//! handshake, announces the identity with `REGISTER` and starts the
//! keepalive; a spawned session task then reads frames until the socket
//! goes away. An unsolicited close sends the connector straight back
//! through the handshake. A close caused by [`Connector::shutdown`] does
//! not.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use echo_config::BindingConfig;
use echo_protocol::{encode, Dispatcher, Message};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::error::BindingError;
use crate::handlers::{command_dispatcher, SinkRef};
use crate::keepalive::Keepalive;
use crate::status::{ConnectorState, ConnectorStatus, StatusDetail};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct Endpoint {
    address: String,
    identity: String,
    keepalive_interval: Duration,
}

struct Inner {
    endpoint: RwLock<Option<Endpoint>>,
    status: watch::Sender<ConnectorStatus>,
    /// Set by `shutdown()`; a close seen while this is set is ours.
    stopping: AtomicBool,
    dispatcher: Dispatcher<SinkRef>,
    sink: SinkRef,
    keepalive: Mutex<Keepalive>,
    writer: Mutex<Option<Arc<Mutex<WsWriter>>>>,
    session_task: Mutex<Option<JoinHandle<()>>>,
    /// Held while a socket is being opened or closed, so a handshake and a
    /// shutdown never interleave.
    lifecycle: Mutex<()>,
}

#[derive(Clone)]
pub struct Connector {
    inner: Arc<Inner>,
}

impl Connector {
    pub fn new(sink: SinkRef) -> Self {
        let (status, _) = watch::channel(ConnectorStatus::default());
        Self {
            inner: Arc::new(Inner {
                endpoint: RwLock::new(None),
                status,
                stopping: AtomicBool::new(false),
                dispatcher: command_dispatcher(),
                sink,
                keepalive: Mutex::new(Keepalive::new()),
                writer: Mutex::new(None),
                session_task: Mutex::new(None),
                lifecycle: Mutex::new(()),
            }),
        }
    }

    pub fn status(&self) -> ConnectorStatus {
        *self.inner.status.borrow()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectorStatus> {
        self.inner.status.subscribe()
    }

    /// Take the relay address and identity from `config` and connect.
    ///
    /// With either value missing the connector stays disconnected, reports
    /// "configuration pending" and returns `Ok`: an unconfigured controller
    /// is a normal state, not a failure.
    pub async fn initialize(&self, config: &BindingConfig) -> Result<(), BindingError> {
        let Some((address, identity)) = config.endpoint() else {
            warn!("Relay address or identity not configured, waiting for configuration");
            self.inner
                .report(ConnectorState::Disconnected, StatusDetail::ConfigurationPending);
            return Ok(());
        };

        *self.inner.endpoint.write().await = Some(Endpoint {
            address: address.to_string(),
            identity: identity.to_string(),
            keepalive_interval: config.keepalive_interval(),
        });
        self.inner.stopping.store(false, Ordering::SeqCst);
        self.connect().await
    }

    /// Open the socket. Allowed from `Disconnected` and `Reconnecting`.
    ///
    /// A failed handshake leaves the connector `Disconnected` with a
    /// communication error; nothing retries it.
    pub async fn connect(&self) -> Result<(), BindingError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        let reader = self
            .inner
            .establish(&[ConnectorState::Disconnected, ConnectorState::Reconnecting])
            .await?;

        let handle = tokio::spawn(run_session(Arc::clone(&self.inner), reader));
        *self.inner.session_task.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the keepalive, close the socket and wait for the session task.
    /// The close this causes does not trigger a reconnect.
    pub async fn shutdown(&self) {
        info!("Shutting down relay connection");
        self.inner.stopping.store(true, Ordering::SeqCst);

        let task = {
            let _lifecycle = self.inner.lifecycle.lock().await;
            self.inner.keepalive.lock().await.stop().await;
            let writer = self.inner.writer.lock().await.take();
            if let Some(writer) = writer {
                if let Err(e) = writer.lock().await.send(WsMessage::Close(None)).await {
                    debug!(error = %e, "Close frame not sent");
                }
            }
            self.inner.session_task.lock().await.take()
        };

        if let Some(mut task) = task {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                warn!("Session task did not finish in time, aborting");
                task.abort();
            }
        }

        self.inner
            .report(ConnectorState::Disconnected, StatusDetail::None);
    }
}

impl Inner {
    fn report(&self, state: ConnectorState, detail: StatusDetail) {
        let next = ConnectorStatus::new(state, detail);
        let changed = self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            info!(status = %next, "Connector status changed");
        }
    }

    /// Handshake, REGISTER, keepalive. Callers hold `lifecycle`.
    async fn establish(&self, from: &[ConnectorState]) -> Result<WsReader, BindingError> {
        if self.stopping.load(Ordering::SeqCst) {
            return Err(BindingError::ShuttingDown);
        }

        let (address, identity, interval) = {
            let endpoint = self.endpoint.read().await;
            match endpoint.as_ref() {
                Some(ep) => (ep.address.clone(), ep.identity.clone(), ep.keepalive_interval),
                None => {
                    self.report(ConnectorState::Disconnected, StatusDetail::ConfigurationPending);
                    return Err(BindingError::ConfigurationPending);
                }
            }
        };

        let current = self.status.borrow().state;
        if !from.contains(&current) {
            return Err(BindingError::InvalidState(current));
        }

        self.report(ConnectorState::Connecting, StatusDetail::None);
        info!(address = %address, "Connecting to relay");

        let mut stream = match connect_async(address.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(source) => {
                error!(address = %address, error = %source, "Relay handshake failed");
                self.report(ConnectorState::Disconnected, StatusDetail::CommunicationError);
                return Err(BindingError::Handshake { address, source });
            }
        };

        if self.stopping.load(Ordering::SeqCst) {
            if let Err(e) = stream.close(None).await {
                debug!(error = %e, "Close after late shutdown failed");
            }
            self.report(ConnectorState::Disconnected, StatusDetail::None);
            return Err(BindingError::ShuttingDown);
        }

        let (writer, reader) = stream.split();
        let writer = Arc::new(Mutex::new(writer));
        *self.writer.lock().await = Some(Arc::clone(&writer));
        self.report(ConnectorState::Online, StatusDetail::None);
        info!(address = %address, identity = %identity, "Connected to relay");

        let register = encode(&Message::register(identity));
        if let Err(e) = writer.lock().await.send(WsMessage::Text(register.into())).await {
            // The read side notices the dead socket and reconnects.
            warn!(error = %e, "Failed to send REGISTER");
        }

        self.keepalive.lock().await.start(writer, interval)?;
        Ok(reader)
    }

    /// Read until the socket ends. Returns on close or transport error.
    async fn read_frames(&self, reader: &mut WsReader) {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    self.dispatcher.dispatch(&self.sink, text.as_str()).await;
                }
                Ok(WsMessage::Close(frame)) => {
                    info!(frame = ?frame, "Relay closed the connection");
                    break;
                }
                Ok(WsMessage::Pong(_)) => debug!("Pong from relay"),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Relay connection error");
                    break;
                }
            }
        }
    }
}

/// Owns the read half for the connector's whole online life, across
/// reconnects.
async fn run_session(inner: Arc<Inner>, mut reader: WsReader) {
    loop {
        inner.read_frames(&mut reader).await;

        inner.keepalive.lock().await.stop().await;
        inner.writer.lock().await.take();

        if inner.stopping.load(Ordering::SeqCst) {
            debug!("Connection closed during shutdown");
            inner.report(ConnectorState::Disconnected, StatusDetail::None);
            return;
        }

        warn!("Lost connection to relay, reconnecting");
        inner.report(ConnectorState::Reconnecting, StatusDetail::None);

        let next = {
            let _lifecycle = inner.lifecycle.lock().await;
            inner.establish(&[ConnectorState::Reconnecting]).await
        };
        match next {
            Ok(next) => reader = next,
            Err(e) => {
                warn!(error = %e, "Reconnect failed");
                return;
            }
        }
    }
}
