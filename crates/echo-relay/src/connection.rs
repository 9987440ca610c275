//! Per-connection task: owns the socket, writes what the registry queues,
//! and feeds inbound frames to the relay's dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use echo_common::SessionId;
use echo_protocol::{Dispatcher, Handler, Message, MessageKind};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{Outbound, Registry};

/// What a relay-side handler knows about the frame's origin.
pub struct SessionContext {
    pub registry: Registry,
    pub session_id: SessionId,
    pub peer: SocketAddr,
}

/// Binds the announced identity to the session that sent it.
pub struct RegisterHandler;

#[async_trait]
impl Handler<SessionContext> for RegisterHandler {
    async fn handle(&self, ctx: &SessionContext, message: Message) {
        let Message::Register { amazon_echo_id } = message else {
            return;
        };
        if amazon_echo_id.trim().is_empty() {
            warn!(peer = %ctx.peer, session = %ctx.session_id, "REGISTER with empty identity ignored");
            return;
        }
        ctx.registry.bind(&amazon_echo_id, &ctx.session_id).await;
    }
}

pub fn register_dispatcher() -> Dispatcher<SessionContext> {
    Dispatcher::new("relay").on(MessageKind::Register, Arc::new(RegisterHandler))
}

/// Run one accepted connection until either side closes it or the relay
/// shuts down.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    peer: SocketAddr,
    registry: Registry,
    dispatcher: Arc<Dispatcher<SessionContext>>,
    shutdown: CancellationToken,
) {
    let (mut sink, mut stream) = ws.split();
    let (session_id, mut outbound) = registry.open_session().await;
    info!(peer = %peer, session = %session_id, "Connection opened");

    let ctx = SessionContext {
        registry: registry.clone(),
        session_id: session_id.clone(),
        peer,
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(WsMessage::Close(None)).await;
                break;
            }
            out = outbound.recv() => match out {
                Some(Outbound::Frame { text, ack }) => {
                    let result = sink.send(WsMessage::Text(text.into())).await;
                    let failed = result.is_err();
                    let _ = ack.send(result);
                    if failed {
                        break;
                    }
                }
                Some(Outbound::Close) => {
                    debug!(session = %session_id, "Closing on registry request");
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
                // Evicted without a close request.
                None => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    dispatcher.dispatch(&ctx, text.as_str()).await;
                }
                Some(Ok(WsMessage::Ping(_))) => {
                    debug!(session = %session_id, "Keepalive ping");
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(peer = %peer, session = %session_id, error = %e, "Connection error");
                    break;
                }
            },
        }
    }

    registry.close_session(&session_id).await;
    info!(peer = %peer, session = %session_id, "Connection closed");
}
