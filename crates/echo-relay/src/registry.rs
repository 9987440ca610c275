//! Session registry: which identity is reachable over which live connection.
//!
//! Two maps, both behind their own `RwLock`:
//!
//! - `sessions`: every live connection, keyed by its [`SessionId`]. The value
//!   is the sender half of that connection's outbound queue; the connection
//!   task owns the socket and performs the actual writes.
//! - `bindings`: identity → session id, filled by `REGISTER`.
//!
//! A closed connection only leaves `sessions`. A binding that still names it
//! is found and removed by the next [`Registry::send_to_binding`] for that
//! identity. Lock order, where both are needed, is `bindings` then
//! `sessions`.

use std::collections::HashMap;
use std::sync::Arc;

use echo_common::SessionId;
use echo_protocol::{encode, Message};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_tungstenite::tungstenite;
use tracing::{debug, info, warn};

/// Outcome of [`Registry::send_to_binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The frame was written to the session's socket.
    Delivered,
    /// No live session for the identity, or the write failed.
    NoSession,
}

/// Work for a connection task.
#[derive(Debug)]
pub enum Outbound {
    /// Write `text` and report the result on `ack`.
    Frame {
        text: String,
        ack: oneshot::Sender<Result<(), tungstenite::Error>>,
    },
    /// Close the socket and end the connection.
    Close,
}

#[derive(Clone)]
pub struct Registry {
    sessions: Arc<RwLock<HashMap<SessionId, mpsc::Sender<Outbound>>>>,
    bindings: Arc<RwLock<HashMap<String, SessionId>>>,
    buffer: usize,
}

impl Registry {
    /// `buffer` is the outbound queue depth per session.
    pub fn new(buffer: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            bindings: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Allocate a session for a freshly accepted connection. The caller
    /// drains the returned receiver into the socket.
    pub async fn open_session(&self) -> (SessionId, mpsc::Receiver<Outbound>) {
        let id = SessionId::new();
        let (tx, rx) = mpsc::channel(self.buffer);
        self.sessions.write().await.insert(id.clone(), tx);
        debug!(session = %id, "Session allocated");
        (id, rx)
    }

    /// The connection is gone. Bindings are left alone.
    pub async fn close_session(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session = %id, "Session removed");
        }
        removed
    }

    /// Route `identity` to `id`. The last registration wins; the session that
    /// held the identity before is not closed. Returns that previous session.
    pub async fn bind(&self, identity: &str, id: &SessionId) -> Option<SessionId> {
        let previous = self
            .bindings
            .write()
            .await
            .insert(identity.to_string(), id.clone());

        match &previous {
            Some(prev) if prev != id => {
                info!(identity, session = %id, previous = %prev, "Identity moved to new session");
            }
            _ => info!(identity, session = %id, "Identity bound"),
        }
        previous
    }

    /// Send `message` to whichever session `identity` is bound to.
    ///
    /// Safe to call from any number of tasks at once. A failed write drops
    /// the binding and the session and closes the connection; the caller
    /// just sees [`Delivery::NoSession`].
    pub async fn send_to_binding(&self, identity: &str, message: &Message) -> Delivery {
        let bound = self.bindings.read().await.get(identity).cloned();
        let Some(session_id) = bound else {
            debug!(identity, "No binding for identity");
            return Delivery::NoSession;
        };

        let tx = self.sessions.read().await.get(&session_id).cloned();
        let Some(tx) = tx else {
            self.unbind_if(identity, &session_id).await;
            info!(identity, session = %session_id, "Binding referred to a closed session, removed");
            return Delivery::NoSession;
        };

        let (ack, written) = oneshot::channel();
        let frame = Outbound::Frame {
            text: encode(message),
            ack,
        };
        let result = match tx.send(frame).await {
            Ok(()) => match written.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("connection ended before the write".to_string()),
            },
            Err(_) => Err("connection ended before the write".to_string()),
        };

        match result {
            Ok(()) => {
                debug!(identity, session = %session_id, kind = %message.kind(), "Delivered");
                Delivery::Delivered
            }
            Err(reason) => {
                warn!(identity, session = %session_id, error = %reason, "Write failed, dropping session");
                self.evict(&session_id).await;
                Delivery::NoSession
            }
        }
    }

    /// Forget the session entirely: every binding that names it, the session
    /// entry, and the connection (asked to close).
    pub async fn evict(&self, id: &SessionId) {
        self.bindings.write().await.retain(|_, bound| bound != id);
        let tx = self.sessions.write().await.remove(id);
        if let Some(tx) = tx {
            // Dropping `tx` still ends the connection once its queue drains.
            if let Err(e) = tx.try_send(Outbound::Close) {
                debug!(session = %id, error = %e, "Close request not queued");
            }
        }
    }

    /// Disconnect whatever session `identity` is bound to. Returns whether
    /// there was a live one.
    pub async fn close_binding(&self, identity: &str) -> bool {
        match self.session_for(identity).await {
            Some(id) => {
                info!(identity, session = %id, "Closing bound session");
                self.evict(&id).await;
                true
            }
            None => false,
        }
    }

    /// The live session `identity` is bound to, if any.
    pub async fn session_for(&self, identity: &str) -> Option<SessionId> {
        let bound = self.bindings.read().await.get(identity).cloned()?;
        let live = self.sessions.read().await.contains_key(&bound);
        live.then_some(bound)
    }

    /// Whether a binding entry exists, live or not.
    pub async fn is_bound(&self, identity: &str) -> bool {
        self.bindings.read().await.contains_key(identity)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn binding_count(&self) -> usize {
        self.bindings.read().await.len()
    }

    async fn unbind_if(&self, identity: &str, id: &SessionId) {
        let mut bindings = self.bindings.write().await;
        if bindings.get(identity) == Some(id) {
            bindings.remove(identity);
        }
    }
}

#[cfg(test)]
mod tests;
