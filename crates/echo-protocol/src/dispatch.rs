//! Decode-then-route, shared by both ends of the relay.
//!
//! Each side builds a [`Dispatcher`] with the handlers it cares about. The
//! relay only registers `REGISTER`; a binding registers the device commands.
//! Anything else that decodes cleanly is logged as unexpected and ignored.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::codec::{decode, DecodeError};
use crate::message::{Message, MessageKind};

/// Reacts to one kind of decoded message. `Ctx` is whatever per-side state
/// the handler needs (the relay passes the session, a binding its sink).
#[async_trait]
pub trait Handler<Ctx>: Send + Sync {
    async fn handle(&self, ctx: &Ctx, message: Message);
}

/// What happened to a frame.
#[derive(Debug)]
pub enum Dispatched {
    Handled(MessageKind),
    /// Valid message with no handler on this side.
    Unexpected(MessageKind),
    Dropped(DecodeError),
}

pub struct Dispatcher<Ctx> {
    side: &'static str,
    handlers: HashMap<MessageKind, Arc<dyn Handler<Ctx>>>,
}

impl<Ctx: Sync> Dispatcher<Ctx> {
    /// `side` only shows up in log lines.
    pub fn new(side: &'static str) -> Self {
        Self {
            side,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn on(mut self, kind: MessageKind, handler: Arc<dyn Handler<Ctx>>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub async fn dispatch(&self, ctx: &Ctx, frame: &str) -> Dispatched {
        let message = match decode(frame) {
            Ok(message) => message,
            Err(e) => {
                if e.is_unsupported() {
                    error!(
                        side = self.side,
                        error = %e,
                        "Received unsupported message, check that binding and relay versions match"
                    );
                } else {
                    warn!(side = self.side, error = %e, "Dropping undecodable frame");
                }
                return Dispatched::Dropped(e);
            }
        };

        let kind = message.kind();
        match self.handlers.get(&kind) {
            Some(handler) => {
                debug!(side = self.side, kind = %kind, "Dispatching message");
                handler.handle(ctx, message).await;
                Dispatched::Handled(kind)
            }
            None => {
                warn!(side = self.side, kind = %kind, frame = %frame, "Unexpected message");
                Dispatched::Unexpected(kind)
            }
        }
    }
}
