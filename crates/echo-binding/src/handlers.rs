//! Binding-side handler table.

use std::sync::Arc;

use async_trait::async_trait;
use echo_protocol::{Dispatcher, Handler, Message, MessageKind};
use tracing::{info, warn};

use crate::sink::{CommandSink, DeviceCommand};

pub type SinkRef = Arc<dyn CommandSink>;

/// Forwards ON, OFF and CHANGE_COLOR to the sink, addressed by `thing`.
pub struct DeviceCommandHandler;

#[async_trait]
impl Handler<SinkRef> for DeviceCommandHandler {
    async fn handle(&self, sink: &SinkRef, message: Message) {
        match DeviceCommand::from_message(&message) {
            Some((thing, command)) => {
                info!(thing = %thing, command = ?command, "Handling device command");
                sink.send_command(thing, command);
            }
            None => warn!(kind = %message.kind(), "Not a device command"),
        }
    }
}

/// `REGISTER` is deliberately absent: only the relay consumes it.
pub fn command_dispatcher() -> Dispatcher<SinkRef> {
    let handler: Arc<dyn Handler<SinkRef>> = Arc::new(DeviceCommandHandler);
    Dispatcher::new("binding")
        .on(MessageKind::On, Arc::clone(&handler))
        .on(MessageKind::Off, Arc::clone(&handler))
        .on(MessageKind::ChangeColor, handler)
}
