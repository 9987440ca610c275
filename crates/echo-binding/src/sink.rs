//! Where decoded device commands go.
//!
//! The binding never talks to devices itself. It hands `(target, command)`
//! pairs to a [`CommandSink`]; the smart-home side decides what a target id
//! means.

use std::sync::Mutex;

use echo_protocol::{Hsb, Message, Rgb};
use tokio::sync::{broadcast, Notify};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    On,
    Off,
    Color(Rgb),
}

impl DeviceCommand {
    /// The target and command a message asks for. `REGISTER` is not a
    /// device command.
    pub fn from_message(message: &Message) -> Option<(&str, DeviceCommand)> {
        match message {
            Message::On { thing } => Some((thing.as_str(), DeviceCommand::On)),
            Message::Off { thing } => Some((thing.as_str(), DeviceCommand::Off)),
            Message::ChangeColor {
                thing,
                red_proportion,
                green_proportion,
                blue_proportion,
                ..
            } => Some((
                thing.as_str(),
                DeviceCommand::Color(Rgb::new(
                    *red_proportion,
                    *green_proportion,
                    *blue_proportion,
                )),
            )),
            Message::Register { .. } => None,
        }
    }
}

pub trait CommandSink: Send + Sync {
    fn send_command(&self, target: &str, command: DeviceCommand);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    pub target: String,
    pub command: DeviceCommand,
    /// Colour commands in the form controller buses take them.
    pub hsb: Option<Hsb>,
}

impl DeviceEvent {
    pub fn new(target: impl Into<String>, command: DeviceCommand) -> Self {
        let hsb = match command {
            DeviceCommand::Color(rgb) => Some(Hsb::from_rgb(rgb)),
            DeviceCommand::On | DeviceCommand::Off => None,
        };
        Self {
            target: target.into(),
            command,
            hsb,
        }
    }
}

/// Publishes every command on a broadcast channel.
pub struct EventBusSink {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBusSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }
}

impl CommandSink for EventBusSink {
    fn send_command(&self, target: &str, command: DeviceCommand) {
        let event = DeviceEvent::new(target, command);
        if self.sender.send(event).is_err() {
            debug!(thing = %target, "No subscribers for device event");
        }
    }
}

/// Keeps every command in memory. Handy in tests and dry runs.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DeviceEvent>>,
    changed: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Wait until at least `count` commands have arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<DeviceEvent> {
        loop {
            let changed = self.changed.notified();
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            changed.await;
        }
    }
}

impl CommandSink for RecordingSink {
    fn send_command(&self, target: &str, command: DeviceCommand) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(DeviceEvent::new(target, command));
        self.changed.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn commands_from_messages() {
        assert_eq!(
            DeviceCommand::from_message(&Message::on("lamp")),
            Some(("lamp", DeviceCommand::On))
        );
        assert_eq!(
            DeviceCommand::from_message(&Message::off("lamp")),
            Some(("lamp", DeviceCommand::Off))
        );
        assert_eq!(DeviceCommand::from_message(&Message::register("echo-1")), None);
    }

    #[test]
    fn change_color_carries_rgb() {
        let msg = Message::ChangeColor {
            thing: "lamp".into(),
            color: "RED".into(),
            red_proportion: 255,
            green_proportion: 0,
            blue_proportion: 0,
        };
        assert_eq!(
            DeviceCommand::from_message(&msg),
            Some(("lamp", DeviceCommand::Color(Rgb::new(255, 0, 0))))
        );
    }

    #[tokio::test]
    async fn event_bus_sink_publishes() {
        let sink = EventBusSink::new(8);
        let mut rx = sink.subscribe();
        sink.send_command("lamp", DeviceCommand::On);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            DeviceEvent::new("lamp", DeviceCommand::On)
        );
    }

    #[test]
    fn colour_events_carry_hsb() {
        let event = DeviceEvent::new("lamp", DeviceCommand::Color(Rgb::new(0, 255, 0)));
        assert_eq!(
            event.hsb,
            Some(Hsb {
                hue: 120,
                saturation: 100,
                brightness: 100
            })
        );
        assert_eq!(DeviceEvent::new("lamp", DeviceCommand::On).hsb, None);
    }

    #[test]
    fn event_bus_sink_without_subscribers_does_not_panic() {
        let sink = EventBusSink::new(8);
        sink.send_command("lamp", DeviceCommand::Off);
    }

    #[tokio::test]
    async fn recording_sink_wakes_waiters() {
        let sink = Arc::new(RecordingSink::new());
        let waiter = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { sink.wait_for(2).await })
        };

        sink.send_command("lamp", DeviceCommand::On);
        sink.send_command("lamp", DeviceCommand::Off);

        let events = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].command, DeviceCommand::Off);
    }
}
