//! echo-binding: the smart-home side of the echo bridge.
//!
//! Holds one outbound WebSocket connection to the relay, announces its
//! identity with `REGISTER` as soon as the socket is up, keeps the
//! connection warm with pings, and turns incoming ON/OFF/CHANGE_COLOR
//! frames into calls on a [`CommandSink`]. If the relay drops the
//! connection the binding reconnects straight away, unless it is the one
//! shutting down.

pub mod connector;
pub mod error;
pub mod handlers;
pub mod keepalive;
pub mod sink;
pub mod status;

pub use connector::Connector;
pub use error::BindingError;
pub use keepalive::{Keepalive, PING_PAYLOAD};
pub use sink::{CommandSink, DeviceCommand, DeviceEvent, EventBusSink, RecordingSink};
pub use status::{ConnectorState, ConnectorStatus, StatusDetail};
