//! echo-relay: the cloud side of the echo bridge.
//!
//! Accepts WebSocket connections from controller bindings, learns which
//! identity each one serves from its `REGISTER` frame, and lets the voice
//! backend push ON/OFF/CHANGE_COLOR commands to an identity through
//! [`Registry::send_to_binding`]. Delivery is at most once: a frame that
//! cannot be written is reported as [`Delivery::NoSession`] and not retried.

pub mod connection;
pub mod error;
pub mod registry;
pub mod server;

pub use error::RelayError;
pub use registry::{Delivery, Registry};
pub use server::RelayServer;
