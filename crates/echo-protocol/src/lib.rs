//! Wire protocol shared by the relay and the controller binding.
//!
//! Every frame is a single JSON object whose `type` field selects the
//! payload schema. Decoding never fails hard: anything that is not a
//! recognisable message comes back as a [`DecodeError`] the caller logs and
//! drops, and the connection carries on.

pub mod codec;
pub mod color;
pub mod dispatch;
pub mod message;

pub use codec::{decode, encode, DecodeError};
pub use color::{Hsb, NamedColor, Rgb};
pub use dispatch::{Dispatched, Dispatcher, Handler};
pub use message::{Message, MessageKind};
