//! Message types exchanged between the relay and a controller binding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::NamedColor;

// ---------------------------------------------------------------------------
// Discriminator
// ---------------------------------------------------------------------------

/// The `type` tag of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    On,
    Off,
    ChangeColor,
    Register,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::On,
        MessageKind::Off,
        MessageKind::ChangeColor,
        MessageKind::Register,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::On => "ON",
            MessageKind::Off => "OFF",
            MessageKind::ChangeColor => "CHANGE_COLOR",
            MessageKind::Register => "REGISTER",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A decoded frame. Field order here is the order on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "ON")]
    On { thing: String },

    #[serde(rename = "OFF")]
    Off { thing: String },

    #[serde(rename = "CHANGE_COLOR", rename_all = "camelCase")]
    ChangeColor {
        thing: String,
        color: String,
        red_proportion: u8,
        green_proportion: u8,
        blue_proportion: u8,
    },

    /// Sent by a binding right after it connects, naming the identity the
    /// relay should route to this connection.
    #[serde(rename = "REGISTER", rename_all = "camelCase")]
    Register { amazon_echo_id: String },
}

impl Message {
    pub fn on(thing: impl Into<String>) -> Self {
        Message::On {
            thing: thing.into(),
        }
    }

    pub fn off(thing: impl Into<String>) -> Self {
        Message::Off {
            thing: thing.into(),
        }
    }

    pub fn register(identity: impl Into<String>) -> Self {
        Message::Register {
            amazon_echo_id: identity.into(),
        }
    }

    /// Build a CHANGE_COLOR message from a spoken colour name.
    ///
    /// Returns `None` when the name is not one of the supported colours, so
    /// the caller can ask again instead of sending garbage.
    pub fn change_color(thing: impl Into<String>, color_name: &str) -> Option<Self> {
        let named = NamedColor::parse(color_name)?;
        let rgb = named.rgb();
        Some(Message::ChangeColor {
            thing: thing.into(),
            color: named.as_str().to_string(),
            red_proportion: rgb.r,
            green_proportion: rgb.g,
            blue_proportion: rgb.b,
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::On { .. } => MessageKind::On,
            Message::Off { .. } => MessageKind::Off,
            Message::ChangeColor { .. } => MessageKind::ChangeColor,
            Message::Register { .. } => MessageKind::Register,
        }
    }

    /// The device a command message addresses. `REGISTER` has none.
    pub fn thing(&self) -> Option<&str> {
        match self {
            Message::On { thing } | Message::Off { thing } => Some(thing),
            Message::ChangeColor { thing, .. } => Some(thing),
            Message::Register { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.as_str().parse::<MessageKind>(), Ok(kind));
        }
    }

    #[test]
    fn kind_parse_is_case_sensitive() {
        assert!("on".parse::<MessageKind>().is_err());
        assert!("change_color".parse::<MessageKind>().is_err());
        assert!("".parse::<MessageKind>().is_err());
    }

    #[test]
    fn message_kind_matches_variant() {
        assert_eq!(Message::on("lamp").kind(), MessageKind::On);
        assert_eq!(Message::off("lamp").kind(), MessageKind::Off);
        assert_eq!(Message::register("echo-1").kind(), MessageKind::Register);
        let color = Message::change_color("lamp", "blue").unwrap();
        assert_eq!(color.kind(), MessageKind::ChangeColor);
    }

    #[test]
    fn thing_is_none_for_register() {
        assert_eq!(Message::on("lamp").thing(), Some("lamp"));
        assert_eq!(Message::register("echo-1").thing(), None);
    }

    #[test]
    fn change_color_uses_canonical_name_and_rgb() {
        let msg = Message::change_color("lamp", "Red").unwrap();
        assert_eq!(
            msg,
            Message::ChangeColor {
                thing: "lamp".into(),
                color: "RED".into(),
                red_proportion: 255,
                green_proportion: 0,
                blue_proportion: 0,
            }
        );
    }

    #[test]
    fn change_color_rejects_unknown_names() {
        assert!(Message::change_color("lamp", "purple").is_none());
        assert!(Message::change_color("lamp", "").is_none());
    }
}
