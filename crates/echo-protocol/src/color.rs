use serde::{Deserialize, Serialize};

/// An 8-bit RGB triple, as carried by CHANGE_COLOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Hue in degrees `[0, 360)`, saturation and brightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: u16,
    pub saturation: u8,
    pub brightness: u8,
}

impl Hsb {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let r = f64::from(rgb.r);
        let g = f64::from(rgb.g);
        let b = f64::from(rgb.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max == 0.0 { 0.0 } else { delta / max * 100.0 };
        let brightness = max / 255.0 * 100.0;

        Self {
            hue: (hue.round() as u16) % 360,
            saturation: saturation.round() as u8,
            brightness: brightness.round() as u8,
        }
    }
}

impl From<Rgb> for Hsb {
    fn from(rgb: Rgb) -> Self {
        Hsb::from_rgb(rgb)
    }
}

/// Colours a user can ask for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Red,
    Green,
    Blue,
    White,
}

impl NamedColor {
    pub const ALL: [NamedColor; 4] = [
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Blue,
        NamedColor::White,
    ];

    /// Case-insensitive lookup; anything unrecognised is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        NamedColor::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NamedColor::Red => "RED",
            NamedColor::Green => "GREEN",
            NamedColor::Blue => "BLUE",
            NamedColor::White => "WHITE",
        }
    }

    pub fn rgb(self) -> Rgb {
        match self {
            NamedColor::Red => Rgb::new(255, 0, 0),
            NamedColor::Green => Rgb::new(0, 255, 0),
            NamedColor::Blue => Rgb::new(0, 0, 255),
            NamedColor::White => Rgb::new(255, 255, 255),
        }
    }
}
