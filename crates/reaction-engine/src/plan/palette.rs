//! Colours: hex parsing and the built-in element palette.

use std::fmt;

use glam::Vec3;
use serde::{Serialize, Serializer};

/// 8-bit RGB colour. Serialises as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0x00, 0x00, 0x00]);
    pub const WHITE: Color = Color([0xFF, 0xFF, 0xFF]);
    /// Neutral grey for atoms with no usable colour and no palette entry.
    pub const NEUTRAL: Color = Color([0x99, 0x99, 0x99]);
    /// Bond cylinders.
    pub const BOND: Color = Color([0xCC, 0xCC, 0xCC]);

    /// Parse `#RGB`, `#RRGGBB` (leading `#` optional, case-insensitive).
    pub fn parse(text: &str) -> Option<Color> {
        let hex = text.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    rgb[i] = v * 16 + v;
                }
                Some(Color(rgb))
            }
            6 => {
                let mut rgb = [0u8; 3];
                for (i, slot) in rgb.iter_mut().enumerate() {
                    *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
                }
                Some(Color(rgb))
            }
            _ => None,
        }
    }

    /// Linear 0..1 components.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.0[0] as f32 / 255.0,
            self.0[1] as f32 / 255.0,
            self.0[2] as f32 / 255.0,
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Element colours the provider is asked to use. Also backs the legend.
pub const ELEMENT_PALETTE: &[(&str, Color)] = &[
    ("H", Color([0xFF, 0xFF, 0xFF])),
    ("O", Color([0xFF, 0x6B, 0x6B])),
    ("C", Color([0x33, 0x33, 0x33])),
    ("N", Color([0x6B, 0x9A, 0xFF])),
    ("Fe", Color([0xA1, 0x9D, 0x94])),
    ("S", Color([0xFF, 0xF3, 0x6B])),
    ("Cl", Color([0x6B, 0xFF, 0x8B])),
    ("Na", Color([0xB0, 0x6B, 0xFF])),
    ("K", Color([0x8A, 0x2B, 0xE2])),
    ("Mg", Color([0xBD, 0xB7, 0x6B])),
    ("Ca", Color([0xDD, 0xA0, 0xDD])),
    ("Al", Color([0xC0, 0xC0, 0xC0])),
    ("P", Color([0xFF, 0xA5, 0x00])),
    ("Br", Color([0xA5, 0x2A, 0x2A])),
    ("I", Color([0x4B, 0x00, 0x82])),
];

/// Palette colour for an element symbol (exact, case-sensitive match).
pub fn element_color(symbol: &str) -> Option<Color> {
    ELEMENT_PALETTE
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, c)| *c)
}

/// One row of the element legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub symbol: &'static str,
    pub color: Color,
}

/// Palette entries for the given symbols, in palette order.
/// Symbols with no palette entry are left out.
pub fn legend<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Vec<LegendEntry> {
    let wanted: Vec<&str> = symbols.into_iter().collect();
    ELEMENT_PALETTE
        .iter()
        .filter(|(s, _)| wanted.contains(s))
        .map(|&(symbol, color)| LegendEntry { symbol, color })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Color::parse("#FFF"), Some(Color::WHITE));
        assert_eq!(Color::parse("ff6b6b"), Some(Color([0xFF, 0x6B, 0x6B])));
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#GGGGGG"), None);
        assert_eq!(Color::parse("red"), None);
    }

    #[test]
    fn displays_uppercase_long_form() {
        assert_eq!(Color::parse("#abc").unwrap().to_string(), "#AABBCC");
    }

    #[test]
    fn legend_keeps_palette_order() {
        let entries = legend(["O", "H", "Xx"]);
        let symbols: Vec<_> = entries.iter().map(|e| e.symbol).collect();
        assert_eq!(symbols, vec!["H", "O"]);
    }

    #[test]
    fn element_lookup() {
        assert_eq!(element_color("Na"), Some(Color([0xB0, 0x6B, 0xFF])));
        assert_eq!(element_color("na"), None);
    }
}
