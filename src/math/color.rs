use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// sRGB color with components in [0, 1], written as `#rrggbb` in config files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);
    pub const BLACK: Rgb = Rgb([0.0, 0.0, 0.0]);

    /// From a packed `0xrrggbb` value
    pub fn from_hex(hex: u32) -> Self {
        Rgb([
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        ])
    }

    pub fn to_hex(self) -> u32 {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u32);
        (r << 16) | (g << 8) | b
    }

    /// Components converted to linear light for shading
    pub fn to_linear(self) -> [f32; 3] {
        self.0.map(srgb_to_linear)
    }

    pub fn from_linear(linear: [f32; 3]) -> Self {
        Rgb(linear.map(linear_to_srgb))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(format!("expected #rrggbb, got {:?}", s));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb::from_hex)
            .map_err(|e| format!("invalid color {:?}: {}", s, e))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let color = Rgb::from_hex(0x186691);
        assert_eq!(color.to_hex(), 0x186691);
        assert_eq!(color.to_string(), "#186691");
        assert_eq!("#186691".parse::<Rgb>(), Ok(color));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_linear_endpoints() {
        assert_eq!(Rgb::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let white = Rgb::WHITE.to_linear();
        for c in white {
            assert!((c - 1.0).abs() < 1e-6);
        }
        assert!(srgb_to_linear(0.5) < 0.5);
        assert!((linear_to_srgb(srgb_to_linear(0.5)) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::from_hex(0x9bd8ff)).unwrap();
        assert_eq!(json, "\"#9bd8ff\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::from_hex(0x9bd8ff));
    }
}
