//! Color handling
//!
//! Hex parsing and blending in CIE L*u*v*, which keeps perceived lightness
//! steps even across a heatmap gradient. Conversions use the sRGB primaries
//! and the D65 white point.

use palette::white_point::D65;
use palette::{FromColor, Luv, Mix, Srgb};

use crate::error::EngineError;

/// sRGB color with components in 0-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::Config(format!("invalid hex color {hex:?}"));
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        let (r, g, b) = match digits.len() {
            6 => (
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ),
            3 => (
                channel(&digits[0..1])? * 17,
                channel(&digits[1..2])? * 17,
                channel(&digits[2..3])? * 17,
            ),
            _ => return Err(invalid()),
        };

        Ok(Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        })
    }

    /// Format as lowercase `#rrggbb`, clamping out-of-gamut channels
    pub fn to_hex(self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// 8-bit channels, as used for ANSI truecolor output
    pub fn to_bytes(self) -> (u8, u8, u8) {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        (byte(self.r), byte(self.g), byte(self.b))
    }

    /// Linear blend towards `other` in L*u*v*; `t` is clamped to 0-1
    pub fn blend_luv(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let blended = self.to_luv().mix(other.to_luv(), t);
        let srgb = Srgb::<f64>::from_color(blended);
        Self {
            r: srgb.red,
            g: srgb.green,
            b: srgb.blue,
        }
    }

    fn to_luv(self) -> Luv<D65, f64> {
        Luv::from_color(Srgb::<f64>::new(self.r, self.g, self.b))
    }
}

/// Interpolated hex color at position `t` between `color_a` and `color_b`
pub fn color_for(t: f64, color_a: &str, color_b: &str) -> Result<String, EngineError> {
    let a = Rgb::from_hex(color_a)?;
    let b = Rgb::from_hex(color_b)?;
    Ok(a.blend_luv(b, t).to_hex())
}
