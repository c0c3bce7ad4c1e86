//! Colors for the color channel.
//!
//! Hex parsing keeps the lookup-free digit arithmetic: each character maps to
//! its nibble with three range checks folded into multiplies. Unlike CSS
//! parsing, a bad digit is reported instead of silently turning black, since
//! these strings come from config files.

use serde::{Deserialize, Serialize};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized f32 (for instance buffers)
    #[inline(always)]
    pub fn to_f32(self) -> [f32; 4] {
        const INV_255: f32 = 1.0 / 255.0;
        [
            self.r as f32 * INV_255,
            self.g as f32 * INV_255,
            self.b as f32 * INV_255,
            self.a as f32 * INV_255,
        ]
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// HSL with every component in `[0, 1]`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = unit_to_u8(l);
            return Self::rgb(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgb(
            unit_to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            unit_to_u8(hue_to_rgb(p, q, h)),
            unit_to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }

    /// Lighten towards white by `t` (0 = unchanged, 1 = white). Alpha is kept.
    pub fn lighten(self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f32 + (255.0 - c as f32) * t).round() as u8;
        Self { r: mix(self.r), g: mix(self.g), b: mix(self.b), a: self.a }
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_hex_color(&value).ok_or_else(|| format!("invalid hex color '{}'", value))
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_hex()
    }
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Hex character → 4-bit value, or 16 when the byte is not a hex digit.
#[inline(always)]
fn hex_digit(b: u8) -> u8 {
    let is_digit = (b.wrapping_sub(b'0') < 10) as u8;
    let is_lower = (b.wrapping_sub(b'a') < 6) as u8;
    let is_upper = (b.wrapping_sub(b'A') < 6) as u8;
    let valid = is_digit | is_lower | is_upper;

    let value = is_digit
        .wrapping_mul(b.wrapping_sub(b'0'))
        .wrapping_add(is_lower.wrapping_mul(b.wrapping_sub(b'a').wrapping_add(10)))
        .wrapping_add(is_upper.wrapping_mul(b.wrapping_sub(b'A').wrapping_add(10)));

    // invalid bytes land on 16, which no nibble can hold
    value | ((1 - valid) << 4)
}

/// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> Option<Rgba> {
    let bytes = s.trim().as_bytes();
    if bytes.first() != Some(&b'#') {
        return None;
    }
    let digits: Vec<u8> = bytes[1..].iter().map(|&b| hex_digit(b)).collect();
    if digits.iter().any(|&d| d > 15) {
        return None;
    }
    let short = |d: u8| d << 4 | d;
    let byte = |i: usize| digits[i] << 4 | digits[i + 1];

    match digits.len() {
        3 => Some(Rgba::rgb(short(digits[0]), short(digits[1]), short(digits[2]))),
        4 => Some(Rgba {
            r: short(digits[0]),
            g: short(digits[1]),
            b: short(digits[2]),
            a: short(digits[3]),
        }),
        6 => Some(Rgba::rgb(byte(0), byte(2), byte(4))),
        8 => Some(Rgba { r: byte(0), g: byte(2), b: byte(4), a: byte(6) }),
        _ => None,
    }
}
