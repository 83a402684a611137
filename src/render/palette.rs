// src/render/palette.rs
use serde::Serialize;

use crate::error::{LstError, Result};

/// LST ramp, deep blue (cold) to dark red (hot)
pub const LST_PALETTE: [&str; 29] = [
    "040274", "040281", "0502a3", "0502b8", "0502ce", "0502e6", "0602ff", "235cb1", "307ef3", "269db1",
    "30c8e2", "32d3ef", "3be285", "3ff38f", "86e26f", "3ae237", "b5e22e", "d6e21f", "fff705", "ffd611",
    "ffb613", "ff8b13", "ff6e08", "ff500d", "ff0000", "de0101", "c21301", "a71001", "911003",
];

pub const NDVI_PALETTE: [&str; 3] = ["blue", "white", "green"];

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `rrggbb`, `#rrggbb`, or one of a few CSS color names
    pub fn parse(color: &str) -> Result<Self> {
        let named = match color.to_ascii_lowercase().as_str() {
            "black" => Some(Rgb::new(0, 0, 0)),
            "white" => Some(Rgb::new(255, 255, 255)),
            "red" => Some(Rgb::new(255, 0, 0)),
            "green" => Some(Rgb::new(0, 128, 0)),
            "blue" => Some(Rgb::new(0, 0, 255)),
            "yellow" => Some(Rgb::new(255, 255, 0)),
            _ => None,
        };
        if let Some(rgb) = named {
            return Ok(rgb);
        }

        let hex = color.trim_start_matches('#');
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| LstError::InvalidConfig(format!("bad color '{}'", color)))
        };
        if hex.len() != 6 {
            return Err(LstError::InvalidConfig(format!("bad color '{}'", color)));
        }
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Evenly spaced color ramp
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub colors: Vec<Rgb>,
}

impl Palette {
    pub fn from_strs<S: AsRef<str>>(colors: &[S]) -> Result<Self> {
        let colors = colors
            .iter()
            .map(|c| Rgb::parse(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if colors.is_empty() {
            return Err(LstError::InvalidConfig("empty palette".to_string()));
        }
        Ok(Self { colors })
    }

    pub fn lst() -> Self {
        // constant palette, always parses
        Self::from_strs(&LST_PALETTE[..]).unwrap_or_else(|_| Self { colors: vec![Rgb::new(0, 0, 0)] })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color of `value` stretched linearly over `[min, max]`; `None` for NaN
    pub fn colorize(&self, value: f64, min: f64, max: f64) -> Option<Rgb> {
        if value.is_nan() {
            return None;
        }
        if self.colors.len() == 1 {
            return Some(self.colors[0]);
        }
        let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
        let pos = t * (self.colors.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(self.colors.len() - 1);
        let frac = pos - lo as f64;
        let (a, b) = (self.colors[lo], self.colors[hi]);
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Some(Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b)))
    }
}
