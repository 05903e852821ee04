use crate::arm_model::{ArmModelParams, Hand};
use crate::error::ConfigError;
use log::*;
use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_ID_PREFIX: &str = "Daydream Controller";

/// Rotation offset value that asks for per-hand auto detection
pub const AUTO_ROTATION_OFFSET: f32 = -999.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Srgb<u8>);

impl Color {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color(Srgb::new(red, green, blue))
    }

    /// sRGB channels scaled to 0..1
    pub fn to_f32(self) -> (f32, f32, f32) {
        let c: Srgb<f32> = self.0.into_format();
        (c.red, c.green, c.blue)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    /// Accepts `#RRGGBB` or a CSS color name
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(value.to_owned());
        let trimmed = value.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
            };
            return Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }
        palette::named::from_str(&trimmed.to_ascii_lowercase())
            .map(Color)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        let c = color.0;
        format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from(*self))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Color::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Extra roll applied to the controller after extrapolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationOffset {
    Degrees(f32),
    /// Pick the offset from the controller's hand. Not implemented, resolves to 0.
    Auto,
}

impl RotationOffset {
    pub fn degrees(self) -> f32 {
        match self {
            RotationOffset::Degrees(degrees) => degrees,
            RotationOffset::Auto => 0.0,
        }
    }
}

impl Default for RotationOffset {
    fn default() -> Self {
        RotationOffset::Degrees(0.0)
    }
}

#[allow(clippy::float_cmp)]
impl From<f32> for RotationOffset {
    fn from(degrees: f32) -> Self {
        if degrees == AUTO_ROTATION_OFFSET {
            RotationOffset::Auto
        } else {
            RotationOffset::Degrees(degrees)
        }
    }
}

impl From<RotationOffset> for f32 {
    fn from(offset: RotationOffset) -> Self {
        match offset {
            RotationOffset::Degrees(degrees) => degrees,
            RotationOffset::Auto => AUTO_ROTATION_OFFSET,
        }
    }
}

impl Serialize for RotationOffset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(f32::from(*self))
    }
}

impl<'de> Deserialize<'de> for RotationOffset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f32::deserialize(deserializer).map(RotationOffset::from)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    pub button_color: Color,
    pub button_touched_color: Color,
    pub button_pressed_color: Color,
    pub model: bool,
    pub rotation_offset: RotationOffset,
    pub hand: Hand,
    pub id_prefix: String,
    pub arm_model: ArmModelParams,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            button_color: Color::rgb(0xFA, 0xFA, 0xFA),
            button_touched_color: Color::rgb(0xFF, 0xFF, 0x00),
            button_pressed_color: Color::rgb(0xFF, 0xA5, 0x00),
            model: true,
            rotation_offset: RotationOffset::default(),
            hand: Hand::default(),
            id_prefix: DEFAULT_ID_PREFIX.to_owned(),
            arm_model: ArmModelParams::default(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ControllerConfig = serde_json::from_str(json)?;
        if config.rotation_offset == RotationOffset::Auto {
            warn!("Automatic rotation offset is not supported, using 0 degrees");
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
