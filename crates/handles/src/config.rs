//! Tunables for handles and layers, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "frame": { "duration_ms": 150 }, "resize": { "policy": "corner_anchored" } }
//! ```

use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::grip::GripSet;
use crate::layer::PositionOwner;
use crate::policy::ResizePolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    pub frame: FrameConfig,
    pub grips: GripConfig,
    pub resize: ResizeConfig,
    pub position_owner: PositionOwner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub duration_ms: u64,
    #[serde(with = "hex_color")]
    pub color: Srgb<u8>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            color: Srgb::new(0x00, 0xff, 0x00),
        }
    }
}

impl FrameConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripConfig {
    pub set: GripSet,
    /// Edge length of a grip marker in world units
    pub size: f32,
    /// Extra hit radius beyond the marker
    pub hit_padding: f32,
    #[serde(with = "hex_color")]
    pub color: Srgb<u8>,
    #[serde(with = "hex_color")]
    pub hover_color: Srgb<u8>,
    #[serde(with = "hex_color")]
    pub active_color: Srgb<u8>,
    pub opacity: f32,
}

impl Default for GripConfig {
    fn default() -> Self {
        Self {
            set: GripSet::All,
            size: 0.15,
            hit_padding: 0.05,
            color: Srgb::new(0xff, 0xff, 0xff),
            hover_color: Srgb::new(0x00, 0xaa, 0xff),
            active_color: Srgb::new(0xff, 0xff, 0x00),
            opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub policy: ResizePolicy,
    /// Falls back to the policy's own floor when unset
    pub min_size: Option<f32>,
}

impl ResizeConfig {
    pub fn min_size(&self) -> f32 {
        self.min_size
            .unwrap_or_else(|| self.policy.default_min_size())
    }
}

impl HandleConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame.duration_ms == 0 {
            return Err(invalid("frame.duration_ms", "must be greater than zero"));
        }
        if !(self.grips.size.is_finite() && self.grips.size > 0.0) {
            return Err(invalid("grips.size", "must be a positive number"));
        }
        if !(self.grips.hit_padding.is_finite() && self.grips.hit_padding >= 0.0) {
            return Err(invalid("grips.hit_padding", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.grips.opacity) {
            return Err(invalid("grips.opacity", "must be within 0 and 1"));
        }
        if let Some(min_size) = self.resize.min_size {
            if !(min_size.is_finite() && min_size >= 0.0) {
                return Err(invalid("resize.min_size", "must not be negative"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

/// Parses `#rrggbb` (or `rrggbb`, or the short `#rgb` form).
pub fn parse_hex_color(text: &str) -> Result<Srgb<u8>, ConfigError> {
    text.trim()
        .parse::<Srgb<u8>>()
        .map_err(|_| ConfigError::InvalidColor(text.to_string()))
}

pub fn format_hex_color(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

mod hex_color {
    use palette::Srgb;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Srgb<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hex_color(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Srgb<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_hex_color(&text).map_err(serde::de::Error::custom)
    }
}
