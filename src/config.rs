//! Chip configuration
//!
//! Host-side settings that are not part of the register map. Loaded from JSON
//! or built in code, then checked with [`ChipConfig::validate`].

use crate::soundchip::DEFAULT_SAMPLE_RATE;
use crate::{Result, SoundChipError};
use serde::{Deserialize, Serialize};

/// Lowest supported output rate
pub const MIN_SAMPLE_RATE: u32 = 8_000;
/// Highest supported output rate
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Host configuration for a [`SoundChip`](crate::SoundChip)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Gain applied after the channel mix, before overdrive
    pub master_gain: f32,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            master_gain: 1.0,
        }
    }
}

impl ChipConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChipConfig = serde_json::from_str(json)
            .map_err(|e| SoundChipError::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SoundChipError::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Check that every field is in its supported range
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(SoundChipError::ConfigError(format!(
                "sample rate {} Hz outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
                self.sample_rate
            )));
        }
        if !self.master_gain.is_finite() || self.master_gain < 0.0 {
            return Err(SoundChipError::ConfigError(format!(
                "master gain must be finite and non-negative, got {}",
                self.master_gain
            )));
        }
        Ok(())
    }
}
