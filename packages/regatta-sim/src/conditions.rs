//! conditions.rs - Wind condition presets for the race harness
//!
//! A preset fixes the global wind character (speed, oscillation) and how
//! busy the course is with gusts and lulls. Selectable from config.toml
//! (`[conditions] preset = "SHIFTY"`) or `--conditions shifty`; any field
//! set alongside the preset in config.toml overrides it.

use clap::ValueEnum;
use regatta_ai::config::{WindConfig, WindPreset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionsPreset {
    /// Light air, few small puffs
    Light,
    /// Moderate breeze, gentle oscillation
    #[default]
    Steady,
    /// Big persistent oscillation, puffs carry strong shifts
    Shifty,
    /// Fresh breeze with a dense gust field
    Puffy,
}

/// `[conditions]` table as written in config.toml.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConditionsSection {
    pub preset: ConditionsPreset,
    pub base_speed: Option<f64>,
    pub puffiness: Option<f64>,
    pub puff_shiftiness: Option<f64>,
    pub gust_probability: Option<f64>,
}

impl ConditionsSection {
    pub fn resolve(&self) -> ConditionsConfig {
        let preset = ConditionsConfig::from_preset(self.preset);
        ConditionsConfig {
            base_speed: self.base_speed.unwrap_or(preset.base_speed),
            puffiness: self.puffiness.unwrap_or(preset.puffiness),
            puff_shiftiness: self.puff_shiftiness.unwrap_or(preset.puff_shiftiness),
            gust_probability: self.gust_probability.unwrap_or(preset.gust_probability),
            ..preset
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionsConfig {
    pub preset: ConditionsPreset,
    /// Knots
    pub base_speed: f64,
    pub wind_preset: WindPreset,
    /// 0–1: zone count (5 + 20·puffiness) and zone size
    pub puffiness: f64,
    /// 0–1: direction shift carried inside each zone
    pub puff_shiftiness: f64,
    /// Probability a new zone is a gust rather than a lull
    pub gust_probability: f64,
}

impl ConditionsConfig {
    pub fn from_preset(preset: ConditionsPreset) -> Self {
        let (base_speed, wind_preset, puffiness, puff_shiftiness, gust_probability) = match preset {
            ConditionsPreset::Light => (7.0, WindPreset::Steady, 0.2, 0.2, 0.4),
            ConditionsPreset::Steady => (12.0, WindPreset::Steady, 0.25, 0.3, 0.5),
            ConditionsPreset::Shifty => (12.0, WindPreset::Shifty, 0.4, 0.9, 0.5),
            ConditionsPreset::Puffy => (15.0, WindPreset::Normal, 1.0, 0.5, 0.65),
        };
        Self { preset, base_speed, wind_preset, puffiness, puff_shiftiness, gust_probability }
    }

    /// Target number of live zones.
    pub fn zone_density(&self) -> usize {
        5 + (self.puffiness.clamp(0.0, 1.0) * 20.0).floor() as usize
    }

    /// Global wind settings with this preset's speed and oscillation.
    pub fn apply(&self, base: &WindConfig) -> WindConfig {
        WindConfig {
            base_speed: self.base_speed,
            preset: self.wind_preset,
            ..base.clone()
        }
    }
}
