//! config.rs - Named tunables for the wind field, rules, navigator and trim
//!
//! Every constant the AI steers by lives here with its tuned default.
//! All sections deserialize from TOML with `#[serde(default)]`, so a config
//! file only needs the keys it overrides:
//!
//! ```toml
//! [navigator]
//! max_turn_rate = 0.4
//!
//! [navigator.avoidance]
//! detection_radius = 250.0
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    pub wind: WindConfig,
    pub rules: RulesConfig,
    pub navigator: NavigatorConfig,
    pub trim: TrimConfig,
}

impl TacticsConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: TacticsConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject tunables that would make the per-tick math meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.wind;
        if !(w.base_speed >= 0.0) {
            return Err(ConfigError::invalid("wind.base_speed", "must be >= 0"));
        }
        if !(w.min_speed <= w.max_speed) {
            return Err(ConfigError::invalid(
                "wind.min_speed",
                format!("{} exceeds max_speed {}", w.min_speed, w.max_speed),
            ));
        }
        if !(w.fade_window_s > 0.0) {
            return Err(ConfigError::invalid("wind.fade_window_s", "must be > 0"));
        }
        if !(self.rules.zone_radius > 0.0) {
            return Err(ConfigError::invalid("rules.zone_radius", "must be > 0"));
        }

        let n = &self.navigator;
        if !(n.max_turn_rate > 0.0) {
            return Err(ConfigError::invalid("navigator.max_turn_rate", "must be > 0"));
        }
        if !(n.tack_cooldown_s >= 0.0) {
            return Err(ConfigError::invalid("navigator.tack_cooldown_s", "must be >= 0"));
        }
        for (field, twa) in [
            ("navigator.upwind_twa_deg", n.upwind_twa_deg),
            ("navigator.downwind_twa_deg", n.downwind_twa_deg),
        ] {
            if !(twa > 0.0 && twa < 180.0) {
                return Err(ConfigError::invalid(field, format!("{twa} not in (0, 180)")));
            }
        }
        if !(n.max_bias_rad > 0.0 && n.max_bias_rad <= PI) {
            return Err(ConfigError::invalid("navigator.max_bias_rad", "must be in (0, π]"));
        }

        let s = &n.start;
        if !(0.0..=1.0).contains(&s.line_percent_min)
            || !(0.0..=1.0).contains(&s.line_percent_max)
            || s.line_percent_min > s.line_percent_max
        {
            return Err(ConfigError::invalid(
                "navigator.start.line_percent_min",
                "line percent range must be ordered within [0, 1]",
            ));
        }
        if !(s.setup_distance_min <= s.setup_distance_max) {
            return Err(ConfigError::invalid(
                "navigator.start.setup_distance_min",
                "exceeds setup_distance_max",
            ));
        }

        if !(self.trim.max_rate > 0.0) {
            return Err(ConfigError::invalid("trim.max_rate", "must be > 0"));
        }
        Ok(())
    }
}

// ── Wind ──────────────────────────────────────────────────────────────────────

/// Oscillation character of the global wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindPreset {
    Steady,
    #[default]
    Normal,
    Shifty,
}

impl WindPreset {
    /// (shift amplitude in degrees, shift period in seconds)
    pub fn oscillation(self) -> (f64, f64) {
        match self {
            WindPreset::Steady => (4.0, 90.0),
            WindPreset::Normal => (10.0, 60.0),
            WindPreset::Shifty => (18.0, 45.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub base_direction_deg: f64,
    pub base_speed: f64,
    pub preset: WindPreset,
    /// Small fractal wobble on top of the preset shift
    pub jitter_deg: f64,
    /// Slow speed surge amplitude
    pub surge: f64,
    /// Fractal speed noise amplitude
    pub speed_noise: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Fade-in and fade-out window of a perturbation zone
    pub fade_window_s: f64,
    /// Smallest effective radius of a zone early or late in its life
    pub min_zone_radius: f64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            base_direction_deg: 0.0,
            base_speed: 12.0,
            preset: WindPreset::Normal,
            jitter_deg: 3.0,
            surge: 2.0,
            speed_noise: 1.5,
            min_speed: 5.0,
            max_speed: 25.0,
            fade_window_s: 5.0,
            min_zone_radius: 10.0,
        }
    }
}

// ── Rules ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Mark zone radius (about three hull lengths)
    pub zone_radius: f64,
    /// Separation that always counts as a conflict
    pub conflict_range: f64,
    /// Closest-approach distance that counts as a conflict
    pub cpa_range: f64,
    /// How far ahead a closest approach is considered, seconds
    pub cpa_horizon_s: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            zone_radius: 165.0,
            conflict_range: 80.0,
            cpa_range: 120.0,
            cpa_horizon_s: 10.0,
        }
    }
}

// ── Navigator ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// rad/s (0.01 rad per 60 Hz frame, scaled 0.8 for AI boats)
    pub max_turn_rate: f64,

    // Mode classification
    pub no_go_rad: f64,
    pub downwind_cone_rad: f64,

    // Tack / gybe
    pub upwind_twa_deg: f64,
    pub downwind_twa_deg: f64,
    /// VMG gain a swap must beat the current tack by
    pub swap_margin: f64,
    /// Subtracted from `swap_margin` once outside the layline
    pub layline_relief: f64,
    /// Bearing-to-target off the wind beyond which an upwind boat is outside the layline
    pub upwind_layline_deg: f64,
    /// Bearing-to-target off the wind below which a downwind boat is outside the layline
    pub downwind_layline_deg: f64,
    pub swap_min_speed: f64,
    pub swap_min_speed_outside_layline: f64,
    pub tack_cooldown_s: f64,
    /// Distance inside the boundary where a heading outward forces a swap
    pub boundary_exit_margin: f64,

    // Stuck / recovery
    pub stuck_speed: f64,
    pub stuck_time_racing_s: f64,
    pub stuck_time_prestart_s: f64,
    pub recovery_exit_speed: f64,
    pub recovery_offset_rad: f64,

    // In irons
    pub irons_speed: f64,
    pub irons_angle_rad: f64,
    pub irons_escape_rad: f64,

    // Steering bias
    pub max_bias_rad: f64,

    // Outputs
    /// Speed limits below this turn into forced luff
    pub luff_threshold: f64,
    pub spinnaker_angle_rad: f64,
    pub spinnaker_min_speed_limit: f64,

    pub targeting: TargetingConfig,
    pub start: StartConfig,
    pub avoidance: AvoidanceConfig,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_turn_rate: 0.01 * 60.0 * 0.8,
            no_go_rad: PI / 4.2,
            downwind_cone_rad: PI * 0.75,
            upwind_twa_deg: 45.0,
            downwind_twa_deg: 150.0,
            swap_margin: 0.15,
            layline_relief: 0.5,
            upwind_layline_deg: 50.0,
            downwind_layline_deg: 140.0,
            swap_min_speed: 1.5,
            swap_min_speed_outside_layline: 1.0,
            tack_cooldown_s: 10.0,
            boundary_exit_margin: 200.0,
            stuck_speed: 0.25,
            stuck_time_racing_s: 4.0,
            stuck_time_prestart_s: 6.0,
            recovery_exit_speed: 1.0,
            recovery_offset_rad: 1.6,
            irons_speed: 1.0,
            irons_angle_rad: 0.6,
            irons_escape_rad: 1.05,
            max_bias_rad: PI / 1.5,
            luff_threshold: 0.9,
            spinnaker_angle_rad: PI * 0.6,
            spinnaker_min_speed_limit: 0.8,
            targeting: TargetingConfig::default(),
            start: StartConfig::default(),
            avoidance: AvoidanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Finished boats head this far beyond the boundary
    pub finish_exit_margin: f64,
    pub rounding_offset: f64,
    pub missed_gate_margin: f64,
    pub missed_gate_retreat: f64,
    /// Distance past the start line that counts as over it
    pub start_recover_margin: f64,
    pub start_recover_distance: f64,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            finish_exit_margin: 500.0,
            rounding_offset: 100.0,
            missed_gate_margin: 50.0,
            missed_gate_retreat: 200.0,
            start_recover_margin: 5.0,
            start_recover_distance: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    /// Time-to-start above which boats hold station behind the line
    pub hold_time_s: f64,
    /// Slow to `hold_speed_limit` when this much closer than the hold point
    pub hold_slow_margin: f64,
    pub hold_speed_limit: f64,
    /// Slack between time-to-run and time remaining before slowing down
    pub early_margin_s: f64,
    pub early_speed_limit: f64,
    pub ocs_guard_distance: f64,
    pub ocs_guard_time_s: f64,
    pub ocs_retreat: f64,
    pub line_percent_min: f64,
    pub line_percent_max: f64,
    pub setup_distance_min: f64,
    pub setup_distance_max: f64,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            hold_time_s: 10.0,
            hold_slow_margin: 20.0,
            hold_speed_limit: 0.1,
            early_margin_s: 1.0,
            early_speed_limit: 0.2,
            ocs_guard_distance: 10.0,
            ocs_guard_time_s: 0.5,
            ocs_retreat: 50.0,
            line_percent_min: 0.1,
            line_percent_max: 0.9,
            setup_distance_min: 250.0,
            setup_distance_max: 350.0,
        }
    }
}

/// Steering-bias constants. Empirically tuned; treat as flavour, not physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    pub boundary_margin: f64,
    pub boundary_gain: f64,
    pub detection_radius: f64,
    pub max_boats: usize,
    /// Right-of-way boats only nudge inside this range
    pub nudge_range: f64,
    pub nudge_gain: f64,
    /// Distance behind the other boat's position where its stern sits
    pub stern_offset: f64,
    /// Extra clearance behind the stern
    pub safe_offset: f64,
    pub urgency_scale: f64,
    pub urgency_max: f64,
    pub bow_on_range: f64,
    pub bow_on_angle_rad: f64,
    pub bow_on_speed_limit: f64,
    pub mark_radius: f64,
    pub mark_gain: f64,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            boundary_margin: 500.0,
            boundary_gain: 4.0,
            detection_radius: 300.0,
            max_boats: 2,
            nudge_range: 80.0,
            nudge_gain: 2.0,
            stern_offset: 50.0,
            safe_offset: 80.0,
            urgency_scale: 300.0,
            urgency_max: 2.0,
            bow_on_range: 150.0,
            bow_on_angle_rad: 0.5,
            bow_on_speed_limit: 0.4,
            mark_radius: 150.0,
            mark_gain: 2.5,
        }
    }
}

// ── Trim ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// rad/s
    pub max_rate: f64,
    /// Extra sheet eased at full forced luff
    pub luff_offset_rad: f64,
    /// Sail angle lags the apparent wind angle by this much
    pub awa_offset_rad: f64,
    /// Boom travel per second while gybing or tacking (full side = 1.0)
    pub boom_swing_rate: f64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            max_rate: 1.0,
            luff_offset_rad: PI / 2.0,
            awa_offset_rad: 0.4,
            boom_swing_rate: 6.0,
        }
    }
}
