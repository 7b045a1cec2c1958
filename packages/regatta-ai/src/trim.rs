//! trim.rs - Sail trim controller
//!
//! Moves the sheeted sail angle toward the optimal angle for the apparent
//! wind, eased further by the navigator's forced luff, at a bounded rate.

use std::f64::consts::FRAC_PI_2;

use regatta_types::{bearing, normalize_angle, Tack, Vec2, WindSample};
use serde::{Deserialize, Serialize};

use crate::config::TrimConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SailTrimState {
    /// Sheet angle off the centerline, always ≥ 0
    pub manual_sail_angle: f64,
    /// Continuous in `[-1, 1]`; ±1 once the boom has settled on a side
    pub boom_side: f64,
    /// Signed sail angle, `manual_sail_angle · boom_side`
    pub sail_angle: f64,
}

impl Default for SailTrimState {
    fn default() -> Self {
        Self { manual_sail_angle: 0.0, boom_side: -1.0, sail_angle: 0.0 }
    }
}

pub struct SailTrimController {
    config: TrimConfig,
}

impl SailTrimController {
    pub fn new(config: &TrimConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    /// Advance the sheet one tick toward `optimal`, eased by `forced_luff`.
    pub fn step(&self, state: &mut SailTrimState, optimal: f64, forced_luff: f64, dt: f64) {
        let luff = if forced_luff.is_finite() { forced_luff.clamp(0.0, 1.0) } else { 0.0 };
        let target = optimal + luff * self.config.luff_offset_rad;
        if target.is_finite() && dt.is_finite() && dt > 0.0 {
            let max_step = self.config.max_rate * dt;
            let diff = target - state.manual_sail_angle;
            state.manual_sail_angle = if diff.abs() <= max_step {
                target
            } else {
                state.manual_sail_angle + max_step * diff.signum()
            };
        }
        state.sail_angle = state.manual_sail_angle * state.boom_side;
    }

    /// Swing the boom toward the leeward side for `heading` in this wind.
    pub fn update_boom_side(&self, state: &mut SailTrimState, heading: f64, wind_direction: f64, dt: f64) {
        let target = Tack::of(heading, wind_direction).boom_side();
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let max_step = self.config.boom_swing_rate * dt;
        let diff = target - state.boom_side;
        state.boom_side = if diff.abs() <= max_step {
            target
        } else {
            state.boom_side + max_step * diff.signum()
        };
        state.sail_angle = state.manual_sail_angle * state.boom_side;
    }
}

/// Best sheet angle for an apparent wind angle.
pub fn optimal_sail_angle(apparent_wind_angle: f64, cfg: &TrimConfig) -> f64 {
    (apparent_wind_angle.abs() - cfg.awa_offset_rad).clamp(0.0, FRAC_PI_2)
}

/// Apparent wind seen aboard a boat moving at `boat_velocity` (same units as
/// `wind.speed`). Returns the angle off the bow and the apparent speed.
pub fn apparent_wind(wind: WindSample, heading: f64, boat_velocity: Vec2) -> (f64, f64) {
    // air velocity relative to the boat
    let relative = wind.flow().sub(boat_velocity);
    let speed = relative.length();
    // the wind comes FROM the opposite of where the air moves
    match bearing(relative, Vec2::zero()) {
        Some(from) => (normalize_angle(from - heading), speed),
        None => (normalize_angle(wind.direction - heading), speed),
    }
}
