//! navigator - Per-boat, per-tick tactical decisions
//!
//! Each tick runs phase → target → mode → tack decision → avoidance →
//! rate-limited turn, and returns an immutable [`NavigationDecision`].
//! The only memory is the caller-owned [`BoatTacticalState`] plus the
//! right-of-way latch table owned by the navigator.
//!
//! Ordering within a tick: step the wind field first, snapshot the whole
//! fleet, then call [`Navigator::step`] for each AI boat in a stable order.

pub mod avoidance;
pub mod decision;
pub mod start;
pub mod state;
pub mod tactics;
pub mod targeting;

use regatta_types::{bearing, normalize_angle, side_of, BoatSnapshot, Course, RaceStatus};
use tracing::{debug, trace};

use crate::config::{NavigatorConfig, TacticsConfig};
use crate::rules::RightOfWayEngine;
use crate::wind::WindField;

pub use decision::{Maneuver, NavigationDecision, SailingMode};
pub use state::BoatTacticalState;
pub use targeting::StrategicTarget;

/// Everything a navigator may read about the race this tick.
pub struct RaceContext<'a> {
    pub status: RaceStatus,
    /// Seconds of simulated time, drives the global wind
    pub clock: f64,
    /// Seconds until the start signal (≤ 0 once racing)
    pub time_to_start: f64,
    pub course: &'a Course,
    pub wind: &'a WindField,
    /// Snapshots of every boat, taken before any navigator ran this tick
    pub fleet: &'a [BoatSnapshot],
}

pub struct Navigator {
    config: NavigatorConfig,
    rules: RightOfWayEngine,
}

impl Navigator {
    pub fn new(config: &TacticsConfig) -> Self {
        Self {
            config: config.navigator.clone(),
            rules: RightOfWayEngine::new(&config.rules),
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn rules(&self) -> &RightOfWayEngine {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RightOfWayEngine {
        &mut self.rules
    }

    /// Decide this tick's heading and speed limit for one boat.
    pub fn step(
        &mut self,
        state: &mut BoatTacticalState,
        boat: &BoatSnapshot,
        dt: f64,
        ctx: &RaceContext<'_>,
    ) -> NavigationDecision {
        let Self { config: cfg, rules } = self;
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        state.decay_cooldown(dt);

        let local = ctx.wind.local_wind(boat.position, ctx.clock);
        let global = ctx.wind.global_wind(ctx.clock);
        if !local.is_valid() || !global.is_valid() {
            debug!("boat {}: no usable wind, holding heading", boat.id);
            return hold(state, boat, dt, cfg);
        }
        let wind = local.direction;

        let target = targeting::strategic_target(boat, state, ctx, global.direction, cfg);
        let mut speed_limit = target.speed_limit;
        let to_target = bearing(boat.position, target.point).unwrap_or(boat.heading);

        let classified = tactics::classify(to_target - wind, cfg);
        let racing = ctx.status == RaceStatus::Racing && !boat.race.finished;
        let mode = if racing {
            ctx.course
                .leg(boat.race.leg)
                .and_then(|leg| tactics::leg_override(leg.kind))
                .unwrap_or(classified)
        } else {
            classified
        };

        let recovering = update_recovery(state, boat, dt, ctx.status, wind, cfg);
        // a boat stalled mid-tack escapes onto the tack it was turning to
        let side = state.sailing_tack(boat.heading, wind).boom_side();
        let in_irons = racing
            && boat.speed < cfg.irons_speed
            && normalize_angle(boat.heading - wind).abs() < cfg.irons_angle_rad;

        let (desired, maneuver) = if recovering {
            (state.recovery_target, Maneuver::Recovering)
        } else if in_irons {
            (normalize_angle(wind + side * cfg.irons_escape_rad), Maneuver::EscapingIrons)
        } else {
            tactics::choose_heading(
                boat,
                state,
                wind,
                to_target,
                mode,
                classified,
                ctx.course.boundary.as_ref(),
                cfg,
            )
        };

        let target_heading = if recovering {
            speed_limit = 1.0;
            desired
        } else {
            let bias = avoidance::steering_bias(
                boat,
                desired,
                ctx,
                rules,
                global.direction,
                &cfg.avoidance,
                cfg.max_bias_rad,
            );
            speed_limit = speed_limit.min(bias.speed_cap);
            out_of_no_go(normalize_angle(desired + bias.angle), desired, wind, cfg.no_go_rad)
        };
        state.target_heading = target_heading;

        let heading = turn_toward(boat.heading, target_heading, cfg.max_turn_rate * dt);
        let forced_luff = forced_luff(speed_limit, cfg.luff_threshold);
        state.forced_luff = forced_luff;
        let spinnaker = normalize_angle(wind - heading).abs() > cfg.spinnaker_angle_rad
            && speed_limit > cfg.spinnaker_min_speed_limit;

        trace!(
            "boat {} {:?} {:?} target=({:.0},{:.0}) hdg {:.2}→{:.2} limit={:.2}",
            boat.id, mode, maneuver, target.point.x, target.point.y, heading, target_heading, speed_limit
        );

        NavigationDecision {
            heading,
            target_heading,
            target: target.point,
            speed_limit,
            forced_luff,
            spinnaker,
            mode,
            maneuver,
        }
    }
}

/// Track time spent nearly stopped and switch into or out of recovery.
/// Returns whether the boat is recovering this tick.
fn update_recovery(
    state: &mut BoatTacticalState,
    boat: &BoatSnapshot,
    dt: f64,
    status: RaceStatus,
    wind_direction: f64,
    cfg: &NavigatorConfig,
) -> bool {
    if boat.race.finished {
        state.recovery_mode = false;
        state.stuck_timer = 0.0;
        return false;
    }

    if boat.speed < cfg.stuck_speed {
        state.stuck_timer += dt;
    } else {
        state.stuck_timer = (state.stuck_timer - dt).max(0.0);
    }

    let threshold = match status {
        RaceStatus::Racing => cfg.stuck_time_racing_s,
        RaceStatus::Prestart => cfg.stuck_time_prestart_s,
    };
    if state.stuck_timer > threshold && !state.recovery_mode {
        let side = side_of(normalize_angle(boat.heading - wind_direction));
        state.recovery_mode = true;
        state.committed_tack = None;
        state.recovery_target = normalize_angle(wind_direction + side * cfg.recovery_offset_rad);
        debug!("🆘 boat {} stuck for {:.1}s, recovering on {:.2}", boat.id, state.stuck_timer, state.recovery_target);
    }

    if state.recovery_mode {
        if boat.speed > cfg.recovery_exit_speed {
            state.recovery_mode = false;
            state.stuck_timer = 0.0;
            debug!("boat {} recovered", boat.id);
            return false;
        }
        return true;
    }
    false
}

/// Wind reading unusable: keep turning toward the last target heading.
fn hold(state: &mut BoatTacticalState, boat: &BoatSnapshot, dt: f64, cfg: &NavigatorConfig) -> NavigationDecision {
    if !state.target_heading.is_finite() {
        state.target_heading = boat.heading;
    }
    state.forced_luff = 0.0;
    NavigationDecision {
        heading: turn_toward(boat.heading, state.target_heading, cfg.max_turn_rate * dt),
        target_heading: state.target_heading,
        target: boat.position,
        speed_limit: 1.0,
        forced_luff: 0.0,
        spinnaker: false,
        mode: SailingMode::Reach,
        maneuver: Maneuver::Hold,
    }
}

/// Rotate `current` toward `target` by at most `max_step`, snapping when close.
pub fn turn_toward(current: f64, target: f64, max_step: f64) -> f64 {
    let diff = normalize_angle(target - current);
    if !diff.is_finite() {
        return current;
    }
    if diff.abs() <= max_step {
        normalize_angle(target)
    } else {
        normalize_angle(current + max_step * diff.signum())
    }
}

/// Avoidance may bend a sailing course but not into the no-go zone: a
/// corrected heading that lands there is held on the edge, on the side of
/// the wind `desired` was on.
fn out_of_no_go(corrected: f64, desired: f64, wind_direction: f64, no_go: f64) -> f64 {
    let off_desired = normalize_angle(desired - wind_direction);
    if off_desired.abs() < no_go || normalize_angle(corrected - wind_direction).abs() >= no_go {
        return corrected;
    }
    normalize_angle(wind_direction + side_of(off_desired) * no_go)
}

/// Shortfall below `threshold` becomes forced luff in `[0, 1]`.
pub fn forced_luff(speed_limit: f64, threshold: f64) -> f64 {
    if speed_limit < threshold {
        (1.0 - speed_limit).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn turn_never_exceeds_rate(
            current in -10.0f64..10.0,
            target in -10.0f64..10.0,
            rate in 0.01f64..2.0,
            dt in 0.001f64..0.5,
        ) {
            let next = turn_toward(current, target, rate * dt);
            let moved = normalize_angle(next - current).abs();
            prop_assert!(moved <= rate * dt + 1e-9);
        }

        #[test]
        fn forced_luff_stays_in_unit_range(limit in -2.0f64..3.0) {
            let luff = forced_luff(limit, 0.9);
            prop_assert!((0.0..=1.0).contains(&luff));
        }
    }

    #[test]
    fn turn_snaps_when_within_one_step() {
        assert!((turn_toward(0.1, 0.12, 0.05) - 0.12).abs() < 1e-12);
        assert!((turn_toward(0.0, 1.0, 0.1) - 0.1).abs() < 1e-12);
        // shortest way round through ±π
        assert!((turn_toward(3.0, -3.0, 0.1) - 3.1).abs() < 1e-12);
    }

    #[test]
    fn avoidance_cannot_steer_into_irons() {
        let no_go = 0.75;
        // starboard close-hauled, bias swings toward dead upwind
        assert!((out_of_no_go(-0.2, -0.8, 0.0, no_go) + no_go).abs() < 1e-12);
        // bias swinging through the wind onto the other side
        assert!((out_of_no_go(0.3, -0.8, 0.0, no_go) + no_go).abs() < 1e-12);
        // bearing away is untouched
        assert_eq!(out_of_no_go(-1.4, -0.8, 0.0, no_go), -1.4);
        // an irons-escape or prestart heading already inside is left alone
        assert_eq!(out_of_no_go(0.1, 0.2, 0.0, no_go), 0.1);
    }

    #[test]
    fn luff_follows_speed_limit() {
        assert_eq!(forced_luff(1.0, 0.9), 0.0);
        assert_eq!(forced_luff(0.9, 0.9), 0.0);
        assert!((forced_luff(0.4, 0.9) - 0.6).abs() < 1e-12);
        assert_eq!(forced_luff(0.0, 0.9), 1.0);
    }
}
