//! Steering bias away from the boundary, other boats and marks.
//!
//! Each source adds a signed angular correction to the desired heading.
//! The sum is hard-clamped so avoidance can bend a course but never
//! reverse it outright.

use regatta_types::{bearing, normalize_angle, side_of, BoatSnapshot, Course};

use super::RaceContext;
use crate::config::AvoidanceConfig;
use crate::rules::RightOfWayEngine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringBias {
    /// Clamped angular correction, radians
    pub angle: f64,
    /// Upper bound on the speed limit imposed by a close crossing
    pub speed_cap: f64,
}

pub(crate) fn steering_bias(
    boat: &BoatSnapshot,
    desired: f64,
    ctx: &RaceContext<'_>,
    rules: &mut RightOfWayEngine,
    wind_direction: f64,
    cfg: &AvoidanceConfig,
    max_bias: f64,
) -> SteeringBias {
    let mut speed_cap = 1.0;
    let raw = boundary_bias(boat, desired, ctx.course, cfg)
        + boat_bias(boat, desired, ctx, rules, wind_direction, cfg, &mut speed_cap)
        + mark_bias(boat, desired, ctx.course, cfg);
    let angle = if raw.is_finite() { raw.clamp(-max_bias, max_bias) } else { 0.0 };
    SteeringBias { angle, speed_cap }
}

/// Cubic ramp toward the center once inside the margin band. Saturates at
/// the bearing to the center so a boat deep outside never turns past it.
fn boundary_bias(boat: &BoatSnapshot, desired: f64, course: &Course, cfg: &AvoidanceConfig) -> f64 {
    let Some(boundary) = course.boundary else { return 0.0 };
    let depth = boat.position.dist(boundary.center) - (boundary.radius - cfg.boundary_margin);
    if depth <= 0.0 {
        return 0.0;
    }
    let Some(to_center) = bearing(boat.position, boundary.center) else { return 0.0 };
    let strength = ((depth / cfg.boundary_margin).powi(3) * cfg.boundary_gain).min(1.0);
    normalize_angle(to_center - desired) * strength
}

fn boat_bias(
    boat: &BoatSnapshot,
    desired: f64,
    ctx: &RaceContext<'_>,
    rules: &mut RightOfWayEngine,
    wind_direction: f64,
    cfg: &AvoidanceConfig,
    speed_cap: &mut f64,
) -> f64 {
    let detect_sq = cfg.detection_radius * cfg.detection_radius;
    let mut nearby: Vec<(&BoatSnapshot, f64)> = ctx
        .fleet
        .iter()
        .filter(|o| o.id != boat.id && !o.race.finished)
        .map(|o| (o, o.position.dist_sq(boat.position)))
        .filter(|(_, d_sq)| *d_sq < detect_sq)
        .collect();
    nearby.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut bias = 0.0;
    for (other, d_sq) in nearby.into_iter().take(cfg.max_boats) {
        if !rules.is_conflict_soon(boat, other) {
            continue;
        }
        let Some(decision) = rules.evaluate(boat, other, ctx.course, wind_direction) else {
            continue;
        };
        let Some(to_other) = bearing(boat.position, other.position) else { continue };
        let dist = d_sq.sqrt();

        if decision.holds_right_of_way(boat.id) {
            if dist < cfg.nudge_range {
                bias += side_of(normalize_angle(desired - to_other)) * cfg.nudge_gain;
            }
            continue;
        }

        // Keep clear: aim for open water behind the other boat's stern
        let behind = other.forward().scale(cfg.stern_offset + cfg.safe_offset);
        let Some(to_safe) = bearing(boat.position, other.position.sub(behind)) else { continue };
        let urgency = (cfg.urgency_scale / dist).min(cfg.urgency_max);
        bias += normalize_angle(to_safe - desired) * urgency;

        if dist < cfg.bow_on_range && normalize_angle(boat.heading - to_other).abs() < cfg.bow_on_angle_rad {
            *speed_cap = speed_cap.min(cfg.bow_on_speed_limit);
        }
    }
    bias
}

/// Push off every mark inside the avoidance radius.
fn mark_bias(boat: &BoatSnapshot, desired: f64, course: &Course, cfg: &AvoidanceConfig) -> f64 {
    course
        .marks
        .iter()
        .filter_map(|mark| {
            let d = boat.position.dist(*mark);
            if d >= cfg.mark_radius {
                return None;
            }
            let to_mark = bearing(boat.position, *mark)?;
            Some(side_of(normalize_angle(desired - to_mark)) * (1.0 - d / cfg.mark_radius) * cfg.mark_gain)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RulesConfig, WindConfig};
    use crate::wind::WindField;
    use regatta_types::{BoatRaceState, Boundary, RaceStatus, Tack, Vec2};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn boat(id: u32, x: f64, y: f64, heading: f64, tack: Tack) -> BoatSnapshot {
        BoatSnapshot {
            id,
            position: Vec2::new(x, y),
            velocity: regatta_types::heading_vector(heading).scale(60.0),
            heading,
            speed: 2.0,
            boom_side: tack.boom_side(),
            race: BoatRaceState { leg: 1, ..BoatRaceState::default() },
        }
    }

    fn bias_for(me: &BoatSnapshot, desired: f64, fleet: &[BoatSnapshot], course: &Course) -> SteeringBias {
        let wind = WindField::new(&WindConfig::default());
        let ctx = RaceContext {
            status: RaceStatus::Racing,
            clock: 0.0,
            time_to_start: 0.0,
            course,
            wind: &wind,
            fleet,
        };
        let mut rules = RightOfWayEngine::new(&RulesConfig::default());
        steering_bias(me, desired, &ctx, &mut rules, 0.0, &AvoidanceConfig::default(), 2.0 * std::f64::consts::PI / 3.0)
    }

    #[test]
    fn open_water_has_no_bias() {
        let me = boat(1, 0.0, 0.0, 0.0, Tack::Starboard);
        let b = bias_for(&me, 0.3, &[me], &Course::default());
        assert_eq!(b, SteeringBias { angle: 0.0, speed_cap: 1.0 });
    }

    #[test]
    fn port_boat_ducks_behind_starboard_boat() {
        // Port tack heading NE, starboard boat crossing ahead heading NW
        let me = boat(1, 0.0, 0.0, FRAC_PI_4, Tack::Port);
        let other = boat(2, 100.0, -100.0, -FRAC_PI_4, Tack::Starboard);
        let b = bias_for(&me, FRAC_PI_4, &[me, other], &Course::default());
        // bears away to pass astern (clockwise)
        assert!(b.angle > 0.0, "bias {}", b.angle);
        // dead ahead within 150: slow down
        assert_eq!(b.speed_cap, 0.4);
    }

    #[test]
    fn starboard_boat_only_nudges_when_very_close() {
        let me = boat(1, 100.0, -100.0, -FRAC_PI_4, Tack::Starboard);
        let far = boat(2, 0.0, 0.0, FRAC_PI_4, Tack::Port);
        let b = bias_for(&me, -FRAC_PI_4, &[me, far], &Course::default());
        assert_eq!(b.angle, 0.0);

        let near = boat(2, 50.0, -50.0, FRAC_PI_4, Tack::Port);
        let b = bias_for(&me, -FRAC_PI_4, &[me, near], &Course::default());
        assert!((b.angle.abs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn finished_boats_are_ignored() {
        let me = boat(1, 0.0, 0.0, FRAC_PI_4, Tack::Port);
        let mut other = boat(2, 100.0, -100.0, -FRAC_PI_4, Tack::Starboard);
        other.race.finished = true;
        let b = bias_for(&me, FRAC_PI_4, &[me, other], &Course::default());
        assert_eq!(b.angle, 0.0);
    }

    #[test]
    fn boundary_pulls_toward_center_and_clamps() {
        let course = Course { boundary: Some(Boundary { center: Vec2::zero(), radius: 1000.0 }), ..Course::default() };
        let me = boat(1, 990.0, 0.0, FRAC_PI_2, Tack::Port);
        // heading straight out: bias swings back toward the center
        let b = bias_for(&me, FRAC_PI_2, &[me], &course);
        assert!((b.angle.abs() - 2.0 * std::f64::consts::PI / 3.0).abs() < 1e-9);

        let inside = boat(1, 400.0, 0.0, FRAC_PI_2, Tack::Port);
        assert_eq!(bias_for(&inside, FRAC_PI_2, &[inside], &course).angle, 0.0);
    }

    #[test]
    fn deep_outside_boundary_steers_straight_at_center() {
        let course = Course { boundary: Some(Boundary { center: Vec2::zero(), radius: 1000.0 }), ..Course::default() };
        let me = boat(1, 1500.0, 0.0, 0.0, Tack::Starboard);
        let b = bias_for(&me, 0.0, &[me], &course);
        // center is due west: the corrected heading lands on it, not beyond
        assert!((b.angle + FRAC_PI_2).abs() < 1e-9, "bias {}", b.angle);

        let shallow = boat(1, 600.0, 0.0, 0.0, Tack::Starboard);
        let b = bias_for(&shallow, 0.0, &[shallow], &course);
        assert!(b.angle < 0.0 && b.angle > -FRAC_PI_2 * 0.1, "bias {}", b.angle);
    }

    #[test]
    fn marks_push_away() {
        let course = Course { marks: vec![Vec2::new(10.0, -75.0)], ..Course::default() };
        let me = boat(1, 0.0, 0.0, 0.0, Tack::Starboard);
        // mark just right of the bow: push left
        let b = bias_for(&me, 0.0, &[me], &course);
        assert!(b.angle < 0.0);
        assert!(b.angle > -2.5);
    }
}
