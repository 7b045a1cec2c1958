//! Strategic target selection: where the boat is trying to get to,
//! before any tack choice or avoidance is applied.

use regatta_types::{
    downwind_vector, heading_vector, BoatSnapshot, LegKind, RaceStatus, Vec2,
};

use super::start::{distance_behind_line, start_strategy};
use super::state::BoatTacticalState;
use super::RaceContext;
use crate::config::NavigatorConfig;

/// How far ahead a boat with no usable target aims along its own heading.
const STRAIGHT_AHEAD: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategicTarget {
    pub point: Vec2,
    pub speed_limit: f64,
}

impl StrategicTarget {
    pub fn new(point: Vec2, speed_limit: f64) -> Self {
        Self { point, speed_limit }
    }

    fn full_speed(point: Vec2) -> Self {
        Self::new(point, 1.0)
    }
}

pub(crate) fn strategic_target(
    boat: &BoatSnapshot,
    state: &BoatTacticalState,
    ctx: &RaceContext<'_>,
    wind_direction: f64,
    cfg: &NavigatorConfig,
) -> StrategicTarget {
    if boat.race.finished {
        return StrategicTarget::full_speed(finish_exit(boat, ctx, cfg));
    }

    match ctx.status {
        RaceStatus::Prestart => match ctx.course.start_line() {
            Some(line) => start_strategy(boat, state, line, wind_direction, ctx.time_to_start, &cfg.start),
            None => fallback(boat),
        },
        RaceStatus::Racing => racing_target(boat, state, ctx, wind_direction, cfg),
    }
}

fn racing_target(
    boat: &BoatSnapshot,
    state: &BoatTacticalState,
    ctx: &RaceContext<'_>,
    wind_direction: f64,
    cfg: &NavigatorConfig,
) -> StrategicTarget {
    let t = &cfg.targeting;
    let leg_index = boat.race.leg;
    let (Some(leg), Some((m1, m2))) = (ctx.course.leg(leg_index), ctx.course.gate(leg_index)) else {
        return fallback(boat);
    };

    if leg.kind == LegKind::Start {
        let line_point = m1.lerp(m2, state.start_line_percent);
        let behind = distance_behind_line(boat.position, line_point, wind_direction);
        if behind < -t.start_recover_margin {
            let dw = downwind_vector(wind_direction);
            return StrategicTarget::full_speed(line_point.add(dw.scale(t.start_recover_distance)));
        }
        return StrategicTarget::full_speed(line_point);
    }

    let mid = m1.midpoint(m2);

    if boat.race.is_rounding {
        let mark = if boat.position.dist_sq(m1) <= boat.position.dist_sq(m2) { m1 } else { m2 };
        let point = match mark.sub(mid).normalized() {
            Some(out) => mark.add(out.scale(t.rounding_offset)),
            None => mark,
        };
        return StrategicTarget::full_speed(point);
    }

    // Missed gate: already past it along the leg, come back round
    let forward = match leg.kind {
        LegKind::Upwind => Some(heading_vector(wind_direction)),
        LegKind::Downwind => Some(downwind_vector(wind_direction)),
        _ => None,
    };
    if let Some(fwd) = forward {
        if boat.position.sub(mid).dot(fwd) > t.missed_gate_margin {
            return StrategicTarget::full_speed(mid.sub(fwd.scale(t.missed_gate_retreat)));
        }
    }

    StrategicTarget::full_speed(mid)
}

/// Keep finished boats sailing clear of the course, out past the boundary.
fn finish_exit(boat: &BoatSnapshot, ctx: &RaceContext<'_>, cfg: &NavigatorConfig) -> Vec2 {
    let away = boat.position.add(Vec2::new(STRAIGHT_AHEAD, 0.0));
    let Some(boundary) = ctx.course.boundary else { return away };
    let radial = boat.position.sub(boundary.center);
    if radial.length() <= 0.1 {
        return away;
    }
    match radial.normalized() {
        Some(dir) => boundary.center.add(dir.scale(boundary.radius + cfg.targeting.finish_exit_margin)),
        None => away,
    }
}

/// Externally routed waypoint, or straight ahead when there is none.
fn fallback(boat: &BoatSnapshot) -> StrategicTarget {
    let point = boat
        .race
        .next_waypoint
        .filter(|w| w.is_finite())
        .unwrap_or_else(|| boat.position.add(boat.forward().scale(STRAIGHT_AHEAD)));
    StrategicTarget::full_speed(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindConfig;
    use crate::wind::WindField;
    use regatta_types::{BoatRaceState, Boundary, Course};

    fn course() -> Course {
        Course::windward_leeward(
            vec![
                Vec2::new(-100.0, 0.0),
                Vec2::new(100.0, 0.0),
                Vec2::new(-100.0, -2000.0),
                Vec2::new(100.0, -2000.0),
            ],
            Some(Boundary { center: Vec2::new(0.0, -1000.0), radius: 2000.0 }),
        )
    }

    fn boat(x: f64, y: f64, leg: usize) -> BoatSnapshot {
        BoatSnapshot {
            id: 1,
            position: Vec2::new(x, y),
            velocity: Vec2::zero(),
            heading: 0.0,
            speed: 2.0,
            boom_side: -1.0,
            race: BoatRaceState { leg, ..BoatRaceState::default() },
        }
    }

    fn target_for(boat: &BoatSnapshot, course: &Course, status: RaceStatus) -> StrategicTarget {
        let wind = WindField::new(&WindConfig::default());
        let ctx = RaceContext {
            status,
            clock: 0.0,
            time_to_start: 0.0,
            course,
            wind: &wind,
            fleet: &[],
        };
        let state = BoatTacticalState::new(0.5, 300.0, 0.0);
        strategic_target(boat, &state, &ctx, 0.0, &NavigatorConfig::default())
    }

    #[test]
    fn finished_boats_head_out_past_boundary() {
        let mut b = boat(0.0, 0.0, 5);
        b.race.finished = true;
        let t = target_for(&b, &course(), RaceStatus::Racing);
        // radial from (0,-1000) through (0,0), 2500 out
        assert!(t.point.dist(Vec2::new(0.0, 1500.0)) < 1e-6);

        // At the center there is no radial: sail off east
        let mut b = boat(0.0, -1000.0, 5);
        b.race.finished = true;
        let t = target_for(&b, &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(1000.0, -1000.0)) < 1e-9);
    }

    #[test]
    fn mid_leg_targets_gate_center() {
        let t = target_for(&boat(300.0, -800.0, 1), &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(0.0, -2000.0)) < 1e-9);
        assert_eq!(t.speed_limit, 1.0);
    }

    #[test]
    fn rounding_aims_outside_nearer_mark() {
        let mut b = boat(80.0, -1900.0, 1);
        b.race.is_rounding = true;
        let t = target_for(&b, &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(200.0, -2000.0)) < 1e-9);
    }

    #[test]
    fn missed_gate_retargets_behind_it() {
        // 100 past the windward gate on an upwind leg
        let t = target_for(&boat(0.0, -2100.0, 1), &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(0.0, -1800.0)) < 1e-6);

        // Downwind leg: past the leeward gate means further south
        let t = target_for(&boat(0.0, 100.0, 2), &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(0.0, -200.0)) < 1e-6);
    }

    #[test]
    fn start_leg_recovers_when_over_the_line() {
        let t = target_for(&boat(0.0, 200.0, 0), &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::zero()) < 1e-9);

        let t = target_for(&boat(0.0, -20.0, 0), &course(), RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(0.0, 150.0)) < 1e-6);
    }

    #[test]
    fn missing_marks_fall_back_to_waypoint() {
        let sparse = Course::windward_leeward(vec![Vec2::zero()], None);
        let mut b = boat(0.0, 0.0, 1);
        b.race.next_waypoint = Some(Vec2::new(500.0, 500.0));
        assert_eq!(target_for(&b, &sparse, RaceStatus::Racing).point, Vec2::new(500.0, 500.0));
        assert_eq!(target_for(&b, &sparse, RaceStatus::Prestart).point, Vec2::new(500.0, 500.0));

        // No waypoint either: straight ahead
        b.race.next_waypoint = None;
        let t = target_for(&b, &sparse, RaceStatus::Racing);
        assert!(t.point.dist(Vec2::new(0.0, -1000.0)) < 1e-9);
    }
}
