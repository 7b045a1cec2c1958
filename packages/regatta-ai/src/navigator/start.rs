//! Prestart positioning: hold station behind a chosen spot on the line,
//! then time the run so the bow reaches the line at the gun.

use regatta_types::{downwind_vector, BoatSnapshot, Vec2};

use super::state::BoatTacticalState;
use super::targeting::StrategicTarget;
use crate::config::StartConfig;

/// Signed distance from the line point along the downwind axis.
/// Positive on the prestart side, negative when over the line.
pub fn distance_behind_line(position: Vec2, line_point: Vec2, wind_direction: f64) -> f64 {
    position.sub(line_point).dot(downwind_vector(wind_direction))
}

pub(crate) fn start_strategy(
    boat: &BoatSnapshot,
    state: &BoatTacticalState,
    line: (Vec2, Vec2),
    wind_direction: f64,
    time_to_start: f64,
    cfg: &StartConfig,
) -> StrategicTarget {
    let line_point = line.0.lerp(line.1, state.start_line_percent);
    let dw = downwind_vector(wind_direction);
    let behind = distance_behind_line(boat.position, line_point, wind_direction);

    let mut target = if time_to_start > cfg.hold_time_s {
        let speed_limit = if behind < state.setup_distance - cfg.hold_slow_margin {
            cfg.hold_speed_limit
        } else {
            1.0
        };
        StrategicTarget::new(line_point.add(dw.scale(state.setup_distance)), speed_limit)
    } else {
        let dist = boat.position.dist(line_point);
        let time_to_run = dist / (boat.velocity.length() + 0.1);
        let speed_limit = if time_to_run < time_to_start - cfg.early_margin_s {
            cfg.early_speed_limit
        } else {
            1.0
        };
        StrategicTarget::new(line_point, speed_limit)
    };

    // Too close with time left: stop and back off rather than cross early
    if behind < cfg.ocs_guard_distance && time_to_start > cfg.ocs_guard_time_s {
        target = StrategicTarget::new(line_point.add(dw.scale(cfg.ocs_retreat)), 0.0);
    }
    target
}
