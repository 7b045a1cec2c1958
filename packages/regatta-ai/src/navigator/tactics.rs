//! Sailing-mode classification and the tack/gybe decision.

use regatta_types::{heading_vector, normalize_angle, BoatSnapshot, Boundary, LegKind, Tack};
use tracing::debug;

use super::decision::{Maneuver, SailingMode};
use super::state::BoatTacticalState;
use crate::config::NavigatorConfig;

/// Classify a bearing-to-target measured from the wind direction.
pub fn classify(wind_to_target: f64, cfg: &NavigatorConfig) -> SailingMode {
    let off = normalize_angle(wind_to_target).abs();
    if off < cfg.no_go_rad {
        SailingMode::Upwind
    } else if off > cfg.downwind_cone_rad {
        SailingMode::Downwind
    } else {
        SailingMode::Reach
    }
}

/// Legs known to be beats or runs override the geometric classification.
/// The start leg is classified: an OCS boat has to run back downwind.
pub fn leg_override(kind: LegKind) -> Option<SailingMode> {
    match kind {
        LegKind::Upwind => Some(SailingMode::Upwind),
        LegKind::Downwind => Some(SailingMode::Downwind),
        LegKind::Start | LegKind::Reach => None,
    }
}

/// Whether sailing `heading` from inside the exit band carries the boat outward.
pub fn exits_boundary(boat: &BoatSnapshot, heading: f64, boundary: &Boundary, margin: f64) -> bool {
    let radial = boat.position.sub(boundary.center);
    radial.length() > boundary.radius - margin && heading_vector(heading).dot(radial) > 0.0
}

/// Pick the heading for an upwind or downwind mode: hold the current tack,
/// or swap when the other tack pays by enough VMG or the boundary forces it.
#[allow(clippy::too_many_arguments)]
pub(crate) fn choose_heading(
    boat: &BoatSnapshot,
    state: &mut BoatTacticalState,
    wind_direction: f64,
    bearing: f64,
    mode: SailingMode,
    classified: SailingMode,
    boundary: Option<&Boundary>,
    cfg: &NavigatorConfig,
) -> (f64, Maneuver) {
    if mode == SailingMode::Reach {
        return reach(boat, state, wind_direction, bearing);
    }

    let wind_to_target = normalize_angle(bearing - wind_direction);
    let side = state.sailing_tack(boat.heading, wind_direction).boom_side();
    let twa = match mode {
        SailingMode::Upwind => cfg.upwind_twa_deg,
        _ => cfg.downwind_twa_deg,
    }
    .to_radians();
    let on_tack = normalize_angle(wind_direction + side * twa);
    let on_swap = normalize_angle(wind_direction - side * twa);

    let vmg = |h: f64| normalize_angle(h - bearing).cos();
    let outside_layline = match mode {
        SailingMode::Upwind => wind_to_target.abs() > cfg.upwind_layline_deg.to_radians(),
        _ => wind_to_target.abs() < cfg.downwind_layline_deg.to_radians(),
    };
    let margin = if outside_layline { cfg.swap_margin - cfg.layline_relief } else { cfg.swap_margin };
    let min_speed = if outside_layline { cfg.swap_min_speed_outside_layline } else { cfg.swap_min_speed };

    let forced = boundary.is_some_and(|b| {
        exits_boundary(boat, on_tack, b, cfg.boundary_exit_margin)
            && !exits_boundary(boat, on_swap, b, cfg.boundary_exit_margin)
    });
    let pays = state.tack_cooldown <= 0.0
        && vmg(on_swap) > vmg(on_tack) + margin
        && (boat.speed > min_speed || mode == SailingMode::Downwind);

    if forced || pays {
        state.tack_cooldown = cfg.tack_cooldown_s;
        let tack = Tack::of(on_swap, wind_direction);
        state.committed_tack = Some(tack);
        debug!(
            "⛵ boat {} {} onto {:?}{}",
            boat.id,
            if mode == SailingMode::Upwind { "tacks" } else { "gybes" },
            tack,
            if forced { " (boundary)" } else { "" }
        );
        let maneuver = match mode {
            SailingMode::Upwind => Maneuver::Tacked { tack, forced },
            _ => Maneuver::Gybed { tack, forced },
        };
        return (on_swap, maneuver);
    }

    if classified == SailingMode::Reach {
        return reach(boat, state, wind_direction, bearing);
    }
    (on_tack, Maneuver::OnTack { tack: Tack::of(on_tack, wind_direction) })
}

/// Steer straight at the target. A bearing across the wind commits the boat
/// to the tack on the far side until the bow comes through.
fn reach(boat: &BoatSnapshot, state: &mut BoatTacticalState, wind_direction: f64, bearing: f64) -> (f64, Maneuver) {
    let tack = Tack::of(bearing, wind_direction);
    state.committed_tack = (tack != Tack::of(boat.heading, wind_direction)).then_some(tack);
    (bearing, Maneuver::Reaching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regatta_types::{BoatRaceState, Vec2};
    use rstest::rstest;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn boat(heading: f64, speed: f64) -> BoatSnapshot {
        BoatSnapshot {
            id: 3,
            position: Vec2::zero(),
            velocity: Vec2::zero(),
            heading,
            speed,
            boom_side: 0.0,
            race: BoatRaceState::default(),
        }
    }

    fn state(cooldown: f64) -> BoatTacticalState {
        let mut s = BoatTacticalState::new(0.5, 300.0, 0.0);
        s.tack_cooldown = cooldown;
        s
    }

    #[rstest]
    #[case(0.0, SailingMode::Upwind)]
    #[case(0.7, SailingMode::Upwind)]
    #[case(-0.8, SailingMode::Reach)]
    #[case(PI / 2.0, SailingMode::Reach)]
    #[case(2.4, SailingMode::Downwind)]
    #[case(-PI, SailingMode::Downwind)]
    fn classifies_bearing_off_the_wind(#[case] off: f64, #[case] expected: SailingMode) {
        assert_eq!(classify(off, &NavigatorConfig::default()), expected);
    }

    #[rstest]
    #[case(LegKind::Start, None)]
    #[case(LegKind::Upwind, Some(SailingMode::Upwind))]
    #[case(LegKind::Downwind, Some(SailingMode::Downwind))]
    #[case(LegKind::Reach, None)]
    fn only_beats_and_runs_override(#[case] kind: LegKind, #[case] expected: Option<SailingMode>) {
        assert_eq!(leg_override(kind), expected);
    }

    #[test]
    fn dead_upwind_target_sails_close_hauled() {
        let cfg = NavigatorConfig::default();
        let (h, m) = choose_heading(
            &boat(0.0, 2.0), &mut state(0.0), 0.0, 0.0,
            SailingMode::Upwind, SailingMode::Upwind, None, &cfg,
        );
        assert!((h.abs() - FRAC_PI_4).abs() < 1e-9, "heading {h}");
        assert!(matches!(m, Maneuver::OnTack { .. }));
    }

    #[test]
    fn tacks_when_other_board_pays_outside_layline() {
        let cfg = NavigatorConfig::default();
        // On port (heading NE) but the mark is well to the west
        let bearing = -1.2;
        let mut s = state(0.0);
        let (h, m) = choose_heading(
            &boat(FRAC_PI_4, 2.0), &mut s, 0.0, bearing,
            SailingMode::Upwind, SailingMode::Reach, None, &cfg,
        );
        assert!((h + FRAC_PI_4).abs() < 1e-9);
        assert_eq!(m, Maneuver::Tacked { tack: Tack::Starboard, forced: false });
        assert_eq!(s.tack_cooldown, 10.0);
    }

    #[test]
    fn tack_holds_while_the_bow_comes_through_the_wind() {
        let cfg = NavigatorConfig::default();
        let mut s = state(0.0);
        let (first, m) = choose_heading(
            &boat(FRAC_PI_4, 2.0), &mut s, 0.0, -0.6,
            SailingMode::Upwind, SailingMode::Upwind, None, &cfg,
        );
        assert_eq!(m, Maneuver::Tacked { tack: Tack::Starboard, forced: false });
        assert!((first + FRAC_PI_4).abs() < 1e-9);

        // bow still on the port side of the wind, partway round
        for heading in [0.6, 0.3, 0.05] {
            let (h, m) = choose_heading(
                &boat(heading, 1.4), &mut s, 0.0, -0.6,
                SailingMode::Upwind, SailingMode::Upwind, None, &cfg,
            );
            assert_eq!(h, first, "heading {heading}");
            assert_eq!(m, Maneuver::OnTack { tack: Tack::Starboard });
        }
        assert_eq!(s.committed_tack, Some(Tack::Starboard));

        choose_heading(
            &boat(-0.2, 1.4), &mut s, 0.0, -0.6,
            SailingMode::Upwind, SailingMode::Upwind, None, &cfg,
        );
        assert_eq!(s.committed_tack, None);
    }

    #[test]
    fn cooldown_blocks_voluntary_tack() {
        let cfg = NavigatorConfig::default();
        let (h, m) = choose_heading(
            &boat(FRAC_PI_4, 2.0), &mut state(4.0), 0.0, -1.2,
            SailingMode::Upwind, SailingMode::Reach, None, &cfg,
        );
        // still steering on the reach bearing, no tack
        assert_eq!(h, -1.2);
        assert_eq!(m, Maneuver::Reaching);
    }

    #[test]
    fn reach_across_the_wind_commits_to_the_far_tack() {
        let cfg = NavigatorConfig::default();
        let mut s = state(4.0);
        choose_heading(
            &boat(FRAC_PI_4, 2.0), &mut s, 0.0, -1.2,
            SailingMode::Upwind, SailingMode::Reach, None, &cfg,
        );
        assert_eq!(s.committed_tack, Some(Tack::Starboard));

        // already on the bearing's side: nothing to commit to
        choose_heading(
            &boat(-0.9, 2.0), &mut s, 0.0, -1.2,
            SailingMode::Reach, SailingMode::Reach, None, &cfg,
        );
        assert_eq!(s.committed_tack, None);
    }

    #[test]
    fn slow_boats_do_not_tack_inside_layline() {
        let cfg = NavigatorConfig::default();
        let (_, m) = choose_heading(
            &boat(FRAC_PI_4, 1.2), &mut state(0.0), 0.0, -0.6,
            SailingMode::Upwind, SailingMode::Upwind, None, &cfg,
        );
        assert!(matches!(m, Maneuver::OnTack { tack: Tack::Port }));
    }

    #[test]
    fn boundary_forces_tack_through_cooldown() {
        let cfg = NavigatorConfig::default();
        let mut b = boat(FRAC_PI_4, 2.0);
        b.position = Vec2::new(850.0, 0.0);
        let boundary = Boundary { center: Vec2::zero(), radius: 1000.0 };
        let mut s = state(6.0);
        let (h, m) = choose_heading(
            &b, &mut s, 0.0, 0.0,
            SailingMode::Upwind, SailingMode::Upwind, Some(&boundary), &cfg,
        );
        assert!((h + FRAC_PI_4).abs() < 1e-9);
        assert_eq!(m, Maneuver::Tacked { tack: Tack::Starboard, forced: true });
        assert_eq!(s.tack_cooldown, 10.0);
    }

    #[test]
    fn downwind_gybes_regardless_of_speed() {
        let cfg = NavigatorConfig::default();
        // running on starboard-side heading, target off to the west
        let (h, m) = choose_heading(
            &boat(2.6, 0.3), &mut state(0.0), 0.0, -2.4,
            SailingMode::Downwind, SailingMode::Downwind, None, &cfg,
        );
        assert!((h + 150f64.to_radians()).abs() < 1e-9);
        assert!(matches!(m, Maneuver::Gybed { forced: false, .. }));
    }
}
