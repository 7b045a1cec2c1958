//! # regatta-types
//!
//! Shared geometry, wind and course structures for the Regatta tactical AI.
//!
//! These types are used by:
//! - `regatta-ai`: wind field, right-of-way engine, navigator and trim
//! - `regatta-sim`: headless race harness (physics step, telemetry)
//!
//! ## Coordinate Conventions
//!
//! - **Screen frame**: x grows east (right), y grows south (down)
//! - **Angles**: radians, 0 = north (up), increasing clockwise
//! - **Heading vector**: `(sin h, -cos h)`, so `bearing = atan2(dx, -dy)`
//! - **Wind direction**: the direction the wind blows FROM

use std::f64::consts::{PI, TAU};
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Below this squared length a vector is treated as degenerate.
pub const EPSILON_SQ: f64 = 1e-9;

// ── 2D Vector ─────────────────────────────────────────────────────────────────

/// 2D vector in screen-frame course units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
    pub const fn zero() -> Self { Self { x: 0.0, y: 0.0 } }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Vec2) -> Vec2 { self + other }
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: Vec2) -> Vec2 { self - other }
    pub fn scale(self, s: f64) -> Vec2 { self * s }
    pub fn dot(self, other: Vec2) -> f64 { self.x * other.x + self.y * other.y }
    pub fn length_sq(self) -> f64 { self.dot(self) }
    pub fn length(self) -> f64 { self.length_sq().sqrt() }
    pub fn dist_sq(self, other: Vec2) -> f64 { self.sub(other).length_sq() }
    pub fn dist(self, other: Vec2) -> f64 { self.dist_sq(other).sqrt() }

    /// Midpoint between two points
    pub fn midpoint(self, other: Vec2) -> Vec2 {
        Vec2::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Linear interpolation, `t = 0` → self, `t = 1` → other
    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        self + (other - self) * t
    }

    /// Unit vector in the same direction, or `None` when degenerate
    pub fn normalized(self) -> Option<Vec2> {
        let len_sq = self.length_sq();
        if !len_sq.is_finite() || len_sq < EPSILON_SQ {
            return None;
        }
        Some(self.scale(1.0 / len_sq.sqrt()))
    }

    pub fn is_finite(self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f64) -> Vec2 { Vec2::new(self.x * s, self.y * s) }
}

// ── Angles (screen convention) ────────────────────────────────────────────────

/// Wrap an angle into `[-π, π)`.
pub fn normalize_angle(a: f64) -> f64 {
    (a + PI).rem_euclid(TAU) - PI
}

/// Unit vector pointing along a heading.
pub fn heading_vector(heading: f64) -> Vec2 {
    Vec2::new(heading.sin(), -heading.cos())
}

/// Bearing from one point to another, `None` when the points coincide.
pub fn bearing(from: Vec2, to: Vec2) -> Option<f64> {
    let d = to.sub(from);
    if !d.is_finite() || d.length_sq() < EPSILON_SQ {
        return None;
    }
    Some(d.x.atan2(-d.y))
}

/// Unit vector pointing where the wind blows TO.
pub fn downwind_vector(wind_direction: f64) -> Vec2 {
    heading_vector(wind_direction + PI)
}

/// Unit vector perpendicular to the wind, to the right when facing upwind.
pub fn cross_wind_vector(wind_direction: f64) -> Vec2 {
    let up = heading_vector(wind_direction);
    Vec2::new(-up.y, up.x)
}

/// `+1.0` for non-negative values, `-1.0` otherwise.
pub fn side_of(v: f64) -> f64 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}

// ── Wind ──────────────────────────────────────────────────────────────────────

/// Instantaneous wind reading. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Direction the wind blows FROM, radians
    pub direction: f64,
    pub speed: f64,
}

impl WindSample {
    pub fn new(direction: f64, speed: f64) -> Self { Self { direction, speed } }

    pub fn is_valid(&self) -> bool {
        self.direction.is_finite() && self.speed.is_finite() && self.speed >= 0.0
    }

    /// True-wind velocity vector (where the air is moving), units of `speed`
    pub fn flow(&self) -> Vec2 {
        downwind_vector(self.direction).scale(self.speed)
    }
}

// ── Tack ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tack {
    /// Wind coming over the starboard (right) side
    Starboard,
    /// Wind coming over the port (left) side
    Port,
}

impl Tack {
    /// Tack implied by sailing `heading` in wind from `wind_direction`.
    pub fn of(heading: f64, wind_direction: f64) -> Self {
        if normalize_angle(wind_direction - heading) >= 0.0 { Tack::Starboard } else { Tack::Port }
    }

    /// Tack read from the boom. The boom sits opposite the wind, so a boom
    /// out to port (`boom_side <= 0`) means starboard tack.
    pub fn from_boom_side(boom_side: f64) -> Self {
        if boom_side > 0.0 { Tack::Port } else { Tack::Starboard }
    }

    /// Boom side the sail settles on for this tack.
    pub fn boom_side(self) -> f64 {
        match self {
            Tack::Starboard => -1.0,
            Tack::Port => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Tack::Starboard => Tack::Port,
            Tack::Port => Tack::Starboard,
        }
    }
}

// ── Course geometry ───────────────────────────────────────────────────────────

/// Circular course boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub center: Vec2,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegKind {
    /// From the start signal to crossing the start line
    Start,
    Upwind,
    Downwind,
    Reach,
}

/// One leg of the course: the gate a boat sails toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Indices into `Course::marks`
    pub gate: [usize; 2],
    pub kind: LegKind,
    /// Whether the gate is rounded (mark zone applies) rather than crossed
    pub rounding: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub marks: Vec<Vec2>,
    pub legs: Vec<Leg>,
    pub boundary: Option<Boundary>,
}

impl Course {
    /// Standard windward/leeward course: marks 0–1 are the start and leeward
    /// gate, marks 2–3 the windward gate. Start, up, down, up, down to finish.
    pub fn windward_leeward(marks: Vec<Vec2>, boundary: Option<Boundary>) -> Self {
        let leeward = [0, 1];
        let windward = [2, 3];
        let legs = vec![
            Leg { gate: leeward, kind: LegKind::Start, rounding: false },
            Leg { gate: windward, kind: LegKind::Upwind, rounding: true },
            Leg { gate: leeward, kind: LegKind::Downwind, rounding: true },
            Leg { gate: windward, kind: LegKind::Upwind, rounding: true },
            Leg { gate: leeward, kind: LegKind::Downwind, rounding: false },
        ];
        Self { marks, legs, boundary }
    }

    pub fn leg(&self, index: usize) -> Option<&Leg> {
        self.legs.get(index)
    }

    /// Both marks of the gate for `leg`, if the course has them.
    pub fn gate(&self, leg: usize) -> Option<(Vec2, Vec2)> {
        let leg = self.legs.get(leg)?;
        let a = *self.marks.get(leg.gate[0])?;
        let b = *self.marks.get(leg.gate[1])?;
        Some((a, b))
    }

    pub fn start_line(&self) -> Option<(Vec2, Vec2)> {
        self.gate(0)
    }

    /// The rounding mark a boat on `leg` at `position` is approaching:
    /// the nearer mark of the gate, for legs whose gate is rounded.
    pub fn approach_mark(&self, leg: usize, position: Vec2) -> Option<Vec2> {
        if !self.legs.get(leg)?.rounding {
            return None;
        }
        let (a, b) = self.gate(leg)?;
        Some(if position.dist_sq(a) <= position.dist_sq(b) { a } else { b })
    }

    /// Whether `position` is within `radius` of the mark it is approaching.
    pub fn in_zone(&self, leg: usize, position: Vec2, radius: f64) -> bool {
        self.approach_mark(leg, position)
            .map(|m| m.dist_sq(position) <= radius * radius)
            .unwrap_or(false)
    }
}

// ── Boats ─────────────────────────────────────────────────────────────────────

pub type BoatId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceStatus {
    Prestart,
    Racing,
}

/// Per-boat race progress, owned by the race state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoatRaceState {
    pub leg: usize,
    pub is_rounding: bool,
    /// Heading is passing through head-to-wind
    pub is_tacking: bool,
    /// Inside the zone of the mark being approached
    pub in_zone: bool,
    /// Over the start line early, must return
    pub ocs: bool,
    /// Serving a penalty turn
    pub penalty: bool,
    pub finished: bool,
    /// Externally routed waypoint, used when mark targeting is unavailable
    pub next_waypoint: Option<Vec2>,
}

/// Read-only view of a boat shared across all navigators within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoatSnapshot {
    pub id: BoatId,
    pub position: Vec2,
    /// Course units per second
    pub velocity: Vec2,
    pub heading: f64,
    /// Native boat-speed scalar reported by physics
    pub speed: f64,
    /// +1 boom out to starboard, -1 out to port
    pub boom_side: f64,
    pub race: BoatRaceState,
}

impl BoatSnapshot {
    pub fn tack(&self) -> Tack {
        Tack::from_boom_side(self.boom_side)
    }

    pub fn forward(&self) -> Vec2 {
        heading_vector(self.heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(2.5 * PI, FRAC_PI_2)]
    #[case(-3.0 * FRAC_PI_2, FRAC_PI_2)]
    #[case(TAU + 0.5, 0.5)]
    fn normalize_wraps_into_half_open_range(#[case] input: f64, #[case] expected: f64) {
        let out = normalize_angle(input);
        assert!((out - expected).abs() < EPS, "{input} → {out}, expected {expected}");
        assert!((-PI..PI).contains(&out));
    }

    #[rstest]
    #[case(Vec2::new(0.0, -10.0), 0.0)]
    #[case(Vec2::new(10.0, 0.0), FRAC_PI_2)]
    #[case(Vec2::new(-10.0, 0.0), -FRAC_PI_2)]
    fn bearing_uses_screen_convention(#[case] to: Vec2, #[case] expected: f64) {
        let b = bearing(Vec2::zero(), to).unwrap();
        assert!((b - expected).abs() < EPS);
        let fwd = heading_vector(b);
        assert!(fwd.dist(to.normalized().unwrap()) < EPS);
    }

    #[test]
    fn vector_operators_match_methods() {
        let a = Vec2::new(3.0, -4.0);
        let b = Vec2::new(-1.0, 2.5);
        assert_eq!(a + b, Vec2::new(2.0, -1.5));
        assert_eq!(a - b, Vec2::new(4.0, -6.5));
        assert_eq!(a * 2.0, Vec2::new(6.0, -8.0));
        assert_eq!(a + b, a.add(b));
        assert_eq!(a - b, a.sub(b));
        assert_eq!(a * 0.5, a.scale(0.5));
        assert_eq!(a.lerp(b, 0.5), a.midpoint(b));
    }

    #[test]
    fn bearing_is_none_for_coincident_points() {
        assert!(bearing(Vec2::new(3.0, 4.0), Vec2::new(3.0, 4.0)).is_none());
        assert!(Vec2::zero().normalized().is_none());
    }

    #[test]
    fn north_wind_flows_south() {
        let flow = WindSample::new(0.0, 10.0).flow();
        assert!(flow.x.abs() < EPS);
        assert!((flow.y - 10.0).abs() < EPS);
        let right = cross_wind_vector(0.0);
        assert!((right.x - 1.0).abs() < EPS && right.y.abs() < EPS);
    }

    #[test]
    fn tack_follows_wind_side() {
        // Wind from north, heading north-west: wind over the starboard bow
        assert_eq!(Tack::of(-PI / 4.0, 0.0), Tack::Starboard);
        assert_eq!(Tack::of(PI / 4.0, 0.0), Tack::Port);
        assert_eq!(Tack::from_boom_side(Tack::Starboard.boom_side()), Tack::Starboard);
        assert_eq!(Tack::from_boom_side(Tack::Port.boom_side()), Tack::Port);
    }

    #[test]
    fn windward_leeward_course_gates() {
        let marks = vec![
            Vec2::new(-50.0, 0.0),
            Vec2::new(50.0, 0.0),
            Vec2::new(-50.0, -1000.0),
            Vec2::new(50.0, -1000.0),
        ];
        let course = Course::windward_leeward(marks, None);
        assert_eq!(course.legs.len(), 5);
        assert_eq!(course.gate(1), Some((Vec2::new(-50.0, -1000.0), Vec2::new(50.0, -1000.0))));
        assert_eq!(course.approach_mark(1, Vec2::new(40.0, -900.0)), Some(Vec2::new(50.0, -1000.0)));
        assert!(course.approach_mark(0, Vec2::zero()).is_none());
        assert!(course.in_zone(1, Vec2::new(40.0, -900.0), 165.0));
        assert!(!course.in_zone(1, Vec2::new(40.0, -500.0), 165.0));
    }

    #[test]
    fn missing_marks_yield_no_gate() {
        let course = Course::windward_leeward(vec![Vec2::zero(), Vec2::new(10.0, 0.0)], None);
        assert!(course.gate(0).is_some());
        assert!(course.gate(1).is_none());
        assert!(!course.in_zone(1, Vec2::zero(), 165.0));
    }
}
