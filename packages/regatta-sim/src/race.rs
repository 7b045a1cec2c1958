//! race.rs - Headless race: course layout, boat physics, race progression
//!
//! Plays the parts of the game the tactical AI does not own:
//! - Lays out a windward/leeward course square to the base wind
//! - Moves boats at polar speed toward the navigator's heading, with a
//!   fixed per-frame acceleration
//! - Runs the countdown, flags OCS boats at the gun, detects gate
//!   crossings, roundings and finishes
//!
//! Per tick: start signal → gust upkeep → wind step → fleet snapshot →
//! navigator per boat → physics + trim per boat → race progression.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use regatta_ai::config::{StartConfig, TacticsConfig};
use regatta_ai::navigator::start::distance_behind_line;
use regatta_ai::trim::{apparent_wind, optimal_sail_angle};
use regatta_ai::{
    BoatTacticalState, NavigationDecision, Navigator, RaceContext, SailTrimController, SailTrimState, WindField,
};
use regatta_types::{
    cross_wind_vector, heading_vector, normalize_angle, side_of, BoatId, BoatRaceState, BoatSnapshot, Boundary,
    Course, LegKind, RaceStatus, Tack, Vec2, WindSample,
};

use crate::conditions::ConditionsConfig;
use crate::gusts::GustSpawner;
use crate::performance;

/// Length of the rays extending a rounding gate outward past each mark.
const GATE_EXTENSION: f64 = 10_000.0;

// ── Config (populated from config.toml) ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub n_boats: usize,
    pub t_minus_seconds: f64,
    /// Race is cut off after this many seconds of simulated time
    pub duration_s: f64,
    pub update_rate_hz: f64,
    pub line_length: f64,
    /// Start line center to windward gate center
    pub course_length: f64,
    pub gate_width: f64,
    pub boundary_radius: f64,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            n_boats: 8,
            t_minus_seconds: 30.0,
            duration_s: 900.0,
            update_rate_hz: 20.0,
            line_length: 300.0,
            course_length: 2000.0,
            gate_width: 200.0,
            boundary_radius: 1800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoatPhysicsConfig {
    /// Knots → course units per frame
    pub knots_to_units: f64,
    /// Speed change per 60 Hz frame
    pub accel_per_frame: f64,
    /// Std-dev of the per-boat polar multiplier
    pub performance_spread: f64,
    /// Below this true wind angle a boat is flagged as tacking
    pub tacking_enter_deg: f64,
    /// And above this it is clear again
    pub tacking_exit_deg: f64,
    /// Boats spawn this far downwind of the start line
    pub spawn_depth: f64,
    pub initial_speed: f64,
}

impl Default for BoatPhysicsConfig {
    fn default() -> Self {
        Self {
            knots_to_units: 0.25,
            accel_per_frame: 0.01,
            performance_spread: 0.02,
            tacking_enter_deg: 30.0,
            tacking_exit_deg: 40.0,
            spawn_depth: 350.0,
            initial_speed: 1.0,
        }
    }
}

// ── Course geometry ───────────────────────────────────────────────────────────

/// Start line through the origin square to the wind; windward gate
/// `course_length` upwind of it; boundary centered between the two.
pub fn layout_course(cfg: &RaceConfig, wind_direction: f64) -> Course {
    let up = heading_vector(wind_direction);
    let across = cross_wind_vector(wind_direction);
    let start = Vec2::zero();
    let windward = start.add(up.scale(cfg.course_length));
    let marks = vec![
        start.sub(across.scale(cfg.line_length / 2.0)),
        start.add(across.scale(cfg.line_length / 2.0)),
        windward.sub(across.scale(cfg.gate_width / 2.0)),
        windward.add(across.scale(cfg.gate_width / 2.0)),
    ];
    let boundary = Boundary { center: start.midpoint(windward), radius: cfg.boundary_radius };
    Course::windward_leeward(marks, Some(boundary))
}

/// Direction in which the move `from → to` crosses segment `a → b`.
/// `+1` along the segment normal `(s.y, -s.x)` (upwind for a gate laid out
/// left to right), `-1` against it, `None` when the move misses.
pub fn crossing(from: Vec2, to: Vec2, a: Vec2, b: Vec2) -> Option<f64> {
    let r = to.sub(from);
    let s = b.sub(a);
    let rxs = r.x * s.y - r.y * s.x;
    if !rxs.is_finite() || rxs.abs() < 1e-9 {
        return None;
    }
    let q = a.sub(from);
    let t = (q.x * s.y - q.y * s.x) / rxs;
    let u = (q.x * r.y - q.y * r.x) / rxs;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(side_of(r.dot(Vec2::new(s.y, -s.x))))
}

fn required_direction(kind: LegKind) -> f64 {
    match kind {
        LegKind::Downwind => -1.0,
        LegKind::Start | LegKind::Upwind | LegKind::Reach => 1.0,
    }
}

fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b.sub(a);
    let len_sq = ab.length_sq();
    if len_sq <= 0.0 {
        return a;
    }
    let t = (p.sub(a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a.lerp(b, t)
}

// ── Boats ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimBoat {
    pub snapshot: BoatSnapshot,
    pub tactics: BoatTacticalState,
    pub trim: SailTrimState,
    /// Per-boat polar multiplier
    pub performance: f64,
    pub spinnaker: bool,
    pub last_decision: Option<NavigationDecision>,
    pub finish_time: Option<f64>,
    pub tacks: u32,
}

impl SimBoat {
    pub fn new(
        id: BoatId,
        position: Vec2,
        heading: f64,
        speed: f64,
        wind_direction: f64,
        tactics: BoatTacticalState,
    ) -> Self {
        let boom_side = Tack::of(heading, wind_direction).boom_side();
        Self {
            snapshot: BoatSnapshot {
                id,
                position,
                velocity: heading_vector(heading).scale(speed * 60.0),
                heading,
                speed,
                boom_side,
                race: BoatRaceState::default(),
            },
            tactics,
            trim: SailTrimState { boom_side, ..SailTrimState::default() },
            performance: 1.0,
            spinnaker: false,
            last_decision: None,
            finish_time: None,
            tacks: 0,
        }
    }
}

fn spawn_boats(
    rng: &mut StdRng,
    race: &RaceConfig,
    physics: &BoatPhysicsConfig,
    start: &StartConfig,
    course: &Course,
    wind_direction: f64,
) -> Vec<SimBoat> {
    let Some((a, b)) = course.start_line() else { return Vec::new() };
    let down = heading_vector(wind_direction).scale(-1.0);
    let spread = Normal::new(1.0, physics.performance_spread.max(0.0)).ok();
    // starboard-tack beam reach along the line
    let heading = normalize_angle(wind_direction - std::f64::consts::FRAC_PI_2);

    (0..race.n_boats)
        .map(|i| {
            let t = 0.05 + 0.9 * (i as f64 / f64::max(race.n_boats as f64 - 1.0, 1.0));
            let depth = physics.spawn_depth + rng.gen_range(-20.0..20.0);
            let position = a.lerp(b, t).add(down.scale(depth));
            let tactics = BoatTacticalState::for_race(rng, start, heading);
            let mut boat =
                SimBoat::new(i as BoatId + 1, position, heading, physics.initial_speed, wind_direction, tactics);
            boat.performance = spread.map_or(1.0, |n| n.sample(rng)).clamp(0.9, 1.1);
            boat
        })
        .collect()
}

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceEvent {
    Start { time: f64 },
    Ocs { id: BoatId, time: f64 },
    LegComplete { id: BoatId, leg: usize, time: f64 },
    Finished { id: BoatId, time: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub id: BoatId,
    pub leg: usize,
    pub finish_time: Option<f64>,
    pub tacks: u32,
}

// ── Simulation ────────────────────────────────────────────────────────────────

pub struct RaceSim {
    pub course: Course,
    pub wind: WindField,
    pub boats: Vec<SimBoat>,
    pub status: RaceStatus,
    pub clock: f64,
    pub time_to_start: f64,
    navigator: Navigator,
    trim: SailTrimController,
    spawner: GustSpawner,
    rng: StdRng,
    physics: BoatPhysicsConfig,
    zone_radius: f64,
}

impl RaceSim {
    pub fn new(
        race: &RaceConfig,
        physics: &BoatPhysicsConfig,
        tactics: &TacticsConfig,
        conditions: &ConditionsConfig,
        mut rng: StdRng,
    ) -> Self {
        let mut wind = WindField::new(&conditions.apply(&tactics.wind));
        let course = layout_course(race, wind.base_direction());
        let spawner = GustSpawner::new(conditions);
        if let Some(boundary) = course.boundary {
            spawner.populate(&mut rng, &mut wind, &boundary, 0.0);
        }
        let boats = spawn_boats(&mut rng, race, physics, &tactics.navigator.start, &course, wind.base_direction());

        Self {
            course,
            wind,
            boats,
            status: RaceStatus::Prestart,
            clock: 0.0,
            time_to_start: race.t_minus_seconds,
            navigator: Navigator::new(tactics),
            trim: SailTrimController::new(&tactics.trim),
            spawner,
            rng,
            physics: physics.clone(),
            zone_radius: tactics.rules.zone_radius,
        }
    }

    /// Advance the race by `dt` seconds.
    pub fn step(&mut self, dt: f64) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        if !(dt > 0.0) || !dt.is_finite() {
            return events;
        }
        self.clock += dt;
        self.time_to_start -= dt;

        if self.status == RaceStatus::Prestart && self.time_to_start <= 0.0 {
            self.status = RaceStatus::Racing;
            events.push(RaceEvent::Start { time: self.clock });
            self.flag_ocs_at_gun(&mut events);
        }

        if let Some(boundary) = self.course.boundary {
            self.spawner.maintain(&mut self.rng, &mut self.wind, &boundary, self.clock);
        }
        self.wind.step(dt);

        let fleet: Vec<BoatSnapshot> = self.boats.iter().map(|b| b.snapshot).collect();
        let ctx = RaceContext {
            status: self.status,
            clock: self.clock,
            time_to_start: self.time_to_start,
            course: &self.course,
            wind: &self.wind,
            fleet: &fleet,
        };
        let mut decisions = Vec::with_capacity(self.boats.len());
        for boat in &mut self.boats {
            decisions.push(self.navigator.step(&mut boat.tactics, &boat.snapshot, dt, &ctx));
        }

        for (boat, decision) in self.boats.iter_mut().zip(decisions) {
            let last = boat.snapshot.position;
            let local = self.wind.local_wind(last, self.clock);
            advance_boat(boat, &decision, local, dt, &self.physics, &self.trim);
            update_flags(boat, local.direction, &self.course, self.zone_radius, &self.physics);
            progress(boat, last, &self.course, self.status, self.clock, &mut events);
        }

        for event in &events {
            if let RaceEvent::Finished { id, .. } = event {
                self.navigator.rules_mut().forget_boat(*id);
            }
        }
        events
    }

    fn flag_ocs_at_gun(&mut self, events: &mut Vec<RaceEvent>) {
        let Some((a, b)) = self.course.start_line() else { return };
        let line_mid = a.midpoint(b);
        let wind_direction = self.wind.base_direction();
        for boat in &mut self.boats {
            let race = &mut boat.snapshot.race;
            if !race.ocs && distance_behind_line(boat.snapshot.position, line_mid, wind_direction) < 0.0 {
                race.ocs = true;
                events.push(RaceEvent::Ocs { id: boat.snapshot.id, time: self.clock });
            }
        }
    }

    pub fn all_finished(&self) -> bool {
        !self.boats.is_empty() && self.boats.iter().all(|b| b.snapshot.race.finished)
    }

    /// Finished boats by finish time, then the rest by leg reached.
    pub fn standings(&self) -> Vec<Standing> {
        let mut out: Vec<Standing> = self
            .boats
            .iter()
            .map(|b| Standing {
                id: b.snapshot.id,
                leg: b.snapshot.race.leg,
                finish_time: b.finish_time,
                tacks: b.tacks,
            })
            .collect();
        out.sort_by(|x, y| match (x.finish_time, y.finish_time) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => y.leg.cmp(&x.leg).then(x.id.cmp(&y.id)),
        });
        out
    }
}

// ── Per-boat physics ──────────────────────────────────────────────────────────

fn advance_boat(
    boat: &mut SimBoat,
    decision: &NavigationDecision,
    wind: WindSample,
    dt: f64,
    physics: &BoatPhysicsConfig,
    trim: &SailTrimController,
) {
    let snap = &mut boat.snapshot;
    let twa = normalize_angle(decision.heading - wind.direction);
    let knots = performance::target_speed(twa, decision.spinnaker, wind.speed) * boat.performance;
    let target = knots * physics.knots_to_units * decision.speed_limit.clamp(0.0, 1.0);
    let accel = physics.accel_per_frame * dt * 60.0;
    snap.speed = if snap.speed < target {
        (snap.speed + accel).min(target)
    } else {
        (snap.speed - accel).max(target)
    };

    let came_about = crossed_the_wind(snap.heading, decision.heading, wind.direction);
    snap.heading = decision.heading;
    snap.velocity = heading_vector(decision.heading).scale(snap.speed * 60.0);
    snap.position = snap.position.add(snap.velocity.scale(dt));

    let boat_knots = heading_vector(decision.heading).scale(snap.speed / physics.knots_to_units);
    let (awa, _) = apparent_wind(wind, decision.heading, boat_knots);
    trim.update_boom_side(&mut boat.trim, decision.heading, wind.direction, dt);
    trim.step(&mut boat.trim, optimal_sail_angle(awa, trim.config()), decision.forced_luff, dt);
    snap.boom_side = boat.trim.boom_side;

    boat.spinnaker = decision.spinnaker;
    if came_about {
        boat.tacks += 1;
    }
    boat.last_decision = Some(*decision);
}

/// Bow (tack) or stern (gybe) went through the wind between two headings.
fn crossed_the_wind(before: f64, after: f64, wind_direction: f64) -> bool {
    Tack::of(before, wind_direction) != Tack::of(after, wind_direction)
}

fn update_flags(boat: &mut SimBoat, wind_direction: f64, course: &Course, zone_radius: f64, physics: &BoatPhysicsConfig) {
    let position = boat.snapshot.position;
    let twa = normalize_angle(boat.snapshot.heading - wind_direction).abs();
    let race = &mut boat.snapshot.race;
    if twa < physics.tacking_enter_deg.to_radians() {
        race.is_tacking = true;
    } else if twa > physics.tacking_exit_deg.to_radians() {
        race.is_tacking = false;
    }
    race.in_zone = !race.finished && course.in_zone(race.leg, position, zone_radius);
    race.next_waypoint = course.gate(race.leg).map(|(a, b)| closest_point_on_segment(position, a, b));
}

// ── Race progression ──────────────────────────────────────────────────────────

fn progress(
    boat: &mut SimBoat,
    last: Vec2,
    course: &Course,
    status: RaceStatus,
    clock: f64,
    events: &mut Vec<RaceEvent>,
) {
    let id = boat.snapshot.id;
    let position = boat.snapshot.position;
    if boat.snapshot.race.finished {
        return;
    }
    let leg_index = boat.snapshot.race.leg;
    let (Some(leg), Some((a, b))) = (course.leg(leg_index).copied(), course.gate(leg_index)) else {
        return;
    };
    let required = required_direction(leg.kind);
    let crossed = crossing(last, position, a, b);
    let race = &mut boat.snapshot.race;

    if status == RaceStatus::Prestart {
        match crossed {
            Some(dir) if dir > 0.0 => {
                if !race.ocs {
                    debug!("boat {id} over the line early");
                    events.push(RaceEvent::Ocs { id, time: clock });
                }
                race.ocs = true;
            }
            Some(_) => race.ocs = false,
            None => {}
        }
        return;
    }

    let complete = match leg.kind {
        LegKind::Start => match crossed {
            Some(dir) if dir > 0.0 => !race.ocs,
            Some(_) => {
                race.ocs = false;
                false
            }
            None => false,
        },
        _ if !leg.rounding => crossed == Some(required),
        _ => {
            if !race.is_rounding {
                if crossed == Some(required) {
                    race.is_rounding = true;
                    debug!("boat {id} rounding gate of leg {leg_index}");
                }
            } else if crossed == Some(-required) {
                race.is_rounding = false;
                debug!("boat {id} rounding aborted");
            }
            race.is_rounding && rounded_past_mark(last, position, a, b, required)
        }
    };
    if !complete {
        return;
    }

    race.leg += 1;
    race.is_rounding = false;
    events.push(RaceEvent::LegComplete { id, leg: leg_index, time: clock });
    if race.leg >= course.legs.len() {
        race.finished = true;
        race.in_zone = false;
        boat.finish_time = Some(clock);
        events.push(RaceEvent::Finished { id, time: clock });
    }
}

/// Crossing either outward extension of the gate back the way the boat came.
fn rounded_past_mark(last: Vec2, position: Vec2, a: Vec2, b: Vec2, required: f64) -> bool {
    let Some(along) = b.sub(a).normalized() else { return false };
    let ext = along.scale(GATE_EXTENSION);
    let left = crossing(last, position, a.sub(ext), a);
    let right = crossing(last, position, b, b.add(ext));
    left == Some(-required) || right == Some(-required)
}
