//! rules.rs - Simplified right-of-way engine
//!
//! Four situations, first match wins:
//!   1. Rule 13: a boat mid-tack keeps clear of one that is not
//!   2. Rule 18: at a mark zone, the boat clear ahead at zone entry keeps
//!      right-of-way until it leaves the zone (latched per boat pair)
//!   3. Rule 11: same tack, windward keeps clear of leeward
//!   4. Rule 10: opposite tacks, port keeps clear of starboard
//!
//! The latch table is the only state. It is keyed by the unordered boat
//! pair and expires at the start of every evaluation once the latched boat
//! is out of the zone or either boat has finished.

use std::collections::HashMap;
use std::fmt;

use regatta_types::{
    cross_wind_vector, downwind_vector, BoatId, BoatSnapshot, Course, Tack, EPSILON_SQ,
};
use serde::Serialize;
use tracing::debug;

use crate::config::RulesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleApplied {
    Tacking,
    ZoneEntry,
    WindwardLeeward,
    PortStarboard,
}

impl RuleApplied {
    /// Racing Rules of Sailing number this situation is modelled on
    pub fn rule_number(self) -> u8 {
        match self {
            RuleApplied::Tacking => 13,
            RuleApplied::ZoneEntry => 18,
            RuleApplied::WindwardLeeward => 11,
            RuleApplied::PortStarboard => 10,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            RuleApplied::Tacking => "tacking boat keeps clear",
            RuleApplied::ZoneEntry => "mark-room: clear ahead at zone entry",
            RuleApplied::WindwardLeeward => "windward boat keeps clear",
            RuleApplied::PortStarboard => "port tack keeps clear of starboard",
        }
    }
}

impl fmt::Display for RuleApplied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule {} ({})", self.rule_number(), self.reason())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub right_of_way: BoatId,
    pub keep_clear: BoatId,
    pub rule: RuleApplied,
    pub reason: &'static str,
}

impl Decision {
    fn new(right_of_way: BoatId, keep_clear: BoatId, rule: RuleApplied) -> Self {
        Self { right_of_way, keep_clear, rule, reason: rule.reason() }
    }

    pub fn holds_right_of_way(&self, id: BoatId) -> bool {
        self.right_of_way == id
    }
}

/// Unordered pair of boat ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(BoatId, BoatId);

impl PairKey {
    pub fn new(a: BoatId, b: BoatId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn contains(&self, id: BoatId) -> bool {
        self.0 == id || self.1 == id
    }
}

#[derive(Debug, Clone, Copy)]
struct ZoneLatch {
    holder: BoatId,
}

pub struct RightOfWayEngine {
    config: RulesConfig,
    latches: HashMap<PairKey, ZoneLatch>,
}

impl RightOfWayEngine {
    pub fn new(config: &RulesConfig) -> Self {
        Self { config: config.clone(), latches: HashMap::new() }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Decide which of two boats holds right-of-way.
    ///
    /// Returns `None` when either boat has finished or the boats sit on top
    /// of each other; callers skip avoidance for that pair this tick.
    pub fn evaluate(
        &mut self,
        a: &BoatSnapshot,
        b: &BoatSnapshot,
        course: &Course,
        wind_direction: f64,
    ) -> Option<Decision> {
        let key = PairKey::new(a.id, b.id);
        if a.race.finished || b.race.finished {
            self.latches.remove(&key);
            return None;
        }
        self.expire(key, a, b);

        let sep = b.position.sub(a.position);
        if !sep.is_finite() || sep.length_sq() < EPSILON_SQ {
            return None;
        }

        match (a.race.is_tacking, b.race.is_tacking) {
            (true, false) => return Some(Decision::new(b.id, a.id, RuleApplied::Tacking)),
            (false, true) => return Some(Decision::new(a.id, b.id, RuleApplied::Tacking)),
            _ => {}
        }

        if a.race.in_zone || b.race.in_zone {
            if let Some(decision) = self.zone_entry(key, a, b, course) {
                return Some(decision);
            }
        }

        let (tack_a, tack_b) = (a.tack(), b.tack());
        if tack_a == tack_b {
            return Some(if is_leeward_of(a, b, tack_a, wind_direction) {
                Decision::new(a.id, b.id, RuleApplied::WindwardLeeward)
            } else {
                Decision::new(b.id, a.id, RuleApplied::WindwardLeeward)
            });
        }

        Some(match tack_a {
            Tack::Starboard => Decision::new(a.id, b.id, RuleApplied::PortStarboard),
            Tack::Port => Decision::new(b.id, a.id, RuleApplied::PortStarboard),
        })
    }

    fn zone_entry(
        &mut self,
        key: PairKey,
        a: &BoatSnapshot,
        b: &BoatSnapshot,
        course: &Course,
    ) -> Option<Decision> {
        let holder = match self.latches.get(&key).map(|latch| latch.holder) {
            Some(holder) => holder,
            None => {
                let mark = course
                    .approach_mark(a.race.leg, a.position)
                    .or_else(|| course.approach_mark(b.race.leg, b.position))?;
                let holder = if a.position.dist_sq(mark) <= b.position.dist_sq(mark) { a.id } else { b.id };
                // only latched once both boats are inside
                if a.race.in_zone && b.race.in_zone {
                    self.latches.insert(key, ZoneLatch { holder });
                    debug!("⚓ zone latch {}-{}: boat {holder} clear ahead", key.0, key.1);
                }
                holder
            }
        };
        let other = if holder == a.id { b.id } else { a.id };
        Some(Decision::new(holder, other, RuleApplied::ZoneEntry))
    }

    fn expire(&mut self, key: PairKey, a: &BoatSnapshot, b: &BoatSnapshot) {
        if a.race.in_zone && b.race.in_zone {
            return;
        }
        if self.latches.remove(&key).is_some() {
            debug!("⚓ zone latch {}-{} released", key.0, key.1);
        }
    }

    /// Boat currently latched as clear ahead for this pair, if any.
    pub fn latched_holder(&self, a: BoatId, b: BoatId) -> Option<BoatId> {
        self.latches.get(&PairKey::new(a, b)).map(|l| l.holder)
    }

    pub fn latch_count(&self) -> usize {
        self.latches.len()
    }

    /// Drop every latch involving `id` (boat retired or reset).
    pub fn forget_boat(&mut self, id: BoatId) {
        self.latches.retain(|key, _| !key.contains(id));
    }

    pub fn clear(&mut self) {
        self.latches.clear();
    }

    /// Whether two boats are close, or closing to a near miss within the
    /// configured horizon.
    pub fn is_conflict_soon(&self, a: &BoatSnapshot, b: &BoatSnapshot) -> bool {
        let cfg = &self.config;
        let d = b.position.sub(a.position);
        if d.length_sq() < cfg.conflict_range * cfg.conflict_range {
            return true;
        }
        let rel_v = b.velocity.sub(a.velocity);
        let closing = d.dot(rel_v);
        if !(closing < 0.0) {
            return false;
        }
        let v_sq = rel_v.length_sq();
        if v_sq < 1e-4 {
            return false;
        }
        let t = -closing / v_sq;
        if t > cfg.cpa_horizon_s {
            return false;
        }
        let cpa = d.add(rel_v.scale(t));
        cpa.length_sq() < cfg.cpa_range * cfg.cpa_range
    }
}

/// `a` is leeward of `b` when `b` sits on the windward side of the shared
/// tack. Boats level across the wind fall back to whichever is downwind.
fn is_leeward_of(a: &BoatSnapshot, b: &BoatSnapshot, tack: Tack, wind_direction: f64) -> bool {
    let windward = match tack {
        Tack::Starboard => cross_wind_vector(wind_direction),
        Tack::Port => cross_wind_vector(wind_direction).scale(-1.0),
    };
    let sep = b.position.sub(a.position);
    let lateral = sep.dot(windward);
    if lateral.abs() > 1e-9 {
        lateral > 0.0
    } else {
        sep.dot(downwind_vector(wind_direction)) < 0.0
    }
}
