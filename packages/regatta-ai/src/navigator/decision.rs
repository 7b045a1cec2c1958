//! The per-tick output of the navigator, consumed by trim and physics.

use regatta_types::{Tack, Vec2};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SailingMode {
    Upwind,
    Downwind,
    Reach,
}

/// What the boat is doing this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Maneuver {
    /// No usable wind reading; keep the last target heading
    Hold,
    /// Stuck: holding a beam-reach heading until speed returns
    Recovering,
    /// Slow and pointing into the wind; bearing away to fill the sails
    EscapingIrons,
    /// Steering straight at the target
    Reaching,
    OnTack { tack: Tack },
    Tacked { tack: Tack, forced: bool },
    Gybed { tack: Tack, forced: bool },
}

/// Immutable result of one navigator step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavigationDecision {
    /// Heading after this tick's rate-limited turn
    pub heading: f64,
    /// Heading being turned toward
    pub target_heading: f64,
    /// Strategic target point
    pub target: Vec2,
    /// 0 = stop, 1 = full speed
    pub speed_limit: f64,
    pub forced_luff: f64,
    pub spinnaker: bool,
    pub mode: SailingMode,
    pub maneuver: Maneuver,
}

impl NavigationDecision {
    pub fn changed_tack(&self) -> bool {
        matches!(self.maneuver, Maneuver::Tacked { .. } | Maneuver::Gybed { .. })
    }

    pub fn is_recovering(&self) -> bool {
        matches!(self.maneuver, Maneuver::Recovering)
    }
}
