//! Per-boat tactical memory carried between ticks.

use rand::Rng;
use serde::{Deserialize, Serialize};

use regatta_types::Tack;

use crate::config::StartConfig;

/// Owned by exactly one AI boat; only that boat's navigator mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoatTacticalState {
    /// Heading the boat is turning toward, after steering bias
    pub target_heading: f64,
    /// Seconds spent below the stuck speed (decays when moving)
    pub stuck_timer: f64,
    pub recovery_mode: bool,
    /// Heading held while recovering
    pub recovery_target: f64,
    /// Seconds until another deliberate tack or gybe is allowed
    pub tack_cooldown: f64,
    /// Tack chosen by the last tack or gybe, held until the bow crosses
    /// the wind onto it
    pub committed_tack: Option<Tack>,
    /// 0 = full power, 1 = sails fully eased
    pub forced_luff: f64,
    /// Where along the start line this boat aims, 0 = first mark, 1 = second
    pub start_line_percent: f64,
    /// How far behind the line the boat holds station before the start
    pub setup_distance: f64,
}

impl BoatTacticalState {
    pub fn new(start_line_percent: f64, setup_distance: f64, heading: f64) -> Self {
        Self {
            target_heading: heading,
            stuck_timer: 0.0,
            recovery_mode: false,
            recovery_target: heading,
            tack_cooldown: 0.0,
            committed_tack: None,
            forced_luff: 0.0,
            start_line_percent: start_line_percent.clamp(0.0, 1.0),
            setup_distance: setup_distance.max(0.0),
        }
    }

    /// Fresh state for a race, with start position and setup distance drawn
    /// once from the configured ranges.
    pub fn for_race<R: Rng + ?Sized>(rng: &mut R, cfg: &StartConfig, heading: f64) -> Self {
        let pct = rng.gen_range(cfg.line_percent_min..=cfg.line_percent_max);
        let setup = rng.gen_range(cfg.setup_distance_min..=cfg.setup_distance_max);
        Self::new(pct, setup, heading)
    }

    /// Which side of the wind to sail on: the committed tack while a tack
    /// or gybe is under way, else the tack implied by `heading`. Drops the
    /// commitment once the boat has come round.
    pub(crate) fn sailing_tack(&mut self, heading: f64, wind_direction: f64) -> Tack {
        let current = Tack::of(heading, wind_direction);
        match self.committed_tack {
            Some(tack) if tack != current => tack,
            _ => {
                self.committed_tack = None;
                current
            }
        }
    }

    pub(crate) fn decay_cooldown(&mut self, dt: f64) {
        if self.tack_cooldown > 0.0 {
            self.tack_cooldown = (self.tack_cooldown - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn race_setup_draws_within_ranges() {
        let cfg = StartConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = BoatTacticalState::for_race(&mut rng, &cfg, 0.3);
            assert!((0.1..=0.9).contains(&s.start_line_percent));
            assert!((250.0..=350.0).contains(&s.setup_distance));
            assert_eq!(s.target_heading, 0.3);
            assert!(!s.recovery_mode);
        }
    }

    #[test]
    fn committed_tack_holds_until_the_bow_crosses() {
        let mut s = BoatTacticalState::new(0.5, 300.0, 0.0);
        // port tack close-hauled in a northerly, committed to starboard
        s.committed_tack = Some(Tack::Starboard);
        assert_eq!(s.sailing_tack(0.7, 0.0), Tack::Starboard);
        assert_eq!(s.sailing_tack(0.2, 0.0), Tack::Starboard);
        assert!(s.committed_tack.is_some());
        assert_eq!(s.sailing_tack(-0.1, 0.0), Tack::Starboard);
        assert!(s.committed_tack.is_none());
        assert_eq!(s.sailing_tack(0.7, 0.0), Tack::Port);
    }

    #[test]
    fn cooldown_only_decays_to_zero() {
        let mut s = BoatTacticalState::new(0.5, 300.0, 0.0);
        s.tack_cooldown = 0.4;
        s.decay_cooldown(0.25);
        assert!((s.tack_cooldown - 0.15).abs() < 1e-12);
        s.decay_cooldown(1.0);
        assert_eq!(s.tack_cooldown, 0.0);
        s.decay_cooldown(1.0);
        assert_eq!(s.tack_cooldown, 0.0);
    }
}
