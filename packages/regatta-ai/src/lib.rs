//! # regatta-ai
//!
//! Tactical AI for simulated sailing races.
//!
//! - [`wind`]: spatially varying wind from a global oscillation plus
//!   drifting gust and lull zones
//! - [`rules`]: right-of-way between two boats, with mark-zone latches
//! - [`navigator`]: per-tick heading, speed limit and luff for one boat
//! - [`trim`]: rate-limited sail angle
//!
//! A tick runs wind step → navigator per boat → trim per boat. Nothing here
//! is async and nothing here panics on bad numbers; degenerate geometry
//! falls back to a safe heading instead.

pub mod config;
pub mod error;
pub mod navigator;
pub mod rules;
pub mod trim;
pub mod wind;

pub use config::TacticsConfig;
pub use error::ConfigError;
pub use navigator::{BoatTacticalState, Navigator, NavigationDecision, RaceContext};
pub use rules::{Decision, RightOfWayEngine, RuleApplied};
pub use trim::{SailTrimController, SailTrimState};
pub use wind::{PerturbationZone, WindField};
