//! wind.rs - Global wind model plus moving gust/lull zones
//!
//! The global wind oscillates around a base direction and speed as a pure
//! function of race time. Local wind superimposes every perturbation zone
//! whose (rotated, lifecycle-scaled) ellipse covers the sample point.
//! Zones never interact with each other and never read boat state.

use std::f64::consts::{PI, TAU};

use regatta_types::{normalize_angle, Vec2, WindSample};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WindConfig;

// ── Perturbation zones ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneKind {
    Gust,
    Lull,
}

/// An elliptical gust or lull drifting across the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationZone {
    pub center: Vec2,
    /// Semi-axis along `rotation`, at full size
    pub radius_major: f64,
    pub radius_minor: f64,
    pub rotation: f64,
    pub speed_delta: f64,
    pub direction_delta: f64,
    pub age: f64,
    pub duration: f64,
    /// Course units per second
    pub velocity: Vec2,
}

impl PerturbationZone {
    pub fn kind(&self) -> ZoneKind {
        if self.speed_delta >= 0.0 { ZoneKind::Gust } else { ZoneKind::Lull }
    }

    pub fn intensity(&self, fade_window: f64) -> f64 {
        intensity_envelope(self.age, self.duration, fade_window)
    }

    pub fn is_expired(&self) -> bool {
        self.age > self.duration
    }

    /// Semi-axes at the current age: the zone swells and shrinks over its life.
    pub fn current_radii(&self, min_radius: f64) -> (f64, f64) {
        let progress = if self.duration > 0.0 {
            (self.age / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let swell = (PI * progress).sin();
        (
            (self.radius_major * swell).max(min_radius),
            (self.radius_minor * swell).max(min_radius),
        )
    }

    /// 1 at the center, 0 at the ellipse edge, `None` outside.
    pub fn falloff_at(&self, position: Vec2, min_radius: f64) -> Option<f64> {
        let (rx_max, ry_max) = self.current_radii(min_radius);
        let d = position.sub(self.center);
        let (sin_r, cos_r) = (-self.rotation).sin_cos();
        let rx = d.x * cos_r - d.y * sin_r;
        let ry = d.x * sin_r + d.y * cos_r;
        let dist_sq = (rx * rx) / (rx_max * rx_max) + (ry * ry) / (ry_max * ry_max);
        if !dist_sq.is_finite() || dist_sq > 1.0 {
            return None;
        }
        Some(1.0 - dist_sq.sqrt())
    }
}

/// Smooth 0 → 1 → 0 lifecycle envelope: linear fade-in and fade-out over
/// `fade_window`, zero at and beyond both ends of the zone's life.
pub fn intensity_envelope(age: f64, duration: f64, fade_window: f64) -> f64 {
    if !(duration > 0.0) || !(age > 0.0) || age >= duration {
        return 0.0;
    }
    let fade = fade_window.max(f64::EPSILON);
    let fade_in = (age / fade).min(1.0);
    let fade_out = ((duration - age) / fade).min(1.0);
    (fade_in * fade_out).clamp(0.0, 1.0)
}

/// Deterministic multi-octave sine noise in `[-1, 1]`.
pub fn fractal_noise(t: f64, octaves: u32) -> f64 {
    let mut total = 0.0;
    let mut norm = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0;
    for i in 0..octaves {
        total += (t * freq + i as f64 * 13.2).sin() * amp;
        norm += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    if norm > 0.0 { total / norm } else { 0.0 }
}

// ── Wind field ────────────────────────────────────────────────────────────────

pub struct WindField {
    config: WindConfig,
    zones: Vec<PerturbationZone>,
}

impl WindField {
    pub fn new(config: &WindConfig) -> Self {
        Self { config: config.clone(), zones: Vec::new() }
    }

    pub fn config(&self) -> &WindConfig {
        &self.config
    }

    pub fn base_direction(&self) -> f64 {
        self.config.base_direction_deg.to_radians()
    }

    pub fn zones(&self) -> &[PerturbationZone] {
        &self.zones
    }

    pub fn spawn(&mut self, zone: PerturbationZone) {
        debug!(
            "🌬 {:?} spawned at ({:.0}, {:.0}) Δspeed={:.1} for {:.0}s",
            zone.kind(), zone.center.x, zone.center.y, zone.speed_delta, zone.duration
        );
        self.zones.push(zone);
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    /// Wind over open water, free of zones.
    pub fn global_wind(&self, time: f64) -> WindSample {
        let cfg = &self.config;
        let (shift_deg, period) = cfg.preset.oscillation();
        let shift = shift_deg.to_radians() * (TAU * time / period).sin();
        let jitter = cfg.jitter_deg.to_radians() * fractal_noise(time * 0.3, 3);
        let direction = normalize_angle(self.base_direction() + shift + jitter);

        let surge = cfg.surge * (TAU * time / (period * 0.7)).sin();
        let noise = cfg.speed_noise * fractal_noise(time * 0.5 + 456.7, 3);
        let speed = (cfg.base_speed + surge + noise).clamp(cfg.min_speed, cfg.max_speed);

        WindSample::new(direction, speed)
    }

    /// Global wind with every covering zone superimposed.
    pub fn local_wind(&self, position: Vec2, time: f64) -> WindSample {
        let global = self.global_wind(time);
        let mut speed = global.speed;
        let mut direction = global.direction;

        for zone in &self.zones {
            let Some(falloff) = zone.falloff_at(position, self.config.min_zone_radius) else {
                continue;
            };
            let weight = zone.intensity(self.config.fade_window_s) * falloff;
            speed += zone.speed_delta * weight;
            direction += zone.direction_delta * weight;
        }

        WindSample::new(normalize_angle(direction), speed.max(0.0))
    }

    /// Age and drift every zone, dropping those past their duration.
    pub fn step(&mut self, dt: f64) {
        if !(dt > 0.0) || !dt.is_finite() {
            return;
        }
        for zone in &mut self.zones {
            zone.age += dt;
            zone.center = zone.center.add(zone.velocity.scale(dt));
        }
        let before = self.zones.len();
        self.zones.retain(|z| !z.is_expired());
        if self.zones.len() != before {
            debug!("🌬 {} zone(s) expired, {} active", before - self.zones.len(), self.zones.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gust(center: Vec2, age: f64) -> PerturbationZone {
        PerturbationZone {
            center,
            radius_major: 400.0,
            radius_minor: 200.0,
            rotation: 0.0,
            speed_delta: 4.0,
            direction_delta: 0.2,
            age,
            duration: 60.0,
            velocity: Vec2::new(0.0, 5.0),
        }
    }

    fn steady_config() -> WindConfig {
        WindConfig { jitter_deg: 0.0, surge: 0.0, speed_noise: 0.0, ..WindConfig::default() }
    }

    #[test]
    fn envelope_is_zero_at_both_ends() {
        assert_eq!(intensity_envelope(0.0, 60.0, 5.0), 0.0);
        assert_eq!(intensity_envelope(60.0, 60.0, 5.0), 0.0);
        assert_eq!(intensity_envelope(30.0, 60.0, 5.0), 1.0);
        assert!((intensity_envelope(2.5, 60.0, 5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn short_zones_never_reach_full_strength() {
        // duration shorter than both fade windows
        let peak = intensity_envelope(3.0, 6.0, 5.0);
        assert!(peak > 0.0 && peak < 1.0);
    }

    proptest! {
        #[test]
        fn envelope_positive_strictly_inside(
            duration in 0.5f64..200.0,
            frac in 0.001f64..0.999,
            fade in 0.1f64..20.0,
        ) {
            let v = intensity_envelope(duration * frac, duration, fade);
            prop_assert!(v > 0.0 && v <= 1.0);
        }

        #[test]
        fn envelope_is_continuous(
            duration in 1.0f64..200.0,
            frac in 0.0f64..1.0,
            fade in 0.1f64..20.0,
        ) {
            let age = duration * frac;
            let h = 1e-7;
            let a = intensity_envelope(age, duration, fade);
            let b = intensity_envelope(age + h, duration, fade);
            // slope never exceeds 2/fade, even when both fades overlap
            prop_assert!((a - b).abs() <= 2.0 * h / fade + 1e-12);
        }
    }

    #[test]
    fn zone_strengthens_wind_at_its_center() {
        let mut field = WindField::new(&steady_config());
        let base = field.local_wind(Vec2::zero(), 0.0);
        field.spawn(gust(Vec2::zero(), 30.0));
        let inside = field.local_wind(Vec2::zero(), 0.0);
        assert!((inside.speed - (base.speed + 4.0)).abs() < 1e-9);
        assert!((normalize_angle(inside.direction - base.direction) - 0.2).abs() < 1e-9);

        let outside = field.local_wind(Vec2::new(0.0, 5000.0), 0.0);
        assert_eq!(outside, base);
    }

    #[test]
    fn rotation_turns_the_ellipse() {
        let mut field = WindField::new(&steady_config());
        field.spawn(gust(Vec2::zero(), 30.0));
        // 300 along x is inside the unrotated major axis, outside the minor
        let probe = Vec2::new(300.0, 0.0);
        assert!(field.zones()[0].falloff_at(probe, 10.0).is_some());
        let mut turned = gust(Vec2::zero(), 30.0);
        turned.rotation = PI / 2.0;
        assert!(turned.falloff_at(probe, 10.0).is_none());
    }

    #[test]
    fn lull_never_drives_speed_negative() {
        let mut field = WindField::new(&WindConfig { min_speed: 0.0, base_speed: 1.0, ..steady_config() });
        let mut lull = gust(Vec2::zero(), 30.0);
        lull.speed_delta = -50.0;
        assert_eq!(lull.kind(), ZoneKind::Lull);
        field.spawn(lull);
        assert_eq!(field.local_wind(Vec2::zero(), 0.0).speed, 0.0);
    }

    #[test]
    fn step_ages_drifts_and_expires() {
        let mut field = WindField::new(&steady_config());
        field.spawn(gust(Vec2::zero(), 59.0));
        field.step(0.5);
        assert_eq!(field.zones().len(), 1);
        assert!((field.zones()[0].center.y - 2.5).abs() < 1e-9);
        field.step(0.5);
        // age == duration: still present, contributes nothing
        assert_eq!(field.zones().len(), 1);
        assert_eq!(field.zones()[0].intensity(5.0), 0.0);
        field.step(0.5);
        assert!(field.zones().is_empty());
    }

    #[test]
    fn global_wind_is_deterministic_and_bounded() {
        let field = WindField::new(&WindConfig::default());
        for i in 0..500 {
            let t = i as f64 * 1.7;
            let a = field.global_wind(t);
            assert_eq!(a, field.global_wind(t));
            assert!(a.speed >= 5.0 && a.speed <= 25.0);
            // Normal preset: 10° shift + 3° jitter
            assert!(a.direction.abs() <= 13.5_f64.to_radians());
        }
    }
}
