//! gusts.rs - Gust and lull spawner
//!
//! Keeps the wind field populated with drifting perturbation zones. New
//! zones appear anywhere within the course boundary plus a margin, drift
//! downwind at roughly a tenth of the wind speed and live 30–90 s.

use std::f64::consts::{FRAC_PI_2, TAU};

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use regatta_ai::wind::{PerturbationZone, WindField, ZoneKind};
use regatta_types::{downwind_vector, heading_vector, Boundary, Vec2, WindSample};
use tracing::debug;

use crate::conditions::ConditionsConfig;

/// Zones may spawn this far outside the boundary and drift in.
const SPAWN_MARGIN: f64 = 500.0;

pub struct GustSpawner {
    conditions: ConditionsConfig,
    radius_major: Uniform<f64>,
    radius_minor: Uniform<f64>,
    duration: Uniform<f64>,
}

impl GustSpawner {
    pub fn new(conditions: &ConditionsConfig) -> Self {
        Self {
            conditions: conditions.clone(),
            radius_major: Uniform::new(300.0, 1500.0),
            radius_minor: Uniform::new(150.0, 750.0),
            duration: Uniform::new(30.0, 90.0),
        }
    }

    /// Fill the field up to density with zones already part-way through
    /// their life, so the race does not open on an empty course.
    pub fn populate<R: Rng + ?Sized>(&self, rng: &mut R, field: &mut WindField, boundary: &Boundary, time: f64) {
        let global = field.global_wind(time);
        while field.zones().len() < self.conditions.zone_density() {
            let zone = self.spawn_in(rng, boundary, global, true);
            field.spawn(zone);
        }
    }

    /// Top the field back up to density. Returns how many zones were added.
    pub fn maintain<R: Rng + ?Sized>(&self, rng: &mut R, field: &mut WindField, boundary: &Boundary, time: f64) -> usize {
        let global = field.global_wind(time);
        let mut added = 0;
        while field.zones().len() < self.conditions.zone_density() {
            let zone = self.spawn_in(rng, boundary, global, false);
            field.spawn(zone);
            added += 1;
        }
        if added > 0 {
            debug!("🌬 spawned {added} zone(s), {} live", field.zones().len());
        }
        added
    }

    fn spawn_in<R: Rng + ?Sized>(&self, rng: &mut R, boundary: &Boundary, global: WindSample, initial: bool) -> PerturbationZone {
        let r = boundary.radius + SPAWN_MARGIN;
        let angle = rng.gen_range(0.0..TAU);
        let dist = rng.gen::<f64>().sqrt() * r;
        let center = boundary.center.add(heading_vector(angle).scale(dist));
        let kind = if rng.gen_bool(self.conditions.gust_probability.clamp(0.0, 1.0)) {
            ZoneKind::Gust
        } else {
            ZoneKind::Lull
        };
        self.create(rng, center, kind, global, initial)
    }

    /// One zone at `center` shaped for the current global wind.
    pub fn create<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        center: Vec2,
        kind: ZoneKind,
        global: WindSample,
        initial: bool,
    ) -> PerturbationZone {
        let size_bias = 0.5 + self.conditions.puffiness.clamp(0.0, 1.0);
        let strength = (rng.gen::<f64>() + 0.5) * 0.5;
        let speed_delta = match kind {
            ZoneKind::Gust => global.speed * (0.2 + strength * 0.3),
            ZoneKind::Lull => -global.speed * (0.1 + strength * 0.3),
        };

        let shifty = self.conditions.puff_shiftiness.clamp(0.0, 1.0);
        let min_dev = 5.0 + shifty * 15.0;
        let max_dev = 10.0 + shifty * 20.0;
        let dev = rng.gen_range(min_dev..max_dev).to_radians();
        let direction_delta = if rng.gen_bool(0.5) { dev } else { -dev };

        // ~10% of wind speed, per frame at 60 Hz
        let drift_speed = global.speed * rng.gen_range(0.8..1.2) * 0.1 * 60.0;
        let drift_dir = global.direction + rng.gen_range(-0.05..0.05);
        let duration = self.duration.sample(rng);

        PerturbationZone {
            center,
            radius_major: self.radius_major.sample(rng) * size_bias,
            radius_minor: self.radius_minor.sample(rng) * size_bias,
            rotation: global.direction + direction_delta + FRAC_PI_2,
            speed_delta,
            direction_delta,
            age: if initial { rng.gen_range(0.0..duration) } else { 0.0 },
            duration,
            velocity: downwind_vector(drift_dir).scale(drift_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionsPreset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regatta_ai::config::WindConfig;

    fn boundary() -> Boundary {
        Boundary { center: Vec2::new(0.0, -1000.0), radius: 1800.0 }
    }

    #[test]
    fn keeps_field_at_density() {
        let conditions = ConditionsConfig::from_preset(ConditionsPreset::Shifty);
        let spawner = GustSpawner::new(&conditions);
        let mut field = WindField::new(&WindConfig::default());
        let mut rng = StdRng::seed_from_u64(7);

        spawner.populate(&mut rng, &mut field, &boundary(), 0.0);
        assert_eq!(field.zones().len(), conditions.zone_density());
        assert_eq!(spawner.maintain(&mut rng, &mut field, &boundary(), 0.0), 0);

        field.clear();
        assert_eq!(spawner.maintain(&mut rng, &mut field, &boundary(), 1.0), conditions.zone_density());
    }

    #[test]
    fn zones_spawn_near_course_and_drift_downwind() {
        let conditions = ConditionsConfig::from_preset(ConditionsPreset::Puffy);
        let spawner = GustSpawner::new(&conditions);
        let mut field = WindField::new(&WindConfig::default());
        let mut rng = StdRng::seed_from_u64(42);
        spawner.populate(&mut rng, &mut field, &boundary(), 0.0);

        for zone in field.zones() {
            assert!(zone.center.dist(boundary().center) <= boundary().radius + SPAWN_MARGIN + 1e-6);
            assert!((30.0..90.0).contains(&zone.duration));
            assert!(zone.age >= 0.0 && zone.age < zone.duration);
            // northerly: zones drift south (screen +y)
            assert!(zone.velocity.y > 0.0);
            let dev = zone.direction_delta.abs().to_degrees();
            assert!((12.5 - 1e-9..=20.0 + 1e-9).contains(&dev), "dev {dev}");
        }
    }

    #[test]
    fn gusts_add_and_lulls_remove_speed() {
        let spawner = GustSpawner::new(&ConditionsConfig::from_preset(ConditionsPreset::Steady));
        let mut rng = StdRng::seed_from_u64(1);
        let global = WindSample::new(0.0, 10.0);
        for _ in 0..20 {
            let g = spawner.create(&mut rng, Vec2::zero(), ZoneKind::Gust, global, false);
            assert!((2.0..=5.0).contains(&g.speed_delta));
            assert_eq!(g.kind(), ZoneKind::Gust);
            assert_eq!(g.age, 0.0);
            let l = spawner.create(&mut rng, Vec2::zero(), ZoneKind::Lull, global, false);
            assert!((-4.0..=-1.0).contains(&l.speed_delta));
            assert_eq!(l.kind(), ZoneKind::Lull);
        }
    }
}
