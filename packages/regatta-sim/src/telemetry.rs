//! telemetry.rs - JSON-lines race recorder
//!
//! One line per sampled frame (`"type": "frame"`) and one per race event
//! (`"type": "event"`). Write errors are logged and the race carries on.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde_json::{json, Value};
use tracing::warn;

use crate::race::{RaceEvent, RaceSim};

pub struct TelemetryWriter {
    out: BufWriter<File>,
    failed: bool,
}

impl TelemetryWriter {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("creating telemetry file {}", path.display()))?;
        Ok(Self { out: BufWriter::new(file), failed: false })
    }

    pub fn write_frame(&mut self, sim: &RaceSim, epoch: u64) {
        self.write_line(&frame_json(sim, epoch));
    }

    pub fn write_event(&mut self, event: &RaceEvent) {
        let payload = match serde_json::to_value(event) {
            Ok(v) => v,
            Err(e) => { warn!("telemetry: serialize failed: {e}"); return; }
        };
        self.write_line(&json!({ "type": "event", "data": payload }));
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("telemetry: flush failed: {e}");
        }
    }

    fn write_line(&mut self, value: &Value) {
        // one warning, not one per frame
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.out, value)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        if let Err(e) = result {
            warn!("telemetry: write failed, recording stopped: {e}");
            self.failed = true;
        }
    }
}

/// Ground-truth snapshot of the fleet, wind and zones.
pub fn frame_json(sim: &RaceSim, epoch: u64) -> Value {
    let global = sim.wind.global_wind(sim.clock);
    let boats: Vec<Value> = sim
        .boats
        .iter()
        .map(|b| {
            let s = &b.snapshot;
            let decision = b.last_decision.as_ref();
            json!({
                "id":          s.id,
                "x":           s.position.x,
                "y":           s.position.y,
                "heading_deg": s.heading.to_degrees(),
                "speed":       s.speed,
                "leg":         s.race.leg,
                "ocs":         s.race.ocs,
                "in_zone":     s.race.in_zone,
                "rounding":    s.race.is_rounding,
                "finished":    s.race.finished,
                "sail_deg":    b.trim.sail_angle.to_degrees(),
                "boom_side":   b.trim.boom_side,
                "spinnaker":   b.spinnaker,
                "mode":        decision.map(|d| d.mode),
                "maneuver":    decision.map(|d| d.maneuver),
                "speed_limit": decision.map(|d| d.speed_limit),
            })
        })
        .collect();

    let zones: Vec<Value> = sim
        .wind
        .zones()
        .iter()
        .map(|z| json!({
            "kind":  z.kind(),
            "x":     z.center.x,
            "y":     z.center.y,
            "rx":    z.radius_major,
            "ry":    z.radius_minor,
            "speed_delta": z.speed_delta,
            "direction_delta_deg": z.direction_delta.to_degrees(),
        }))
        .collect();

    json!({
        "type":          "frame",
        "epoch":         epoch,
        "clock":         sim.clock,
        "time_to_start": sim.time_to_start,
        "status":        sim.status,
        "wind": {
            "direction_deg": global.direction.to_degrees(),
            "speed":         global.speed,
        },
        "boats": boats,
        "zones": zones,
    })
}
