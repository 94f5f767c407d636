use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dynamics::state::State;
use crate::error::Result;
use crate::sim::TrajectoryResult;
use crate::vehicle::{MissileParameters, Performance};

/// Summary statistics computed from a flight.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub flight_time: f64,
    pub samples: usize,
    pub termination: String,
    pub max_tas: f64,
    pub max_tas_time: f64,
    pub max_mach: f64,
    pub max_altitude: f64,
    pub final_downrange: f64,
    pub max_drag: f64,
    /// Peak (indicated thrust - drag) / mass.
    pub max_accel: f64,
    pub max_g_load: f64,
    /// Tightest turn once guidance is active.
    pub min_turn_radius: Option<f64>,
    pub final_range_to_target: f64,
    pub closest_approach: f64,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub time: f64,
    pub event: String,
}

fn max_of(samples: &[State], f: impl Fn(&State) -> f64) -> f64 {
    samples.iter().map(f).fold(0.0_f64, f64::max)
}

impl FlightSummary {
    /// Compute summary from a simulation result.
    pub fn from_result(result: &TrajectoryResult) -> Self {
        let samples = &result.samples;

        let fastest = samples.iter().fold(None::<&State>, |best, s| match best {
            Some(b) if b.tas >= s.tas => Some(b),
            _ => Some(s),
        });

        let min_turn_radius = samples
            .iter()
            .filter(|s| s.turn.is_active())
            .map(|s| s.turn.radius)
            .reduce(f64::min);

        let closest_approach = samples
            .iter()
            .map(|s| s.range_to_target().abs())
            .reduce(f64::min)
            .unwrap_or(0.0);

        let last = result.final_state();

        FlightSummary {
            flight_time: result.flight_time(),
            samples: samples.len(),
            termination: result.termination.to_string(),
            max_tas: fastest.map_or(0.0, |s| s.tas),
            max_tas_time: fastest.map_or(0.0, |s| s.time),
            max_mach: max_of(samples, |s| s.mach),
            max_altitude: max_of(samples, |s| s.altitude()),
            final_downrange: last.map_or(0.0, |s| s.downrange()),
            max_drag: max_of(samples, |s| s.drag),
            max_accel: max_of(samples, |s| s.net_accel),
            max_g_load: max_of(samples, |s| s.turn.g_load),
            min_turn_radius,
            final_range_to_target: last.map_or(0.0, |s| s.range_to_target()),
            closest_approach,
            events: result
                .events
                .iter()
                .map(|e| EventRecord { time: e.time, event: e.kind.to_string() })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct MissileSection<'a> {
    name: &'a str,
    performance: Performance,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    missile: MissileSection<'a>,
    flight: &'a FlightSummary,
}

/// Write flight summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(
    writer: &mut W,
    missile: &MissileParameters,
    summary: &FlightSummary,
) -> Result<()> {
    let doc = SummaryDocument {
        missile: MissileSection { name: &missile.name, performance: missile.performance() },
        flight: summary,
    };
    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)?;
    Ok(())
}

/// Write flight summary JSON to a file.
pub fn write_summary_file(
    path: impl AsRef<Path>,
    missile: &MissileParameters,
    summary: &FlightSummary,
) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, missile, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::{EngagementParameters, SimConfig};
    use crate::sim::simulate;
    use crate::vehicle::presets;

    fn short_range_run() -> (MissileParameters, TrajectoryResult) {
        let m = presets::short_range();
        let e = EngagementParameters { target_range: 8.0, target_speed: 800.0, ..Default::default() };
        let r = simulate(&m, &e, &SimConfig::default()).unwrap();
        (m, r)
    }

    #[test]
    fn summary_tracks_peaks() {
        let (_, r) = short_range_run();
        let s = FlightSummary::from_result(&r);
        assert_eq!(s.samples, r.len());
        assert!(s.max_tas >= r.samples[0].tas);
        assert!(s.max_tas_time > 0.0 && s.max_tas_time <= 3.0, "peak at {}", s.max_tas_time);
        assert!(s.max_mach > 1.0);
        assert!(s.closest_approach <= 8_000.0);
        assert_eq!(s.termination, "time limit");
        assert!(s.min_turn_radius.is_some());
        assert!(s.events.iter().any(|e| e.event == "guidance active"));
    }

    #[test]
    fn max_accel_is_thrust_minus_drag() {
        let (_, r) = short_range_run();
        let s = FlightSummary::from_result(&r);
        let peak = r.samples.iter().map(|s| s.net_accel).fold(0.0_f64, f64::max);
        assert_eq!(s.max_accel, peak);
        assert!(peak > 0.0);
    }

    #[test]
    fn json_output_is_valid() {
        let (m, r) = short_range_run();
        let summary = FlightSummary::from_result(&r);

        let mut buf = Vec::new();
        write_summary(&mut buf, &m, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["missile"]["name"], "SR-IR");
        assert!(value["missile"]["performance"]["booster_isp"].as_f64().unwrap() > 0.0);
        assert!(value["missile"]["performance"]["engine_mass"].as_f64().unwrap() > 0.0);
        assert!(value["flight"]["max_tas"].as_f64().is_some());
        assert!(value["flight"]["events"].is_array());
    }
}
