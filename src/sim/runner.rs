use std::fmt;

use log::{debug, info};

use crate::dynamics::state::{EngagementParameters, SimConfig, State};
use crate::error::Result;
use crate::gnc::{Guidance, LoftGuidance, TurnLimiter};
use crate::physics::atmosphere;
use crate::vehicle::{MissileParameters, PropulsionStager};
use super::event::{default_detectors, EventKind, SimEvent};
use super::integrator::euler_step;

// ---------------------------------------------------------------------------
// Simulation result
// ---------------------------------------------------------------------------

/// Why the run stopped. Both are normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    /// Flew the full `time_life`.
    TimeLimit,
    /// Downrange distance passed the configured cutoff.
    RangeCutoff { limit: f64 },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::TimeLimit => write!(f, "time limit"),
            Termination::RangeCutoff { limit } => write!(f, "range cutoff ({limit:.0} m)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrajectoryResult {
    pub missile: String,
    pub samples: Vec<State>,
    pub events: Vec<SimEvent>,
    pub termination: Termination,
}

impl TrajectoryResult {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn final_state(&self) -> Option<&State> {
        self.samples.last()
    }

    pub fn flight_time(&self) -> f64 {
        self.final_state().map_or(0.0, |s| s.time)
    }
}

// ---------------------------------------------------------------------------
// Full flight simulation
// ---------------------------------------------------------------------------

/// Samples reserved up front; longer runs grow the vector as they go.
const MAX_PREALLOCATED: usize = 200_000;

/// Simulate one missile with a custom pitch law.
///
/// Runs `ceil(time_life / dt) + 1` samples unless the range cutoff stops
/// it early. Leaving the 0-20000 m conversion table aborts the run with
/// `OutOfRange`.
pub fn simulate_with(
    missile: &MissileParameters,
    engagement: &EngagementParameters,
    config: &SimConfig,
    guidance: &mut dyn Guidance,
) -> Result<TrajectoryResult> {
    missile.validate()?;
    engagement.validate()?;
    config.validate()?;

    let dt = config.dt;
    let n = config.sample_count(missile.time_life);
    let stager = PropulsionStager::new(missile, dt);
    let limiter = TurnLimiter::new(missile);
    let mut detectors = default_detectors(missile);
    let target_speed = engagement.target_speed_ms();
    guidance.reset();

    info!(
        "{}: simulating {} samples at dt={} s with {} guidance",
        missile.name,
        n,
        dt,
        guidance.name()
    );

    let launch = State::launch(engagement, stager.at_step(0))?.with_speed_cap(missile.end_speed)?;
    let mut events = vec![SimEvent { time: 0.0, kind: EventKind::Launch, state: launch.clone() }];
    let mut samples = Vec::with_capacity(n.min(MAX_PREALLOCATED));
    samples.push(launch);
    let mut termination = Termination::TimeLimit;

    for i in 1..n {
        let prev = &samples[i - 1];
        let command = guidance.command(prev, engagement, dt);
        let mut next = euler_step(prev, missile, stager.at_step(i), command, target_speed, dt)?;
        next.time = i as f64 * dt;
        next.turn = limiter.evaluate(&next, atmosphere::air_density(prev.altitude()), dt);

        for detector in detectors.iter_mut() {
            if let Some(kind) = detector.check(prev, &next) {
                debug!("t={:.2}s {}", next.time, kind);
                events.push(SimEvent { time: next.time, kind, state: next.clone() });
            }
        }

        let cutoff = missile.max_distance.filter(|&limit| next.downrange() > limit);
        samples.push(next);

        if let Some(limit) = cutoff {
            let last = &samples[i];
            debug!("t={:.2}s downrange {:.0} m past cutoff {:.0} m", last.time, last.downrange(), limit);
            events.push(SimEvent { time: last.time, kind: EventKind::RangeCutoff { limit }, state: last.clone() });
            termination = Termination::RangeCutoff { limit };
            break;
        }
    }

    info!(
        "{}: {} samples, {:.2} s, stopped on {}",
        missile.name,
        samples.len(),
        samples.last().map_or(0.0, |s| s.time),
        termination
    );

    Ok(TrajectoryResult { missile: missile.name.clone(), samples, events, termination })
}

/// Simulate with the default `LoftGuidance` (convenience wrapper).
pub fn simulate(
    missile: &MissileParameters,
    engagement: &EngagementParameters,
    config: &SimConfig,
) -> Result<TrajectoryResult> {
    let mut guidance = LoftGuidance::new(missile);
    simulate_with(missile, engagement, config, &mut guidance)
}

/// Two independent runs under the same engagement.
pub fn compare(
    a: &MissileParameters,
    b: &MissileParameters,
    engagement: &EngagementParameters,
    config: &SimConfig,
) -> Result<(TrajectoryResult, TrajectoryResult)> {
    Ok((simulate(a, engagement, config)?, simulate(b, engagement, config)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::LoftingPhase;
    use crate::error::SimError;
    use crate::gnc::PitchCommand;
    use crate::vehicle::{presets, MissileBuilder, MotorPhase};

    fn boost_only() -> MissileParameters {
        MissileBuilder::new("boost").time_life(5.0).build().unwrap()
    }

    #[test]
    fn runs_full_time_life() {
        let r = simulate(&boost_only(), &EngagementParameters::default(), &SimConfig::default()).unwrap();
        assert_eq!(r.len(), 501);
        assert_eq!(r.termination, Termination::TimeLimit);
        assert!((r.flight_time() - 5.0).abs() < 1e-9);
        assert_eq!(r.missile, "boost");
    }

    #[test]
    fn sample_times_are_step_multiples() {
        let r = simulate(&boost_only(), &EngagementParameters::default(), &SimConfig::default()).unwrap();
        for (i, s) in r.samples.iter().enumerate() {
            assert_eq!(s.time, i as f64 * 0.01, "sample {i}");
        }
    }

    #[test]
    fn burnout_event_recorded() {
        let r = simulate(&boost_only(), &EngagementParameters::default(), &SimConfig::default()).unwrap();
        assert_eq!(r.events[0].kind, EventKind::Launch);
        let burnout = r
            .events
            .iter()
            .find(|e| matches!(e.kind, EventKind::Motor { .. }))
            .expect("burnout event");
        assert!((burnout.time - 3.0).abs() < 1e-9, "burnout at {}", burnout.time);
        assert_eq!(burnout.state.motor.phase, MotorPhase::Coast);
    }

    #[test]
    fn range_cutoff_truncates_run() {
        let m = MissileBuilder::new("short").time_life(5.0).max_distance(500.0).build().unwrap();
        let r = simulate(&m, &EngagementParameters::default(), &SimConfig::default()).unwrap();
        assert_eq!(r.termination, Termination::RangeCutoff { limit: 500.0 });
        let last = r.final_state().unwrap();
        assert!(last.downrange() > 500.0);
        assert!(r.samples[r.len() - 2].downrange() <= 500.0);
        assert!(matches!(r.events.last().map(|e| &e.kind), Some(EventKind::RangeCutoff { .. })));
    }

    #[test]
    fn launch_sample_respects_speed_cap() {
        let m = MissileBuilder::new("capped").time_life(2.0).end_speed(300.0).build().unwrap();
        let r = simulate(&m, &EngagementParameters::default(), &SimConfig::default()).unwrap();
        assert_eq!(r.samples[0].tas, 300.0);
        assert!(r.samples.iter().all(|s| s.tas <= 300.0));
    }

    #[test]
    fn long_run_grows_past_preallocation() {
        let m = MissileBuilder::new("long").time_life(250_000.0).build().unwrap();
        let r = simulate(&m, &EngagementParameters::default(), &SimConfig { dt: 1.0 }).unwrap();
        assert_eq!(r.len(), 250_001);
        assert_eq!(r.termination, Termination::TimeLimit);
    }

    #[test]
    fn invalid_timestep_rejected() {
        let err = simulate(&boost_only(), &EngagementParameters::default(), &SimConfig { dt: 0.0 });
        assert!(matches!(err, Err(SimError::InvalidParameters { field: "dt", .. })));
    }

    #[test]
    fn climbing_out_of_table_aborts() {
        struct Vertical;
        impl Guidance for Vertical {
            fn command(&mut self, _: &State, _: &EngagementParameters, _: f64) -> PitchCommand {
                PitchCommand { pitch: 1.5, phase: LoftingPhase::Inactive }
            }
        }
        let e = EngagementParameters { launch_altitude: 19_900.0, ..Default::default() };
        let err = simulate_with(&boost_only(), &e, &SimConfig::default(), &mut Vertical);
        assert!(matches!(err, Err(SimError::OutOfRange { .. })));
    }

    #[test]
    fn custom_guidance_is_used() {
        struct Level;
        impl Guidance for Level {
            fn command(&mut self, _: &State, _: &EngagementParameters, _: f64) -> PitchCommand {
                PitchCommand { pitch: 0.0, phase: LoftingPhase::Inactive }
            }
            fn name(&self) -> &str {
                "level"
            }
        }
        let e = EngagementParameters { target_range: 30.0, target_speed: 900.0, target_altitude: 5000.0, ..Default::default() };
        let r = simulate_with(&boost_only(), &e, &SimConfig::default(), &mut Level).unwrap();
        assert!(r.samples.iter().all(|s| s.pitch == 0.0 && s.altitude() == 1000.0));
    }

    #[test]
    fn compare_runs_both_missiles() {
        let e = EngagementParameters { target_range: 20.0, target_speed: 900.0, ..Default::default() };
        let (a, b) = compare(&presets::short_range(), &presets::medium_range(), &e, &SimConfig::default()).unwrap();
        assert_eq!(a.missile, "SR-IR");
        assert_eq!(b.missile, "MR-ARH");
        assert_eq!(a.len(), 4001);
        assert!(!b.is_empty());
    }
}
