use std::fmt;

use crate::dynamics::state::{LoftingPhase, State};
use crate::vehicle::{MissileParameters, MotorPhase};

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Launch,
    Motor { from: MotorPhase, to: MotorPhase },
    Loft { from: LoftingPhase, to: LoftingPhase },
    GuidanceActive,
    SpeedCap { tas: f64 },
    RangeCutoff { limit: f64 },
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Launch => write!(f, "launch"),
            EventKind::Motor { from: MotorPhase::Boost, to } => write!(f, "booster burnout ({to})"),
            EventKind::Motor { from: MotorPhase::Sustain, .. } => write!(f, "sustainer burnout"),
            EventKind::Motor { from, to } => write!(f, "motor {from} -> {to}"),
            EventKind::Loft { from, to } => write!(f, "loft {from} -> {to}"),
            EventKind::GuidanceActive => write!(f, "guidance active"),
            EventKind::SpeedCap { tas } => write!(f, "speed cap {tas:.0} m/s reached"),
            EventKind::RangeCutoff { limit } => write!(f, "range cutoff at {limit:.0} m"),
        }
    }
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: State,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive states and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind>;
}

/// Detects booster and sustainer burnout.
pub struct MotorPhaseDetector;

impl EventDetector for MotorPhaseDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        (prev.motor.phase != current.motor.phase)
            .then_some(EventKind::Motor { from: prev.motor.phase, to: current.motor.phase })
    }
}

/// Detects loft state machine transitions.
pub struct LoftPhaseDetector;

impl EventDetector for LoftPhaseDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        (prev.loft != current.loft).then_some(EventKind::Loft { from: prev.loft, to: current.loft })
    }
}

/// Fires on the first sample at or past the guidance-enable delay.
pub struct GuidanceDetector {
    delay: f64,
}

impl GuidanceDetector {
    pub fn new(delay: f64) -> Self {
        Self { delay }
    }
}

impl EventDetector for GuidanceDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        (prev.time < self.delay && current.time >= self.delay).then_some(EventKind::GuidanceActive)
    }
}

/// Fires once when true airspeed first reaches the cap.
pub struct SpeedCapDetector {
    cap: f64,
    fired: bool,
}

impl SpeedCapDetector {
    pub fn new(cap: f64) -> Self {
        Self { cap, fired: false }
    }
}

impl EventDetector for SpeedCapDetector {
    fn check(&mut self, _prev: &State, current: &State) -> Option<EventKind> {
        if self.fired || current.tas < self.cap {
            return None;
        }
        self.fired = true;
        Some(EventKind::SpeedCap { tas: current.tas })
    }
}

/// Detectors that apply to a given missile.
pub fn default_detectors(missile: &MissileParameters) -> Vec<Box<dyn EventDetector>> {
    let mut detectors: Vec<Box<dyn EventDetector>> = vec![Box::new(MotorPhaseDetector), Box::new(LoftPhaseDetector)];
    if let Some(delay) = missile.guidance_delay.filter(|&d| d > 0.0) {
        detectors.push(Box::new(GuidanceDetector::new(delay)));
    }
    if let Some(cap) = missile.end_speed {
        detectors.push(Box::new(SpeedCapDetector::new(cap)));
    }
    detectors
}
