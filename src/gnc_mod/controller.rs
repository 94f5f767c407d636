use crate::dynamics::state::{EngagementParameters, LoftingPhase, State};

/// Pitch angle and loft phase chosen for the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCommand {
    pub pitch: f64, // rad
    pub phase: LoftingPhase,
}

/// Trait for pitch laws.
///
/// Implement this to plug a custom law into the simulation loop. The
/// previous sample carries the loft phase, so implementations need no
/// memory of their own to drive the state machine.
pub trait Guidance {
    /// Compute the pitch command from the previous sample and the engagement.
    fn command(&mut self, prev: &State, engagement: &EngagementParameters, dt: f64) -> PitchCommand;

    /// Reset internal state between runs.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
