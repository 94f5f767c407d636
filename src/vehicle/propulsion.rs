use std::fmt;

use serde::Serialize;

use crate::dynamics::state::{steps_for, G};
use crate::vehicle::MissileParameters;

// ---------------------------------------------------------------------------
// Motor phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotorPhase {
    Boost,
    Sustain,
    Coast,
}

impl fmt::Display for MotorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MotorPhase::Boost => "boost",
            MotorPhase::Sustain => "sustain",
            MotorPhase::Coast => "coast",
        };
        f.write_str(s)
    }
}

/// Mass and thrust at one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSample {
    pub mass: f64,   // kg
    pub thrust: f64, // N
    pub phase: MotorPhase,
}

impl MotorSample {
    /// Thrust over weight; zero for a massless sample.
    pub fn thrust_to_weight(&self) -> f64 {
        if self.mass > 0.0 {
            self.thrust / (self.mass * G)
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Burn schedule
// ---------------------------------------------------------------------------

/// One burning phase discretized into `steps` samples.
#[derive(Debug, Clone, Copy)]
struct Burn {
    steps: usize,
    start_mass: f64,
    end_mass: f64,
    thrust: f64,
    phase: MotorPhase,
}

impl Burn {
    fn new(duration: f64, dt: f64, start_mass: f64, end_mass: f64, thrust: f64, phase: MotorPhase) -> Self {
        Self { steps: steps_for(duration, dt), start_mass, end_mass, thrust, phase }
    }

    /// Linear mass ramp with `steps - 1` as divisor so the final step
    /// reaches the end mass. A one-step burn holds the start mass.
    fn sample(&self, k: usize) -> MotorSample {
        let mass = if self.steps > 1 {
            let rate = (self.start_mass - self.end_mass) / (self.steps - 1) as f64;
            (self.start_mass - k as f64 * rate).max(self.end_mass)
        } else {
            self.start_mass
        };
        MotorSample { mass, thrust: self.thrust, phase: self.phase }
    }
}

/// Per-step mass and thrust across boost, sustain and coast.
#[derive(Debug, Clone)]
pub struct PropulsionStager {
    boost: Burn,
    sustain: Option<Burn>,
    coast_mass: f64,
}

impl PropulsionStager {
    pub fn new(missile: &MissileParameters, dt: f64) -> Self {
        let boost = Burn::new(
            missile.time_fire_booster,
            dt,
            missile.mass,
            missile.mass_end_booster,
            missile.force_booster,
            MotorPhase::Boost,
        );
        let sustain = missile.has_sustainer().then(|| {
            Burn::new(
                missile.time_fire_sustainer,
                dt,
                missile.mass_end_booster,
                missile.mass_end_sustainer,
                missile.force_sustainer,
                MotorPhase::Sustain,
            )
        });
        Self { boost, sustain, coast_mass: missile.burnout_mass() }
    }

    /// Motor state at step `i` (time `i * dt`).
    pub fn at_step(&self, i: usize) -> MotorSample {
        if i < self.boost.steps {
            return self.boost.sample(i);
        }
        let k = i - self.boost.steps;
        match &self.sustain {
            Some(sustain) if k < sustain.steps => sustain.sample(k),
            _ => MotorSample { mass: self.coast_mass, thrust: 0.0, phase: MotorPhase::Coast },
        }
    }

    /// First step of the coast phase.
    pub fn burnout_step(&self) -> usize {
        self.boost.steps + self.sustain.map_or(0, |s| s.steps)
    }
}
