use log::warn;

use crate::dynamics::state::{EngagementParameters, LoftingPhase, State};
use crate::vehicle::MissileParameters;
use super::controller::{Guidance, PitchCommand};

// ---------------------------------------------------------------------------
// Loft guidance: climb, then dive onto the predicted intercept
// ---------------------------------------------------------------------------

/// Loft angle per unit of along-track acceleration and gain.
const LOFT_ACCEL_SCALE: f64 = 0.005;
/// Game rate units to degrees per second.
const OMEGA_SCALE: f64 = 9.0;
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct LoftProfile {
    climb: f64,      // rad
    dive: f64,       // rad
    rate: f64,       // rad/s
    accel_gain: f64,
}

/// Default pitch law: direct pursuit toward the predicted intercept point,
/// with an optional climb-then-dive loft program.
#[derive(Debug, Clone)]
pub struct LoftGuidance {
    loft: Option<LoftProfile>,
    lock_distance: Option<f64>,
    fallback_warned: bool,
}

impl LoftGuidance {
    pub fn new(missile: &MissileParameters) -> Self {
        let loft = missile.loft.map(|l| LoftProfile {
            climb: l.elevation.to_radians(),
            dive: l.target_elevation.to_radians(),
            rate: (l.omega_max * OMEGA_SCALE).to_radians(),
            accel_gain: l.accel_gain,
        });
        Self { loft, lock_distance: missile.lock_distance, fallback_warned: false }
    }

    pub fn is_lofting(&self) -> bool {
        self.loft.is_some()
    }

    /// Pursuit angle `atan(dalt / (t_intercept * ias))`, zero without a
    /// moving target. Falls back to the line-of-sight angle when the
    /// missile is not closing.
    fn pursuit_angle(&mut self, prev: &State, dalt: f64, remaining: f64, target_speed: f64) -> f64 {
        if target_speed <= 0.0 {
            return 0.0;
        }
        let closing = prev.vel.x - target_speed;
        if closing > EPS {
            let reach = remaining / closing * prev.ias;
            if reach > EPS {
                return (dalt / reach).atan();
            }
        }
        if !self.fallback_warned {
            warn!(
                "t={:.2}s: closing speed {:.1} m/s, using line-of-sight pursuit",
                prev.time, closing
            );
            self.fallback_warned = true;
        }
        if remaining > EPS {
            (dalt / remaining).atan()
        } else {
            0.0
        }
    }
}

/// Move `current` toward `desired` by at most `max_step`.
fn ramp(current: f64, desired: f64, max_step: f64) -> f64 {
    current + (desired - current).clamp(-max_step, max_step)
}

impl Guidance for LoftGuidance {
    fn command(&mut self, prev: &State, engagement: &EngagementParameters, dt: f64) -> PitchCommand {
        let remaining = prev.range_to_target();
        let dalt = engagement.target_altitude - prev.altitude();
        let target_speed = engagement.target_speed_ms();

        let mut phase = match (self.loft, prev.loft) {
            (None, _) => LoftingPhase::Inactive,
            (Some(_), LoftingPhase::Inactive) => LoftingPhase::Climbing,
            (Some(_), p) => p,
        };

        // Seeker lock: dive once inside half the lock range
        if let (Some(_), Some(lock)) = (self.loft, self.lock_distance) {
            if lock > 0.0 && remaining < lock / 2.0 {
                phase = LoftingPhase::Diving;
            }
        }

        let pitch = if remaining <= 0.0 {
            0.0
        } else if dalt > 0.0 {
            self.pursuit_angle(prev, dalt, remaining, target_speed)
        } else {
            match (phase, self.loft) {
                (LoftingPhase::Climbing, Some(loft)) => {
                    let desired = (prev.along_track_accel.abs() * loft.accel_gain * LOFT_ACCEL_SCALE).min(loft.climb);
                    let pitch = ramp(prev.pitch, desired, loft.rate * dt);
                    if target_speed > 0.0 && (dalt / remaining).atan().abs() >= loft.dive {
                        phase = LoftingPhase::Diving;
                    }
                    pitch
                }
                (LoftingPhase::Diving, Some(loft)) => {
                    let pursuit = self.pursuit_angle(prev, dalt, remaining, target_speed);
                    ramp(prev.pitch, pursuit, loft.rate * dt)
                }
                _ => 0.0,
            }
        };

        PitchCommand { pitch, phase }
    }

    fn reset(&mut self) {
        self.fallback_warned = false;
    }

    fn name(&self) -> &str {
        if self.is_lofting() {
            "loft"
        } else {
            "pursuit"
        }
    }
}
