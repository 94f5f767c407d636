use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::gnc::TurnPerformance;
use crate::physics::atmosphere;
use crate::vehicle::MotorSample;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Gravitational acceleration of the flight model, m/s^2.
pub const G: f64 = 9.81;
pub const KMH_PER_MS: f64 = 3.6;

// ---------------------------------------------------------------------------
// Loft state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoftingPhase {
    #[default]
    Inactive,
    Climbing,
    Diving,
}

impl fmt::Display for LoftingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoftingPhase::Inactive => "inactive",
            LoftingPhase::Climbing => "climbing",
            LoftingPhase::Diving => "diving",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Planar flight state: one sample per timestep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub time: f64,
    pub motor: MotorSample,         // mass, thrust, motor phase
    pub ias: f64,                   // m/s, indicated airspeed
    pub tas: f64,                   // m/s, true airspeed
    pub mach: f64,
    pub pos: Vector2<f64>,          // m, x = downrange, y = altitude
    pub vel: Vector2<f64>,          // m/s
    pub pitch: f64,                 // rad, flight-path angle
    pub target_distance: f64,       // m, target downrange position
    pub drag: f64,                  // N
    pub net_accel: f64,             // m/s^2, (indicated thrust - drag) / mass
    pub along_track_accel: f64,     // m/s^2, net_accel resolved with gravity
    pub twr: f64,                   // thrust-to-weight
    pub turn: TurnPerformance,
    pub loft: LoftingPhase,
}

impl State {
    /// Sample 0: level flight at the launcher's speed and altitude.
    pub fn launch(engagement: &EngagementParameters, motor: MotorSample) -> Result<State> {
        let air = atmosphere::sample(engagement.launch_altitude)?;
        let tas = engagement.launch_speed_ms();
        Ok(State {
            time: 0.0,
            motor,
            ias: air.true_to_indicated(tas),
            tas,
            mach: air.mach(tas),
            pos: Vector2::new(0.0, engagement.launch_altitude),
            vel: Vector2::new(tas, 0.0),
            pitch: 0.0,
            target_distance: engagement.target_range_m(),
            drag: 0.0,
            net_accel: 0.0,
            along_track_accel: 0.0,
            twr: motor.thrust_to_weight(),
            turn: TurnPerformance::default(),
            loft: LoftingPhase::Inactive,
        })
    }

    /// Clamp true airspeed to `cap` at the current altitude, back-converting
    /// indicated airspeed and Mach.
    pub fn with_speed_cap(mut self, cap: Option<f64>) -> Result<State> {
        if let Some(cap) = cap.filter(|&c| self.tas > c) {
            let air = atmosphere::sample(self.altitude())?;
            self.tas = cap;
            self.ias = air.true_to_indicated(cap);
            self.mach = air.mach(cap);
            self.vel = Vector2::new(self.pitch.cos(), self.pitch.sin()) * cap;
        }
        Ok(self)
    }

    pub fn mass(&self) -> f64 {
        self.motor.mass
    }

    pub fn thrust(&self) -> f64 {
        self.motor.thrust
    }

    pub fn downrange(&self) -> f64 {
        self.pos.x
    }

    pub fn altitude(&self) -> f64 {
        self.pos.y
    }

    /// Target downrange position minus own downrange position.
    pub fn range_to_target(&self) -> f64 {
        self.target_distance - self.pos.x
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch.to_degrees()
    }
}

// ---------------------------------------------------------------------------
// Engagement geometry (launcher and target)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementParameters {
    pub launch_speed: f64,    // km/h TAS
    pub launch_altitude: f64, // m
    pub target_speed: f64,    // km/h TAS, flying away from the launcher
    pub target_range: f64,    // km
    pub target_altitude: f64, // m
}

impl Default for EngagementParameters {
    fn default() -> Self {
        Self {
            launch_speed: 1224.0,
            launch_altitude: 1000.0,
            target_speed: 0.0,
            target_range: 0.0,
            target_altitude: 1000.0,
        }
    }
}

impl EngagementParameters {
    pub fn launch_speed_ms(&self) -> f64 {
        self.launch_speed / KMH_PER_MS
    }

    pub fn target_speed_ms(&self) -> f64 {
        self.target_speed / KMH_PER_MS
    }

    pub fn target_range_m(&self) -> f64 {
        self.target_range * 1000.0
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("launch_speed", self.launch_speed),
            ("target_speed", self.target_speed),
            ("target_range", self.target_range),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::invalid(field, format!("must be finite and non-negative, got {value}")));
            }
        }
        for (field, value) in [
            ("launch_altitude", self.launch_altitude),
            ("target_altitude", self.target_altitude),
        ] {
            if !value.is_finite() {
                return Err(SimError::invalid(field, "must be finite"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { dt: 0.01 } // 100 Hz
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dt.is_finite() && self.dt > 0.0 {
            Ok(())
        } else {
            Err(SimError::invalid("dt", format!("timestep must be positive, got {}", self.dt)))
        }
    }

    /// Number of samples covering `duration` inclusive of both endpoints.
    pub fn sample_count(&self, duration: f64) -> usize {
        steps_for(duration, self.dt) + 1
    }
}

/// `ceil(duration / dt)`, tolerant of the representation error in values
/// like `0.3 / 0.01`. Zero for non-positive durations.
pub fn steps_for(duration: f64, dt: f64) -> usize {
    if duration <= 0.0 || dt <= 0.0 {
        return 0;
    }
    let exact = duration / dt;
    (exact - 1e-9 * exact.max(1.0)).ceil().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::MotorPhase;
    use approx::assert_relative_eq;

    fn coast(mass: f64) -> MotorSample {
        MotorSample { mass, thrust: 0.0, phase: MotorPhase::Coast }
    }

    #[test]
    fn engagement_defaults() {
        let e = EngagementParameters::default();
        assert_eq!(e.launch_speed, 1224.0);
        assert_eq!(e.launch_altitude, 1000.0);
        assert_eq!(e.target_speed, 0.0);
        assert_eq!(e.target_range, 0.0);
        assert_eq!(e.target_altitude, 1000.0);
        assert_relative_eq!(e.launch_speed_ms(), 340.0, epsilon = 1e-9);
    }

    #[test]
    fn engagement_deserializes_with_missing_fields() {
        let e: EngagementParameters = serde_json::from_str(r#"{"target_range": 20}"#).unwrap();
        assert_eq!(e.target_range, 20.0);
        assert_eq!(e.launch_altitude, 1000.0);
        assert_relative_eq!(e.target_range_m(), 20_000.0);
    }

    #[test]
    fn negative_target_speed_rejected() {
        let e = EngagementParameters { target_speed: -10.0, ..Default::default() };
        assert!(e.validate().is_err());
    }

    #[test]
    fn sample_count_includes_endpoint() {
        let c = SimConfig::default();
        assert_eq!(c.sample_count(5.0), 501);
        assert_eq!(c.sample_count(0.3), 31);
        assert_eq!(c.sample_count(0.0), 1);
        assert_eq!(steps_for(2.995, 0.01), 300);
    }

    #[test]
    fn non_positive_dt_rejected() {
        assert!(SimConfig { dt: 0.0 }.validate().is_err());
        assert!(SimConfig { dt: -0.01 }.validate().is_err());
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn launch_state_is_level_at_launcher_speed() {
        let e = EngagementParameters { launch_altitude: 0.0, target_range: 10.0, ..Default::default() };
        let s = State::launch(&e, coast(80.0)).unwrap();
        assert_relative_eq!(s.tas, 340.0, epsilon = 1e-9);
        assert_relative_eq!(s.ias, 340.0, epsilon = 1e-9);
        assert_relative_eq!(s.mach, 1.0, epsilon = 1e-12);
        assert_eq!(s.vel.y, 0.0);
        assert_relative_eq!(s.range_to_target(), 10_000.0);
        assert_eq!(s.loft, LoftingPhase::Inactive);
    }

    #[test]
    fn launch_speed_above_cap_is_clamped() {
        let e = EngagementParameters { launch_altitude: 1000.0, ..Default::default() };
        let s = State::launch(&e, coast(80.0)).unwrap().with_speed_cap(Some(300.0)).unwrap();
        assert_eq!(s.tas, 300.0);
        assert_relative_eq!(s.vel.x, 300.0);
        assert_relative_eq!(atmosphere::indicated_to_true(s.ias, 1000.0).unwrap(), 300.0, epsilon = 1e-9);
        assert_relative_eq!(s.mach, atmosphere::mach_number(300.0, 1000.0).unwrap(), epsilon = 1e-9);
    }

    #[test]
    fn launch_speed_below_cap_is_untouched() {
        let e = EngagementParameters::default();
        let s = State::launch(&e, coast(80.0)).unwrap();
        let capped = s.clone().with_speed_cap(Some(400.0)).unwrap();
        assert_eq!(capped, s);
        assert_eq!(s.clone().with_speed_cap(None).unwrap(), s);
    }

    #[test]
    fn launch_above_table_is_out_of_range() {
        let e = EngagementParameters { launch_altitude: 25_000.0, ..Default::default() };
        assert!(matches!(State::launch(&e, coast(80.0)), Err(SimError::OutOfRange { .. })));
    }
}
