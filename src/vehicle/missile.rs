use serde::Serialize;

use crate::dynamics::state::G;
use crate::error::{Result, SimError};
use crate::physics::aerodynamics;

// ---------------------------------------------------------------------------
// Missile definition
// ---------------------------------------------------------------------------

/// Loft program. Present only when climb angle, dive angle and angular
/// rate are all configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loft {
    pub elevation: f64,        // deg, maximum climb angle
    pub target_elevation: f64, // deg, line-of-sight angle that starts the dive
    pub omega_max: f64,        // pitch rate limit (game units, see guidance)
    pub accel_gain: f64,       // loft angle per unit of acceleration
}

/// Immutable parameter set of one missile, as read from the game data.
#[derive(Debug, Clone, PartialEq)]
pub struct MissileParameters {
    pub name: String,
    pub caliber: f64,             // m
    pub cxk: f64,                 // drag coefficient
    pub mass: f64,                // kg, at launch
    pub mass_end_booster: f64,    // kg, after booster burn
    pub mass_end_sustainer: f64,  // kg, after sustainer burn (0 = none)
    pub time_fire_booster: f64,   // s
    pub time_fire_sustainer: f64, // s
    pub force_booster: f64,       // N
    pub force_sustainer: f64,     // N
    pub time_life: f64,           // s, maximum flight time
    pub end_speed: Option<f64>,   // m/s, TAS cap
    pub max_distance: Option<f64>, // m, downrange cutoff
    pub loft: Option<Loft>,
    pub lock_distance: Option<f64>, // m, seeker range
    pub guidance_delay: Option<f64>, // s
    pub max_load: Option<f64>,    // g; Some(0.0) means unclamped
    pub dist_cm_stab: f64,        // m, CG to stabilizer
    pub wing_area: f64,           // m^2
    pub fin_aoa: f64,             // deg
    pub tvc: f64,                 // deg, thrust vector deflection
}

impl MissileParameters {
    /// Sustainer runs only with burn time, force and end mass all positive.
    pub fn has_sustainer(&self) -> bool {
        self.time_fire_sustainer > 0.0 && self.force_sustainer > 0.0 && self.mass_end_sustainer > 0.0
    }

    /// Mass held during the coast phase.
    pub fn burnout_mass(&self) -> f64 {
        if self.has_sustainer() {
            self.mass_end_sustainer
        } else {
            self.mass_end_booster
        }
    }

    pub fn reference_area(&self) -> f64 {
        aerodynamics::reference_area(self.caliber)
    }

    /// Check the invariants the simulation relies on.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("caliber", self.caliber),
            ("cxk", self.cxk),
            ("mass", self.mass),
            ("mass_end_booster", self.mass_end_booster),
            ("mass_end_sustainer", self.mass_end_sustainer),
            ("time_fire_booster", self.time_fire_booster),
            ("time_fire_sustainer", self.time_fire_sustainer),
            ("force_booster", self.force_booster),
            ("force_sustainer", self.force_sustainer),
            ("time_life", self.time_life),
            ("dist_cm_stab", self.dist_cm_stab),
            ("wing_area", self.wing_area),
        ] {
            non_negative(field, value)?;
        }
        if self.mass <= 0.0 {
            return Err(SimError::invalid("mass", "launch mass must be positive"));
        }
        if self.mass_end_booster <= 0.0 {
            return Err(SimError::invalid("mass_end_booster", "must be positive"));
        }
        if self.mass_end_booster > self.mass {
            return Err(SimError::invalid(
                "mass_end_booster",
                format!("{} kg exceeds launch mass {} kg", self.mass_end_booster, self.mass),
            ));
        }
        if self.has_sustainer() && self.mass_end_sustainer > self.mass_end_booster {
            return Err(SimError::invalid(
                "mass_end_sustainer",
                format!(
                    "{} kg exceeds post-booster mass {} kg",
                    self.mass_end_sustainer, self.mass_end_booster
                ),
            ));
        }
        if let Some(v) = self.end_speed {
            if !(v > 0.0) {
                return Err(SimError::invalid("end_speed", "speed cap must be positive"));
            }
        }
        for (field, value) in [
            ("max_distance", self.max_distance),
            ("lock_distance", self.lock_distance),
            ("guidance_delay", self.guidance_delay),
            ("max_load", self.max_load),
        ] {
            if let Some(v) = value {
                non_negative(field, v)?;
            }
        }
        if let Some(loft) = &self.loft {
            if !(loft.elevation > 0.0 && loft.target_elevation > 0.0 && loft.omega_max > 0.0) {
                return Err(SimError::invalid(
                    "loft",
                    "elevation, target elevation and omega must all be positive",
                ));
            }
            non_negative("loft_angle_acceleration", loft.accel_gain)?;
        }
        Ok(())
    }

    /// Derived motor and drag figures. Sustainer figures are zero unless
    /// the sustainer actually fires in flight.
    pub fn performance(&self) -> Performance {
        let booster_propellant = self.mass - self.mass_end_booster;
        let booster_impulse = self.force_booster * self.time_fire_booster;
        let booster_isp = specific_impulse(booster_impulse, booster_propellant);
        let booster_delta_v = delta_v(booster_isp, self.mass, self.mass_end_booster);

        let (sustainer_propellant, sustainer_impulse, sustainer_time) = if self.has_sustainer() {
            (
                self.mass_end_booster - self.mass_end_sustainer,
                self.force_sustainer * self.time_fire_sustainer,
                self.time_fire_sustainer,
            )
        } else {
            (0.0, 0.0, 0.0)
        };
        let sustainer_isp = specific_impulse(sustainer_impulse, sustainer_propellant);
        let sustainer_delta_v = delta_v(sustainer_isp, self.mass_end_booster, self.burnout_mass());

        let area = self.reference_area();
        let relative_drag = self.cxk * area;
        let final_mass = self.burnout_mass();

        Performance {
            booster_propellant,
            sustainer_propellant,
            engine_mass: booster_propellant + sustainer_propellant,
            booster_impulse,
            sustainer_impulse,
            total_impulse: booster_impulse + sustainer_impulse,
            booster_isp,
            sustainer_isp,
            booster_delta_v,
            sustainer_delta_v,
            total_delta_v: booster_delta_v + sustainer_delta_v,
            total_burn_time: self.time_fire_booster + sustainer_time,
            reference_area: area,
            relative_drag,
            drag_to_weight: if final_mass > 0.0 { relative_drag / final_mass * 1000.0 } else { 0.0 },
            launch_twr: if self.mass > 0.0 { self.force_booster / (self.mass * G) } else { 0.0 },
        }
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(field, format!("must be finite and non-negative, got {value}")))
    }
}

/// Isp = I / (g * dm); zero when no propellant is burned.
fn specific_impulse(impulse: f64, propellant: f64) -> f64 {
    if propellant > 0.0 {
        impulse / (G * propellant)
    } else {
        0.0
    }
}

/// Tsiolkovsky delta-v; zero for degenerate mass ratios.
fn delta_v(isp: f64, m0: f64, m1: f64) -> f64 {
    if m0 > 0.0 && m1 > 0.0 {
        isp * G * (m0 / m1).ln()
    } else {
        0.0
    }
}

/// Motor and drag figures derived from a parameter set.
#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub booster_propellant: f64,
    pub sustainer_propellant: f64,
    /// Total propellant burned.
    pub engine_mass: f64,
    pub booster_impulse: f64,
    pub sustainer_impulse: f64,
    pub total_impulse: f64,
    pub booster_isp: f64,
    pub sustainer_isp: f64,
    pub booster_delta_v: f64,
    pub sustainer_delta_v: f64,
    pub total_delta_v: f64,
    pub total_burn_time: f64,
    pub reference_area: f64,
    pub relative_drag: f64,
    pub drag_to_weight: f64,
    pub launch_twr: f64,
}

// ---------------------------------------------------------------------------
// Missile builder
// ---------------------------------------------------------------------------

pub struct MissileBuilder {
    params: MissileParameters,
}

impl MissileBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            params: MissileParameters {
                name: name.into(),
                caliber: 0.2,
                cxk: 0.5,
                mass: 100.0,
                mass_end_booster: 80.0,
                mass_end_sustainer: 0.0,
                time_fire_booster: 3.0,
                time_fire_sustainer: 0.0,
                force_booster: 5000.0,
                force_sustainer: 0.0,
                time_life: 30.0,
                end_speed: None,
                max_distance: None,
                loft: None,
                lock_distance: None,
                guidance_delay: None,
                max_load: None,
                dist_cm_stab: 0.0,
                wing_area: 0.0,
                fin_aoa: 0.0,
                tvc: 0.0,
            },
        }
    }

    pub fn caliber(mut self, v: f64) -> Self { self.params.caliber = v; self }
    pub fn cxk(mut self, v: f64) -> Self { self.params.cxk = v; self }
    pub fn mass(mut self, v: f64) -> Self { self.params.mass = v; self }
    pub fn mass_end_booster(mut self, v: f64) -> Self { self.params.mass_end_booster = v; self }
    pub fn mass_end_sustainer(mut self, v: f64) -> Self { self.params.mass_end_sustainer = v; self }
    pub fn booster(mut self, force: f64, time: f64) -> Self {
        self.params.force_booster = force;
        self.params.time_fire_booster = time;
        self
    }
    pub fn sustainer(mut self, force: f64, time: f64) -> Self {
        self.params.force_sustainer = force;
        self.params.time_fire_sustainer = time;
        self
    }
    pub fn time_life(mut self, v: f64) -> Self { self.params.time_life = v; self }
    pub fn end_speed(mut self, v: f64) -> Self { self.params.end_speed = Some(v); self }
    pub fn max_distance(mut self, v: f64) -> Self { self.params.max_distance = Some(v); self }
    pub fn loft(mut self, loft: Loft) -> Self { self.params.loft = Some(loft); self }
    pub fn lock_distance(mut self, v: f64) -> Self { self.params.lock_distance = Some(v); self }
    pub fn guidance_delay(mut self, v: f64) -> Self { self.params.guidance_delay = Some(v); self }
    pub fn max_load(mut self, v: f64) -> Self { self.params.max_load = Some(v); self }
    pub fn dist_cm_stab(mut self, v: f64) -> Self { self.params.dist_cm_stab = v; self }
    pub fn wing_area(mut self, v: f64) -> Self { self.params.wing_area = v; self }
    pub fn fin_aoa(mut self, v: f64) -> Self { self.params.fin_aoa = v; self }
    pub fn tvc(mut self, v: f64) -> Self { self.params.tvc = v; self }

    pub fn build(self) -> Result<MissileParameters> {
        self.params.validate()?;
        Ok(self.params)
    }
}

// ---------------------------------------------------------------------------
// Preset missiles
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Short-range infrared missile: single booster, no loft.
    pub fn short_range() -> MissileParameters {
        MissileParameters {
            name: "SR-IR".into(),
            caliber: 0.127,
            cxk: 0.45,
            mass: 86.0,
            mass_end_booster: 62.0,
            mass_end_sustainer: 0.0,
            time_fire_booster: 2.2,
            time_fire_sustainer: 0.0,
            force_booster: 14_000.0,
            force_sustainer: 0.0,
            time_life: 40.0,
            end_speed: None,
            max_distance: None,
            loft: None,
            lock_distance: None,
            guidance_delay: Some(0.5),
            max_load: Some(30.0),
            dist_cm_stab: 0.3,
            wing_area: 0.06,
            fin_aoa: 20.0,
            tvc: 0.0,
        }
    }

    /// Medium-range radar missile: booster + sustainer with a loft program.
    pub fn medium_range() -> MissileParameters {
        MissileParameters {
            name: "MR-ARH".into(),
            caliber: 0.178,
            cxk: 0.45,
            mass: 161.0,
            mass_end_booster: 135.0,
            mass_end_sustainer: 120.0,
            time_fire_booster: 3.0,
            time_fire_sustainer: 5.0,
            force_booster: 24_000.0,
            force_sustainer: 6_000.0,
            time_life: 80.0,
            end_speed: None,
            max_distance: None,
            loft: Some(Loft {
                elevation: 25.0,
                target_elevation: 12.0,
                omega_max: 6.0,
                accel_gain: 1.5,
            }),
            lock_distance: Some(15_000.0),
            guidance_delay: Some(0.5),
            max_load: Some(40.0),
            dist_cm_stab: 0.4,
            wing_area: 0.1,
            fin_aoa: 25.0,
            tvc: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn presets_are_valid() {
        presets::short_range().validate().unwrap();
        presets::medium_range().validate().unwrap();
    }

    #[test]
    fn sustainer_requires_force_time_and_mass() {
        let m = presets::medium_range();
        assert!(m.has_sustainer());
        assert_eq!(m.burnout_mass(), 120.0);

        let no_force = MissileParameters { force_sustainer: 0.0, ..m.clone() };
        assert!(!no_force.has_sustainer());
        assert_eq!(no_force.burnout_mass(), 135.0);

        let no_mass = MissileParameters { mass_end_sustainer: 0.0, ..m };
        assert!(!no_mass.has_sustainer());
    }

    #[test]
    fn builder_rejects_booster_mass_above_launch_mass() {
        let err = MissileBuilder::new("bad").mass(50.0).mass_end_booster(60.0).build();
        assert!(matches!(err, Err(SimError::InvalidParameters { field: "mass_end_booster", .. })));
    }

    #[test]
    fn builder_rejects_negative_durations() {
        let err = MissileBuilder::new("bad").booster(5000.0, -1.0).build();
        assert!(matches!(err, Err(SimError::InvalidParameters { field: "time_fire_booster", .. })));
    }

    #[test]
    fn builder_rejects_heavier_sustainer_end_mass() {
        let err = MissileBuilder::new("bad")
            .mass_end_sustainer(90.0)
            .sustainer(1000.0, 5.0)
            .build();
        assert!(matches!(err, Err(SimError::InvalidParameters { field: "mass_end_sustainer", .. })));
    }

    #[test]
    fn zero_load_cap_is_accepted() {
        let m = MissileBuilder::new("ok").max_load(0.0).build().unwrap();
        assert_eq!(m.max_load, Some(0.0));
    }

    #[test]
    fn loft_needs_positive_angles() {
        let err = MissileBuilder::new("bad")
            .loft(Loft { elevation: 20.0, target_elevation: 0.0, omega_max: 5.0, accel_gain: 1.0 })
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn booster_performance_figures() {
        let m = MissileBuilder::new("p").build().unwrap();
        let p = m.performance();
        assert_relative_eq!(p.booster_propellant, 20.0);
        assert_relative_eq!(p.booster_impulse, 15_000.0);
        assert_relative_eq!(p.booster_isp, 15_000.0 / (G * 20.0), epsilon = 1e-9);
        assert_relative_eq!(p.booster_delta_v, 15_000.0 / 20.0 * (100.0_f64 / 80.0).ln(), epsilon = 1e-9);
        assert_eq!(p.sustainer_isp, 0.0);
        assert_eq!(p.sustainer_delta_v, 0.0);
        assert_relative_eq!(p.relative_drag, 0.5 * m.reference_area());
        assert_relative_eq!(p.drag_to_weight, p.relative_drag / 80.0 * 1000.0);
    }

    #[test]
    fn sustainer_figures_follow_burnout_mass() {
        // end mass recorded but no sustainer thrust: the missile coasts at booster end mass
        let m = MissileBuilder::new("no-sustain").mass_end_sustainer(60.0).build().unwrap();
        assert!(!m.has_sustainer());
        let p = m.performance();
        assert_eq!(p.sustainer_propellant, 0.0);
        assert_eq!(p.sustainer_delta_v, 0.0);
        assert_relative_eq!(p.engine_mass, 20.0);
        assert_relative_eq!(p.drag_to_weight, p.relative_drag / m.burnout_mass() * 1000.0);
        assert_relative_eq!(p.total_burn_time, 3.0);
    }

    #[test]
    fn engine_mass_sums_both_motors() {
        let p = presets::medium_range().performance();
        assert_relative_eq!(p.booster_propellant, 26.0);
        assert_relative_eq!(p.sustainer_propellant, 15.0);
        assert_relative_eq!(p.engine_mass, 41.0);
        assert_relative_eq!(p.total_burn_time, 8.0);
        assert!(p.sustainer_delta_v > 0.0);
    }

    #[test]
    fn degenerate_motor_has_zero_isp() {
        let m = MissileBuilder::new("inert").mass(80.0).mass_end_booster(80.0).build().unwrap();
        let p = m.performance();
        assert_eq!(p.booster_isp, 0.0);
        assert_eq!(p.booster_delta_v, 0.0);
    }
}
