use serde::Serialize;

use crate::dynamics::state::{State, G};
use crate::physics::aerodynamics::lift_coefficient;
use crate::vehicle::MissileParameters;

// ---------------------------------------------------------------------------
// Turn / load limiter
// ---------------------------------------------------------------------------

/// Achievable turn at one sample. All zero while guidance is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TurnPerformance {
    pub rate: f64,   // game units, see `TurnLimiter::evaluate`
    pub radius: f64, // m
    pub g_load: f64, // g
}

impl TurnPerformance {
    pub fn is_active(&self) -> bool {
        self.rate > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct TurnLimiter {
    lift_coefficient: f64,
    wing_area: f64,   // m^2
    arm: f64,         // m, CG to stabilizer
    tvc: f64,         // rad
    max_load: Option<f64>,
    guidance_delay: f64,
}

impl TurnLimiter {
    pub fn new(missile: &MissileParameters) -> Self {
        Self {
            lift_coefficient: lift_coefficient(missile.fin_aoa.to_radians()),
            wing_area: missile.wing_area,
            arm: missile.dist_cm_stab,
            tvc: missile.tvc.to_radians(),
            max_load: missile.max_load,
            guidance_delay: missile.guidance_delay.unwrap_or(0.0),
        }
    }

    pub fn guidance_active(&self, time: f64) -> bool {
        time >= self.guidance_delay
    }

    /// Turn performance for a freshly integrated sample.
    ///
    /// `rate = (Cl*S*q_ias*D + tvc*D*T) / m * dt`, `radius = tas / rate`,
    /// `g = tas^2 / (radius * G)`, then clamped to the load cap by
    /// shrinking the turn. `density` is taken at the previous altitude.
    pub fn evaluate(&self, state: &State, density: f64, dt: f64) -> TurnPerformance {
        if !self.guidance_active(state.time) || state.mass() <= 0.0 {
            return TurnPerformance::default();
        }

        let mass = state.mass();
        let dynamic_pressure = 0.5 * density * state.ias * state.ias;
        let aero = self.lift_coefficient * self.wing_area * dynamic_pressure * self.arm / mass;
        let vectored = self.tvc * self.arm * state.thrust() / mass;
        let rate = (aero + vectored) * dt;

        let tas = state.tas;
        if !(rate > f64::EPSILON) || tas <= 0.0 {
            return TurnPerformance::default();
        }

        let radius = tas / rate;
        let g_load = tas * tas / (radius * G);

        match self.max_load {
            Some(limit) if limit > 0.0 && g_load >= limit => {
                let radius = tas * tas / (limit * G);
                TurnPerformance { rate: tas / radius, radius, g_load: limit }
            }
            _ => TurnPerformance { rate, radius, g_load },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::EngagementParameters;
    use crate::vehicle::{MissileBuilder, MotorPhase, MotorSample};
    use approx::assert_relative_eq;

    const DT: f64 = 0.01;

    fn state_at(time: f64) -> State {
        let motor = MotorSample { mass: 100.0, thrust: 5000.0, phase: MotorPhase::Boost };
        let mut s = State::launch(&EngagementParameters::default(), motor).unwrap();
        s.time = time;
        s
    }

    fn builder() -> MissileBuilder {
        MissileBuilder::new("turn").fin_aoa(30.0).wing_area(0.1).dist_cm_stab(0.5)
    }

    #[test]
    fn inactive_before_guidance_delay() {
        let limiter = TurnLimiter::new(&builder().guidance_delay(1.0).build().unwrap());
        let t = limiter.evaluate(&state_at(0.99), 0.53, DT);
        assert_eq!(t, TurnPerformance::default());
        assert!(limiter.evaluate(&state_at(1.0), 0.53, DT).is_active());
    }

    #[test]
    fn unclamped_turn_matches_formula() {
        let m = builder().build().unwrap();
        let limiter = TurnLimiter::new(&m);
        let s = state_at(2.0);
        let t = limiter.evaluate(&s, 0.53, DT);

        let cl = lift_coefficient(30.0_f64.to_radians());
        let rate = cl * 0.1 * 0.5 * 0.53 * s.ias * s.ias * 0.5 / 100.0 * DT;
        assert_relative_eq!(t.rate, rate, epsilon = 1e-12);
        assert_relative_eq!(t.radius, s.tas / rate, epsilon = 1e-9);
        assert_relative_eq!(t.g_load, s.tas * s.tas / (t.radius * G), epsilon = 1e-9);
    }

    #[test]
    fn load_cap_shrinks_turn() {
        let free = TurnLimiter::new(&builder().build().unwrap()).evaluate(&state_at(2.0), 0.53, DT);
        let cap = free.g_load / 2.0;
        let limiter = TurnLimiter::new(&builder().max_load(cap).build().unwrap());
        let s = state_at(2.0);
        let t = limiter.evaluate(&s, 0.53, DT);
        assert_eq!(t.g_load, cap);
        assert_relative_eq!(t.radius, s.tas * s.tas / (cap * G), epsilon = 1e-9);
        assert_relative_eq!(t.rate, s.tas / t.radius, epsilon = 1e-12);
    }

    #[test]
    fn zero_load_cap_is_unclamped() {
        let free = TurnLimiter::new(&builder().build().unwrap()).evaluate(&state_at(2.0), 0.53, DT);
        let zero = TurnLimiter::new(&builder().max_load(0.0).build().unwrap()).evaluate(&state_at(2.0), 0.53, DT);
        assert_eq!(free, zero);
    }

    #[test]
    fn no_lift_no_tvc_means_no_turn() {
        let limiter = TurnLimiter::new(&MissileBuilder::new("dart").build().unwrap());
        assert_eq!(limiter.evaluate(&state_at(2.0), 0.53, DT), TurnPerformance::default());
    }

    #[test]
    fn thrust_vectoring_turns_without_wings() {
        let m = MissileBuilder::new("tvc").tvc(10.0).dist_cm_stab(1.0).build().unwrap();
        let t = TurnLimiter::new(&m).evaluate(&state_at(1.0), 0.53, DT);
        assert_relative_eq!(t.rate, 10.0_f64.to_radians() * 5000.0 / 100.0 * DT, epsilon = 1e-12);
    }
}
