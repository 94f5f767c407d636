use nalgebra::Vector2;

use crate::dynamics::state::{State, G};
use crate::error::Result;
use crate::gnc::{PitchCommand, TurnPerformance};
use crate::physics::{aerodynamics, atmosphere};
use crate::vehicle::{MissileParameters, MotorSample};

// ---------------------------------------------------------------------------
// Forward-Euler step of the planar point-mass model
// ---------------------------------------------------------------------------

/// Advance one step from `prev` under the given motor sample and pitch.
///
/// Drag and speed conversions use the air at the previous altitude. The
/// along-track acceleration integrates indicated airspeed; true airspeed
/// is derived from it, capped, and resolved along the pitch angle to move
/// the missile. The target drifts downrange at `target_speed` (m/s).
/// Turn performance is left at zero for the caller to fill in.
pub fn euler_step(
    prev: &State,
    missile: &MissileParameters,
    motor: MotorSample,
    command: PitchCommand,
    target_speed: f64,
    dt: f64,
) -> Result<State> {
    let air = atmosphere::sample(prev.altitude())?;

    let thrust_ias = air.true_to_indicated(motor.thrust);
    let drag = aerodynamics::drag_force(air.density, prev.ias, missile.cxk, missile.reference_area());
    let accel = (thrust_ias - drag) / motor.mass;

    let heading = Vector2::new(command.pitch.cos(), command.pitch.sin());
    let thrust_accel = heading * accel;
    let along_track = accel.signum() * thrust_accel.norm() - G * command.pitch.sin();

    let mut ias = prev.ias + along_track * dt;
    let mut tas = air.indicated_to_true(ias);
    if let Some(cap) = missile.end_speed {
        if tas > cap {
            tas = cap;
            ias = air.true_to_indicated(cap);
        }
    }

    let vel = heading * tas;
    let pos = prev.pos + vel * dt;
    let mach = atmosphere::mach_number(tas, pos.y)?;

    Ok(State {
        time: prev.time + dt,
        motor,
        ias,
        tas,
        mach,
        pos,
        vel,
        pitch: command.pitch,
        target_distance: prev.target_distance + target_speed * dt,
        drag,
        net_accel: accel,
        along_track_accel: along_track,
        twr: motor.thrust_to_weight(),
        turn: TurnPerformance::default(),
        loft: command.phase,
    })
}
