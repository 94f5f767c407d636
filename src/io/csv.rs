use std::io::{self, Write};
use std::path::Path;

use crate::dynamics::state::State;

/// Write trajectory samples in CSV format.
///
/// Columns: time, mass, thrust, motor_phase, ias, tas, mach, vx, vy,
///          pitch_deg, downrange, altitude, target_distance, range_to_target,
///          drag, net_accel, along_track_accel, twr, turn_rate, turn_radius, g_load, loft_phase
pub fn write_trajectory<W: Write>(writer: &mut W, samples: &[State]) -> io::Result<()> {
    writeln!(
        writer,
        "time,mass,thrust,motor_phase,ias,tas,mach,vx,vy,\
         pitch_deg,downrange,altitude,target_distance,range_to_target,\
         drag,net_accel,along_track_accel,twr,turn_rate,turn_radius,g_load,loft_phase"
    )?;

    for s in samples {
        writeln!(
            writer,
            "{:.2},{:.4},{:.1},{},{:.3},{:.3},{:.4},{:.3},{:.3},\
             {:.4},{:.2},{:.2},{:.2},{:.2},\
             {:.3},{:.4},{:.4},{:.4},{:.6},{:.2},{:.4},{}",
            s.time,
            s.mass(),
            s.thrust(),
            s.motor.phase,
            s.ias,
            s.tas,
            s.mach,
            s.vel.x,
            s.vel.y,
            s.pitch_deg(),
            s.downrange(),
            s.altitude(),
            s.target_distance,
            s.range_to_target(),
            s.drag,
            s.net_accel,
            s.along_track_accel,
            s.twr,
            s.turn.rate,
            s.turn.radius,
            s.turn.g_load,
            s.loft,
        )?;
    }

    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file(path: impl AsRef<Path>, samples: &[State]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_trajectory(&mut file, samples)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::EngagementParameters;
    use crate::vehicle::{MotorPhase, MotorSample};

    #[test]
    fn csv_output_has_header_and_rows() {
        let motor = MotorSample { mass: 100.0, thrust: 5000.0, phase: MotorPhase::Boost };
        let first = State::launch(&EngagementParameters::default(), motor).unwrap();
        let mut second = first.clone();
        second.time = 0.01;
        second.pos.x = 3.4;

        let mut buf = Vec::new();
        write_trajectory(&mut buf, &[first, second]).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,mass,thrust,motor_phase"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("0.00,100.0000,5000.0,boost,"));
        assert!(lines[2].ends_with(",inactive"));

        let columns = lines[0].split(',').count();
        assert_eq!(columns, 22);
        assert!(lines.iter().all(|l| l.split(',').count() == columns));
    }
}
