pub mod error;
pub mod physics;
pub mod dynamics;
pub mod vehicle;
mod gnc_mod;
pub mod sim;
pub mod io;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

// Short paths for the common entry points
pub mod atmosphere {
    pub use crate::physics::atmosphere::*;
}

pub use dynamics::state::{EngagementParameters, LoftingPhase, SimConfig, State};
pub use error::{Result, SimError};
pub use sim::{compare, simulate, simulate_with, Termination, TrajectoryResult};
pub use vehicle::{MissileBuilder, MissileParameters, MotorPhase};
