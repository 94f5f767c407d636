pub mod integrator;
pub mod runner;
pub mod event;

pub use runner::{compare, simulate, simulate_with, Termination, TrajectoryResult};
pub use integrator::euler_step;
pub use event::{EventDetector, EventKind, SimEvent};
