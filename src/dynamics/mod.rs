pub mod state;

pub use state::{EngagementParameters, LoftingPhase, SimConfig, State, G};
