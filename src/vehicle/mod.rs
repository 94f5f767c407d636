pub mod missile;
pub mod propulsion;

pub use missile::{presets, Loft, MissileBuilder, MissileParameters, Performance};
pub use propulsion::{MotorPhase, MotorSample, PropulsionStager};
