pub mod controller;
pub mod guidance;
pub mod turn;

pub use controller::{Guidance, PitchCommand};
pub use guidance::LoftGuidance;
pub use turn::{TurnLimiter, TurnPerformance};
