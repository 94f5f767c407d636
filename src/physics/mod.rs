pub mod atmosphere;
pub mod aerodynamics;
