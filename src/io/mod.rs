pub mod csv;
pub mod json;
pub mod record;

pub use json::FlightSummary;
pub use record::{Catalog, MissileRecord, Scenario};
