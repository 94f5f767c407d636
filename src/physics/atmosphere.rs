use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Game atmosphere tables (sea level to 20 km)
// ---------------------------------------------------------------------------

/// Reference true airspeed of the conversion table, km/h.
pub const REFERENCE_TAS_KMH: f64 = 1224.0;

pub const MIN_ALTITUDE: f64 = 0.0;
pub const MAX_ALTITUDE: f64 = 20_000.0;

/// (altitude m, density kg/m^3)
const DENSITY_TABLE: [(f64, f64); 10] = [
    (0.0, 0.56),
    (1_000.0, 0.53),
    (2_000.0, 0.49),
    (3_000.0, 0.44),
    (5_000.0, 0.365),
    (8_000.0, 0.30),
    (10_000.0, 0.27),
    (12_000.0, 0.23),
    (15_000.0, 0.19),
    (20_000.0, 0.15),
];

/// (altitude m, IAS km/h shown at 1224 km/h TAS, Mach factor)
const CONVERSION_TABLE: [(f64, f64, f64); 21] = [
    (0.0, 1224.0, 1.00),
    (1_000.0, 1167.0, 1.01),
    (2_000.0, 1110.0, 1.02),
    (3_000.0, 1060.0, 1.04),
    (4_000.0, 1000.0, 1.05),
    (5_000.0, 950.0, 1.06),
    (6_000.0, 900.0, 1.07),
    (7_000.0, 850.0, 1.09),
    (8_000.0, 800.0, 1.10),
    (9_000.0, 750.0, 1.12),
    (10_000.0, 700.0, 1.13),
    (11_000.0, 670.0, 1.14),
    (12_000.0, 625.0, 1.16),
    (13_000.0, 580.0, 1.17),
    (14_000.0, 544.0, 1.17),
    (15_000.0, 500.0, 1.18),
    (16_000.0, 465.0, 1.18),
    (17_000.0, 425.0, 1.17),
    (18_000.0, 390.0, 1.15),
    (19_000.0, 370.0, 1.15),
    (20_000.0, 360.0, 1.15),
];

/// Air properties at one altitude, resolved from the strict conversion table.
#[derive(Debug, Clone, Copy)]
pub struct AirSample {
    pub altitude: f64,
    pub density: f64,     // kg/m^3
    pub ias_factor: f64,  // IAS / TAS
    pub sound_speed: f64, // m/s
}

impl AirSample {
    pub fn true_to_indicated(&self, tas: f64) -> f64 {
        tas * self.ias_factor
    }

    pub fn indicated_to_true(&self, ias: f64) -> f64 {
        ias / self.ias_factor
    }

    /// Mach number for a true airspeed in m/s.
    pub fn mach(&self, tas: f64) -> f64 {
        tas / self.sound_speed
    }
}

/// Resolve density and speed conversions at `altitude`.
///
/// Fails with `OutOfRange` outside 0-20000 m, like every speed conversion.
pub fn sample(altitude: f64) -> Result<AirSample> {
    let (ias, mach_factor) = conversion_at(altitude)?;
    Ok(AirSample {
        altitude,
        density: air_density(altitude),
        ias_factor: ias / REFERENCE_TAS_KMH,
        sound_speed: REFERENCE_TAS_KMH / mach_factor / 3.6,
    })
}

/// Air density, linearly interpolated; extrapolates along the end segments
/// outside the table instead of failing.
pub fn air_density(altitude: f64) -> f64 {
    let n = DENSITY_TABLE.len();
    let idx = DENSITY_TABLE
        .iter()
        .position(|&(h, _)| altitude < h)
        .unwrap_or(n)
        .clamp(1, n - 1);
    let (h0, rho0) = DENSITY_TABLE[idx - 1];
    let (h1, rho1) = DENSITY_TABLE[idx];
    rho0 + (rho1 - rho0) * (altitude - h0) / (h1 - h0)
}

/// Convert a true airspeed to indicated airspeed (any speed unit).
pub fn true_to_indicated(tas: f64, altitude: f64) -> Result<f64> {
    let (ias, _) = conversion_at(altitude)?;
    Ok(tas * (ias / REFERENCE_TAS_KMH))
}

/// Convert an indicated airspeed to true airspeed (any speed unit).
pub fn indicated_to_true(ias: f64, altitude: f64) -> Result<f64> {
    let (ias_ref, _) = conversion_at(altitude)?;
    Ok(ias * (REFERENCE_TAS_KMH / ias_ref))
}

/// Mach number for a true airspeed in m/s.
pub fn mach_number(tas: f64, altitude: f64) -> Result<f64> {
    let (_, mach_factor) = conversion_at(altitude)?;
    let sound_speed_kmh = REFERENCE_TAS_KMH / mach_factor;
    Ok(tas * 3.6 / sound_speed_kmh)
}

// ---------------------------------------------------------------------------
// Table lookup
// ---------------------------------------------------------------------------

/// Interpolated (IAS at reference TAS, Mach factor). Strict bounds.
fn conversion_at(altitude: f64) -> Result<(f64, f64)> {
    if !(MIN_ALTITUDE..=MAX_ALTITUDE).contains(&altitude) {
        return Err(SimError::OutOfRange { altitude });
    }
    let n = CONVERSION_TABLE.len();
    let idx = CONVERSION_TABLE
        .iter()
        .position(|&(h, _, _)| altitude < h)
        .unwrap_or(n - 1)
        .max(1);
    let (h0, ias0, m0) = CONVERSION_TABLE[idx - 1];
    let (h1, ias1, m1) = CONVERSION_TABLE[idx];
    let frac = (altitude - h0) / (h1 - h0);
    Ok((ias0 + (ias1 - ias0) * frac, m0 + (m1 - m0) * frac))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
