use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dynamics::state::{EngagementParameters, SimConfig};
use crate::error::{Result, SimError};
use crate::vehicle::{Loft, MissileParameters};

// ---------------------------------------------------------------------------
// Flat parameter record, as extracted from the game data
// ---------------------------------------------------------------------------

/// One missile as a flat key/value record. Optional features are encoded
/// as 0 (or absent) and become `None` on conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissileRecord {
    pub bullet_name: Option<String>,
    pub caliber: Option<f64>,
    pub cxk: Option<f64>,
    pub mass: Option<f64>,
    pub mass_end_booster: Option<f64>,
    pub mass_end_sustainer: f64,
    pub time_fire_booster: Option<f64>,
    pub time_fire_sustainer: f64,
    pub force_booster: Option<f64>,
    pub force_sustainer: f64,
    pub time_life: Option<f64>,
    pub end_speed: Option<f64>,
    pub max_distance: Option<f64>,
    pub loft_elevation: f64,
    pub loft_target_elevation: f64,
    pub loft_omega_max: f64,
    #[serde(alias = "loft_acceleration")]
    pub loft_angle_acceleration: f64,
    pub lock_distance: f64,
    pub aoa: f64,
    pub tvc: f64,
    pub overload: f64,
    pub dist_cm_stab: f64,
    pub wing_area: f64,
    #[serde(alias = "timeout")]
    pub guidance_timeout: f64,
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64> {
    value.ok_or_else(|| SimError::invalid(field, "missing from record"))
}

/// 0 and absent both mean "not configured".
fn configured(value: Option<f64>) -> Option<f64> {
    value.filter(|&v| v != 0.0)
}

impl MissileRecord {
    /// Validated parameter set; `fallback_name` is used when the record
    /// carries no `bullet_name`.
    pub fn to_parameters(&self, fallback_name: &str) -> Result<MissileParameters> {
        let loft = (self.loft_elevation != 0.0 && self.loft_target_elevation != 0.0 && self.loft_omega_max != 0.0)
            .then(|| Loft {
                elevation: self.loft_elevation.abs(),
                target_elevation: self.loft_target_elevation.abs(),
                omega_max: self.loft_omega_max.abs(),
                accel_gain: self.loft_angle_acceleration,
            });

        let params = MissileParameters {
            name: self.bullet_name.clone().unwrap_or_else(|| fallback_name.to_string()),
            caliber: required("caliber", self.caliber)?,
            cxk: required("cxk", self.cxk)?,
            mass: required("mass", self.mass)?,
            mass_end_booster: required("mass_end_booster", self.mass_end_booster)?,
            mass_end_sustainer: self.mass_end_sustainer,
            time_fire_booster: required("time_fire_booster", self.time_fire_booster)?,
            time_fire_sustainer: self.time_fire_sustainer,
            force_booster: required("force_booster", self.force_booster)?,
            force_sustainer: self.force_sustainer,
            time_life: required("time_life", self.time_life)?,
            end_speed: configured(self.end_speed),
            max_distance: configured(self.max_distance),
            loft,
            lock_distance: configured(Some(self.lock_distance)),
            guidance_delay: configured(Some(self.guidance_timeout)),
            max_load: configured(Some(self.overload)),
            dist_cm_stab: self.dist_cm_stab,
            wing_area: self.wing_area,
            fin_aoa: self.aoa,
            tvc: self.tvc,
        };
        params.validate()?;
        Ok(params)
    }

    /// Flat record for a parameter set; inverse of `to_parameters`.
    pub fn from_parameters(params: &MissileParameters) -> Self {
        let loft = params.loft.unwrap_or(Loft { elevation: 0.0, target_elevation: 0.0, omega_max: 0.0, accel_gain: 0.0 });
        Self {
            bullet_name: Some(params.name.clone()),
            caliber: Some(params.caliber),
            cxk: Some(params.cxk),
            mass: Some(params.mass),
            mass_end_booster: Some(params.mass_end_booster),
            mass_end_sustainer: params.mass_end_sustainer,
            time_fire_booster: Some(params.time_fire_booster),
            time_fire_sustainer: params.time_fire_sustainer,
            force_booster: Some(params.force_booster),
            force_sustainer: params.force_sustainer,
            time_life: Some(params.time_life),
            end_speed: params.end_speed,
            max_distance: params.max_distance,
            loft_elevation: loft.elevation,
            loft_target_elevation: loft.target_elevation,
            loft_omega_max: loft.omega_max,
            loft_angle_acceleration: loft.accel_gain,
            lock_distance: params.lock_distance.unwrap_or(0.0),
            aoa: params.fin_aoa,
            tvc: params.tvc,
            overload: params.max_load.unwrap_or(0.0),
            dist_cm_stab: params.dist_cm_stab,
            wing_area: params.wing_area,
            guidance_timeout: params.guidance_delay.unwrap_or(0.0),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

// ---------------------------------------------------------------------------
// Catalog: compiled parameter sets keyed by name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, MissileRecord>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Names containing `filter`, case-insensitive.
    pub fn search<'a>(&'a self, filter: &'a str) -> impl Iterator<Item = &'a str> {
        let needle = filter.to_lowercase();
        self.names().filter(move |n| n.to_lowercase().contains(&needle))
    }

    pub fn get(&self, name: &str) -> Result<MissileParameters> {
        self.data
            .get(name)
            .ok_or_else(|| SimError::UnknownMissile(name.to_string()))?
            .to_parameters(name)
    }
}

// ---------------------------------------------------------------------------
// Scenario: one reproducible run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub missile: MissileRecord,
    #[serde(default)]
    pub engagement: EngagementParameters,
    #[serde(default)]
    pub sim: SimConfig,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn parameters(&self) -> Result<MissileParameters> {
        self.missile.to_parameters("scenario")
    }
}
