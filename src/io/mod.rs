//! YAML descriptions of domain objects, for mission setups that live in
//! configuration files rather than code.

use crate::cosmic::{CelestialBody, CoordSystem, OrbitState, Spacecraft, StateRepr};
use crate::errors::VelaError;
use crate::linalg::Vector6;
use hifitime::Epoch;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Anything which may be represented in a configuration file.
pub trait ConfigRepr: Serialize + DeserializeOwned + Sized {
    fn from_yaml_str(yaml: &str) -> Result<Self, VelaError> {
        serde_yaml::from_str(yaml).map_err(|e| VelaError::ConfigError(e.to_string()))
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<Self, VelaError> {
        let contents =
            fs::read_to_string(path).map_err(|e| VelaError::ConfigError(e.to_string()))?;
        Self::from_yaml_str(&contents)
    }
}

/// On-file description of a celestial body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    #[serde(default)]
    pub mu_km3_s2: Option<f64>,
    #[serde(default)]
    pub equatorial_radius_km: f64,
}

impl ConfigRepr for BodyConfig {}

impl BodyConfig {
    pub fn to_body(&self) -> CelestialBody {
        CelestialBody {
            name: self.name.clone(),
            mu_km3_s2: self.mu_km3_s2,
            equatorial_radius_km: self.equatorial_radius_km,
        }
    }
}

fn default_mass_kg() -> f64 {
    1000.0
}

/// On-file description of a spacecraft: representation, the six elements in
/// that representation, and an epoch such as `2023-01-01T00:00:00 UTC`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpacecraftConfig {
    pub name: String,
    pub representation: StateRepr,
    pub elements: [f64; 6],
    pub epoch: String,
    #[serde(default = "default_mass_kg")]
    pub mass_kg: f64,
}

impl ConfigRepr for SpacecraftConfig {}

impl SpacecraftConfig {
    pub fn to_spacecraft(&self, coord: CoordSystem) -> Result<Spacecraft<f64>, VelaError> {
        let epoch = Epoch::from_str(&self.epoch)
            .map_err(|e| VelaError::ConfigError(format!("epoch {:?}: {e}", self.epoch)))?;
        let state = OrbitState::new(self.representation, Vector6::from_row_slice(&self.elements));
        Ok(Spacecraft::new(&self.name, state, epoch, coord).with_mass(self.mass_kg))
    }
}
