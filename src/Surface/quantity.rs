//! Physical quantities attached to metal surface entries.
//!
//! Record files keep values as `(value, 'units')` pairs. They are stored verbatim as
//! [`RawQuantity`] so that a library saves back exactly what was read, and are turned
//! into unit-checked [`Energy`] / [`SurfaceConcentration`] values on demand.
use super::DatabaseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Avogadro constant, 1/mol
pub const N_A: f64 = 6.02214076e23;
/// elementary charge, J/eV
pub const E_CHARGE: f64 = 1.602176634e-19;
/// gas constant, J/(mol K)
pub const R: f64 = 8.314462618;
const CAL: f64 = 4.184;

/// value and unit string exactly as they appear in a record file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuantity {
    pub value: f64,
    pub units: String,
}

impl RawQuantity {
    pub fn new(value: f64, units: &str) -> Self {
        Self {
            value,
            units: units.to_string(),
        }
    }
}

impl fmt::Display for RawQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.units)
    }
}

fn energy_factor(units: &str) -> Result<f64, DatabaseError> {
    // factor converting `units` into J/mol
    let factor = match units.trim() {
        "J/mol" => 1.0,
        "kJ/mol" => 1e3,
        "cal/mol" => CAL,
        "kcal/mol" => CAL * 1e3,
        "eV/molecule" => E_CHARGE * N_A,
        "J/molecule" => N_A,
        "K" => R,
        other => return Err(DatabaseError::UnsupportedUnit(other.to_string())),
    };
    Ok(factor)
}

fn concentration_factor(units: &str) -> Result<f64, DatabaseError> {
    // factor converting `units` into mol/m^2
    let factor = match units.trim() {
        "mol/m^2" | "mol/m2" => 1.0,
        "mol/cm^2" | "mol/cm2" => 1e4,
        other => return Err(DatabaseError::UnsupportedUnit(other.to_string())),
    };
    Ok(factor)
}

/// Binding energy, kept in J/mol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    value_si: f64,
}

impl Energy {
    pub fn new(value: f64, units: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            value_si: value * energy_factor(units)?,
        })
    }
    /// value in J/mol
    pub fn value_si(&self) -> f64 {
        self.value_si
    }
    pub fn value_in(&self, units: &str) -> Result<f64, DatabaseError> {
        Ok(self.value_si / energy_factor(units)?)
    }
}

impl TryFrom<&RawQuantity> for Energy {
    type Error = DatabaseError;
    fn try_from(raw: &RawQuantity) -> Result<Self, Self::Error> {
        Energy::new(raw.value, &raw.units)
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6e} J/mol", self.value_si)
    }
}

/// Surface site density, kept in mol/m^2
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConcentration {
    value_si: f64,
}

impl SurfaceConcentration {
    pub fn new(value: f64, units: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            value_si: value * concentration_factor(units)?,
        })
    }
    /// value in mol/m^2
    pub fn value_si(&self) -> f64 {
        self.value_si
    }
    pub fn value_in(&self, units: &str) -> Result<f64, DatabaseError> {
        Ok(self.value_si / concentration_factor(units)?)
    }
}

impl TryFrom<&RawQuantity> for SurfaceConcentration {
    type Error = DatabaseError;
    fn try_from(raw: &RawQuantity) -> Result<Self, Self::Error> {
        SurfaceConcentration::new(raw.value, &raw.units)
    }
}
