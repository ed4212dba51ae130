//! Distance units and conversion constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PaceZonesError;

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Meters in one kilometer.
pub const METERS_PER_KILOMETER: f64 = 1000.0;

/// Kilometers in one mile; the factor between min/mi and min/km paces.
pub const MILE_TO_KM: f64 = 1.609344;

/// Feet in one meter.
pub const FEET_PER_METER: f64 = 3.28084;

/// Feet per meter used when reporting feet of gain back in meters.
const REPORT_FEET_PER_METER: f64 = 3.281;

/// Distance unit a pace is expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "mi")]
    Miles,
    #[serde(rename = "km")]
    Kilometers,
}

impl Unit {
    /// Short label used in pace text (`mi` or `km`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Miles => "mi",
            Unit::Kilometers => "km",
        }
    }

    /// The other supported unit.
    pub fn other(&self) -> Unit {
        match self {
            Unit::Miles => Unit::Kilometers,
            Unit::Kilometers => Unit::Miles,
        }
    }

    /// Meters in one unit of distance.
    pub fn meters(&self) -> f64 {
        match self {
            Unit::Miles => METERS_PER_MILE,
            Unit::Kilometers => METERS_PER_KILOMETER,
        }
    }

    /// Convert a distance in meters into this unit.
    pub fn distance_from_meters(&self, meters: f64) -> f64 {
        meters / self.meters()
    }

    /// Convert an altitude in meters into the elevation unit paired with this
    /// distance unit (feet for miles, meters for kilometers).
    pub fn elevation_from_meters(&self, meters: f64) -> f64 {
        match self {
            Unit::Miles => meters * FEET_PER_METER,
            Unit::Kilometers => meters,
        }
    }

    /// Label of the elevation unit paired with this distance unit.
    pub fn elevation_label(&self) -> &'static str {
        match self {
            Unit::Miles => "ft",
            Unit::Kilometers => "m",
        }
    }

    /// Express an elevation in this unit's elevation scale in the other
    /// scale. Feet go to whole meters; meters go to feet.
    pub fn elevation_in_other(&self, value: f64) -> f64 {
        match self {
            Unit::Miles => (value / REPORT_FEET_PER_METER).round(),
            Unit::Kilometers => value * FEET_PER_METER,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = PaceZonesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mi" => Ok(Unit::Miles),
            "km" => Ok(Unit::Kilometers),
            other => Err(PaceZonesError::InvalidUnit {
                unit: other.to_string(),
            }),
        }
    }
}
