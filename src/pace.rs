//! Unit-aware running pace.
//!
//! A [`Pace`] is the time needed to cover one unit of distance, held as whole
//! minutes and seconds against either miles or kilometers. Every analytics step
//! (means, per-zone extremes, padding) works on the seconds total, while display
//! always uses the `M:SS/unit` form.
//!
//! ## Ordering
//!
//! Comparison is inverted relative to elapsed time: a pace with *fewer* seconds
//! per unit is the *greater* (faster) pace.
//!
//! ```rust
//! use pace_zones::{Pace, Unit};
//!
//! let tempo = Pace::new(7, 30, Unit::Miles);
//! let easy = Pace::new(9, 45, Unit::Miles);
//! assert!(tempo > easy);
//! assert_eq!(tempo.to_string(), "7:30/mi");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, PaceZonesError, Result};
use crate::units::{Unit, MILE_TO_KM};

/// Duration per unit of distance.
///
/// `total_seconds == minutes * 60 + seconds` holds for every instance. The
/// seconds part is normally 0-59 but [`Pace::new`] does not normalize it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PaceRecord", into = "PaceRecord")]
pub struct Pace {
    minutes: u64,
    seconds: u64,
    total_seconds: u64,
    unit: Unit,
}

/// Structured exchange form of a pace: `{min, sec, unit, time}`.
///
/// `time` is informational on input; the pace is rebuilt from `min` and `sec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceRecord {
    pub min: u64,
    pub sec: u64,
    pub unit: Unit,
    #[serde(default)]
    pub time: u64,
}

impl Pace {
    /// Create a pace from its minute and second parts.
    ///
    /// Minutes are clamped so that `minutes * 60 + seconds` fits in a `u64`.
    pub fn new(minutes: u64, seconds: u64, unit: Unit) -> Self {
        let minutes = minutes.min(u64::MAX.saturating_sub(seconds) / 60);
        Self {
            minutes,
            seconds,
            total_seconds: minutes * 60 + seconds,
            unit,
        }
    }

    /// The `0:00` pace in the given unit.
    pub fn zero(unit: Unit) -> Self {
        Self::new(0, 0, unit)
    }

    /// Create a pace from whole seconds per unit. Non-positive totals give `0:00`.
    pub fn from_seconds(total_seconds: i64, unit: Unit) -> Self {
        if total_seconds <= 0 {
            return Self::zero(unit);
        }
        Self::decompose(total_seconds as u64, unit)
    }

    /// Create a pace from fractional seconds per unit, flooring to whole
    /// seconds. Non-positive and non-finite totals give `0:00`.
    pub fn from_seconds_f64(total_seconds: f64, unit: Unit) -> Self {
        if !total_seconds.is_finite() || total_seconds <= 0.0 {
            return Self::zero(unit);
        }
        Self::decompose(total_seconds.floor() as u64, unit)
    }

    /// Create a min/mi pace from a speed in meters per second.
    ///
    /// Stopped, reversed and non-finite speeds all give `0:00/mi`.
    pub fn from_speed(meters_per_second: f64) -> Self {
        Self::from_speed_in(meters_per_second, Unit::Miles)
    }

    /// Create a pace in `unit` from a speed in meters per second.
    pub fn from_speed_in(meters_per_second: f64, unit: Unit) -> Self {
        if !meters_per_second.is_finite() || meters_per_second <= 0.0 {
            return Self::zero(unit);
        }
        Self::from_seconds_f64(unit.meters() / meters_per_second, unit)
    }

    fn decompose(total_seconds: u64, unit: Unit) -> Self {
        Self {
            minutes: total_seconds / 60,
            seconds: total_seconds % 60,
            total_seconds,
            unit,
        }
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Pace as fractional minutes per unit (the value plotted on pace axes).
    pub fn minutes_f64(&self) -> f64 {
        self.total_seconds as f64 / 60.0
    }

    fn check_unit(&self, other: &Pace) -> Result<()> {
        if self.unit != other.unit {
            return Err(PaceZonesError::UnitMismatch {
                left: self.unit,
                right: other.unit,
            });
        }
        Ok(())
    }

    /// Sum of two paces of the same unit.
    pub fn try_add(&self, other: &Pace) -> Result<Pace> {
        self.check_unit(other)?;
        Ok(Self::decompose(
            self.total_seconds.saturating_add(other.total_seconds),
            self.unit,
        ))
    }

    /// Difference of two paces of the same unit. A negative difference gives
    /// `0:00`, the same floor [`Pace::from_seconds`] applies.
    pub fn try_sub(&self, other: &Pace) -> Result<Pace> {
        self.check_unit(other)?;
        Ok(Self::decompose(
            self.total_seconds.saturating_sub(other.total_seconds),
            self.unit,
        ))
    }

    /// Divide the seconds total by a scalar, flooring the result.
    pub fn divide(&self, divisor: f64) -> Result<Pace> {
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(PaceZonesError::InvalidDivisor { divisor });
        }
        Ok(Self::from_seconds_f64(
            self.total_seconds as f64 / divisor,
            self.unit,
        ))
    }

    /// Arithmetic mean of a collection of paces sharing one unit.
    pub fn mean<'a, I>(paces: I) -> Result<Pace>
    where
        I: IntoIterator<Item = &'a Pace>,
    {
        let mut iter = paces.into_iter();
        let first = iter.next().ok_or_empty("mean pace")?;

        let mut sum = *first;
        let mut count = 1usize;
        for pace in iter {
            sum = sum.try_add(pace)?;
            count += 1;
        }

        sum.divide(count as f64)
    }

    /// The same pace in the other unit (min/mi <-> min/km), floored to whole
    /// seconds.
    pub fn convert(&self) -> Pace {
        let total = self.total_seconds as f64;
        match self.unit {
            Unit::Miles => Self::from_seconds_f64(total / MILE_TO_KM, Unit::Kilometers),
            Unit::Kilometers => Self::from_seconds_f64(total * MILE_TO_KM, Unit::Miles),
        }
    }

    /// Express this pace in `unit`, converting only when needed.
    pub fn in_unit(&self, unit: Unit) -> Pace {
        if self.unit == unit {
            *self
        } else {
            self.convert()
        }
    }

    pub fn to_record(&self) -> PaceRecord {
        PaceRecord {
            min: self.minutes,
            sec: self.seconds,
            unit: self.unit,
            time: self.total_seconds,
        }
    }

    pub fn from_record(record: &PaceRecord) -> Pace {
        Pace::new(record.min, record.sec, record.unit)
    }

    /// Serialize to the structured JSON form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.to_record()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse the structured JSON form.
    pub fn from_json(json: &str) -> Result<Pace> {
        let record: PaceRecord =
            serde_json::from_str(json).map_err(|e| PaceZonesError::ParseError {
                input: json.to_string(),
                message: e.to_string(),
            })?;
        Ok(Pace::from_record(&record))
    }
}

impl From<PaceRecord> for Pace {
    fn from(record: PaceRecord) -> Self {
        Pace::from_record(&record)
    }
}

impl From<Pace> for PaceRecord {
    fn from(pace: Pace) -> Self {
        pace.to_record()
    }
}

impl PartialOrd for Pace {
    /// Faster (fewer seconds) compares greater. Paces in different units, or
    /// unequal paces sharing a seconds total, are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.unit != other.unit {
            return None;
        }
        match other.total_seconds.cmp(&self.total_seconds) {
            Ordering::Equal if self != other => None,
            ordering => Some(ordering),
        }
    }
}

impl Neg for Pace {
    type Output = Pace;

    fn neg(self) -> Pace {
        Pace::from_seconds_f64(-(self.total_seconds as f64), self.unit)
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}/{}", self.minutes, self.seconds, self.unit)
    }
}

impl FromStr for Pace {
    type Err = PaceZonesError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: &str| PaceZonesError::ParseError {
            input: s.to_string(),
            message: message.to_string(),
        };

        let colon = s.find(':').ok_or_else(|| invalid("missing ':'"))?;
        let slash = s.find('/').ok_or_else(|| invalid("missing '/'"))?;
        if colon == 0 || colon > slash {
            return Err(invalid("expected <minutes>:<seconds>/<unit>"));
        }

        let minutes: i64 = s[..colon]
            .trim()
            .parse()
            .map_err(|_| invalid("minutes are not an integer"))?;
        let seconds: i64 = s[colon + 1..slash]
            .trim()
            .parse()
            .map_err(|_| invalid("seconds are not an integer"))?;
        let unit: Unit = s[slash + 1..].split('/').next().unwrap_or("").parse()?;

        Ok(Pace::new(minutes.unsigned_abs(), seconds.unsigned_abs(), unit))
    }
}
