//! Stream alignment.
//!
//! Raw activity streams arrive as parallel per-sample arrays. This module joins
//! them into one typed row per sample (the aligned table) after unit
//! conversion, pace derivation and zone classification.
//!
//! Pace is the only stream allowed to be short: samples with zero or negative
//! velocity are dropped when paces are derived, and the tail is padded with the
//! activity's mean pace so the table keeps one row per time sample.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PaceZonesError, Result};
use crate::pace::Pace;
use crate::units::Unit;
use crate::zones::{HrZone, ZoneClassifier};
use crate::{ActivityStreams, AnalysisConfig};

/// One value of a single-metric series with its time and distance position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint<T> {
    /// Elapsed time in minutes
    pub time: f64,
    /// Cumulative distance in the table unit
    pub distance: f64,
    pub value: T,
}

/// One row of the aligned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSample {
    /// Elapsed time in minutes
    pub time: f64,
    /// Cumulative distance in the table unit
    pub distance: f64,
    pub pace: Pace,
    /// Heart rate in BPM
    pub heart_rate: f64,
    pub zone: HrZone,
    /// Elevation in feet (miles) or meters (kilometers)
    pub elevation: f64,
    /// Elevation change since the previous sample
    pub elevation_gradient: f64,
    /// Heart rate change since the previous sample
    pub hr_gradient: f64,
}

/// Numeric columns of [`AlignedSample`] that aggregates and filters can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleField {
    Time,
    Distance,
    PaceSeconds,
    PaceMinutes,
    HeartRate,
    Elevation,
    ElevationGradient,
    HrGradient,
}

impl SampleField {
    pub fn value(&self, sample: &AlignedSample) -> f64 {
        match self {
            SampleField::Time => sample.time,
            SampleField::Distance => sample.distance,
            SampleField::PaceSeconds => sample.pace.total_seconds() as f64,
            SampleField::PaceMinutes => sample.pace.minutes_f64(),
            SampleField::HeartRate => sample.heart_rate,
            SampleField::Elevation => sample.elevation,
            SampleField::ElevationGradient => sample.elevation_gradient,
            SampleField::HrGradient => sample.hr_gradient,
        }
    }
}

/// Extract one numeric column from a slice of rows.
pub fn column(samples: &[AlignedSample], field: SampleField) -> Vec<f64> {
    samples.iter().map(|s| field.value(s)).collect()
}

/// Per-activity table with one row per time sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedTable {
    pub unit: Unit,
    pub samples: Vec<AlignedSample>,
}

impl AlignedTable {
    /// Build the aligned table for one activity.
    ///
    /// Fails with [`PaceZonesError::Config`] for an invalid config, with
    /// [`PaceZonesError::LengthMismatch`] when the heart rate, elevation or
    /// distance streams do not match the time stream, and with
    /// [`PaceZonesError::OutOfRange`] when any heart rate sample has no zone.
    pub fn build(
        streams: &ActivityStreams,
        classifier: &ZoneClassifier,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;

        let n = streams.time.len();
        check_len("heartrate", &streams.heart_rate, n)?;
        check_len("altitude", &streams.elevation, n)?;
        check_len("distance", &streams.distance, n)?;

        let unit = config.unit;
        let paces = pad_paces(paces_from_velocity(&streams.velocity, unit), n)?;
        let zones = classifier.classify_all(&streams.heart_rate)?;

        let elevation: Vec<f64> = streams
            .elevation
            .iter()
            .map(|&m| {
                let value = unit.elevation_from_meters(m);
                if config.round_elevation {
                    value.round()
                } else {
                    value
                }
            })
            .collect();
        let elevation_gradient = gradient(&elevation);
        let hr_gradient = gradient(&streams.heart_rate);

        let scale = 10f64.powi(config.distance_decimals as i32);
        let samples = (0..n)
            .map(|i| AlignedSample {
                time: streams.time[i] / 60.0,
                distance: (unit.distance_from_meters(streams.distance[i]) * scale).round() / scale,
                pace: paces[i],
                heart_rate: streams.heart_rate[i],
                zone: zones[i],
                elevation: elevation[i],
                elevation_gradient: elevation_gradient[i],
                hr_gradient: hr_gradient[i],
            })
            .collect();

        Ok(Self { unit, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn column(&self, field: SampleField) -> Vec<f64> {
        column(&self.samples, field)
    }

    pub fn paces(&self) -> Vec<Pace> {
        self.samples.iter().map(|s| s.pace).collect()
    }

    /// Project the table onto one metric for plotting.
    pub fn series<T, F>(&self, value: F) -> Vec<SeriesPoint<T>>
    where
        F: Fn(&AlignedSample) -> T,
    {
        self.samples
            .iter()
            .map(|s| SeriesPoint {
                time: s.time,
                distance: s.distance,
                value: value(s),
            })
            .collect()
    }
}

fn check_len<T>(stream: &str, values: &[T], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(PaceZonesError::LengthMismatch {
            stream: stream.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Align one metric with the time and distance streams.
///
/// All three slices must have the same length.
pub fn align_series<T: Clone>(
    values: &[T],
    time: &[f64],
    distance: &[f64],
) -> Result<Vec<SeriesPoint<T>>> {
    check_len("values", values, time.len())?;
    check_len("distance", distance, time.len())?;

    Ok(values
        .iter()
        .zip(time)
        .zip(distance)
        .map(|((value, &time), &distance)| SeriesPoint {
            time,
            distance,
            value: value.clone(),
        })
        .collect())
}

/// Derive paces from a velocity stream, skipping samples that are not moving.
pub fn paces_from_velocity(velocity: &[f64], unit: Unit) -> Vec<Pace> {
    velocity
        .iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| Pace::from_speed_in(v, unit))
        .collect()
}

/// Pad a pace stream at the tail with its mean until it has `len` entries.
pub fn pad_paces(mut paces: Vec<Pace>, len: usize) -> Result<Vec<Pace>> {
    if paces.len() > len {
        return Err(PaceZonesError::LengthMismatch {
            stream: "velocity_smooth".to_string(),
            expected: len,
            actual: paces.len(),
        });
    }
    if paces.len() == len {
        return Ok(paces);
    }

    let average = Pace::mean(&paces)?;
    debug!(
        "[Aligner] Padding {} missing pace samples with mean {}",
        len - paces.len(),
        average
    );
    paces.resize(len, average);
    Ok(paces)
}

/// First difference of a series: `[0, v1 - v0, v2 - v1, ...]`.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(0.0);
    out.extend(values.windows(2).map(|w| w[1] - w[0]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneBoundary;

    fn classifier() -> ZoneClassifier {
        ZoneClassifier::new(vec![
            ZoneBoundary::new(0.0, 119.0),
            ZoneBoundary::new(120.0, 149.0),
            ZoneBoundary::new(150.0, 169.0),
        ])
    }

    fn streams(n: usize) -> ActivityStreams {
        ActivityStreams {
            heart_rate: (0..n).map(|i| 110.0 + i as f64 * 5.0).collect(),
            velocity: vec![2.8224; n],
            elevation: (0..n).map(|i| 30.0 + i as f64).collect(),
            time: (0..n).map(|i| i as f64 * 60.0).collect(),
            distance: (0..n).map(|i| i as f64 * 170.0).collect(),
        }
    }

    #[test]
    fn test_gradient() {
        assert_eq!(gradient(&[100.0, 105.0, 103.0]), vec![0.0, 5.0, -2.0]);
        assert_eq!(gradient(&[42.0]), vec![0.0]);
        assert!(gradient(&[]).is_empty());
    }

    #[test]
    fn test_paces_from_velocity_drops_stopped_samples() {
        let paces = paces_from_velocity(&[2.8224, 0.0, -1.0, 2.8224], Unit::Miles);
        assert_eq!(paces.len(), 2);
        assert!(paces.iter().all(|p| *p == Pace::new(9, 30, Unit::Miles)));
    }

    #[test]
    fn test_pad_paces_with_mean() {
        let paces: Vec<Pace> = (0..8)
            .map(|i| Pace::from_seconds(500 + i * 10, Unit::Miles))
            .collect();
        let mean = Pace::mean(&paces).unwrap();

        let padded = pad_paces(paces.clone(), 10).unwrap();
        assert_eq!(padded.len(), 10);
        assert_eq!(&padded[..8], &paces[..]);
        assert_eq!(padded[8], mean);
        assert_eq!(padded[9], mean);
        // 500..570 averages to 535
        assert_eq!(mean, Pace::new(8, 55, Unit::Miles));
    }

    #[test]
    fn test_pad_paces_errors() {
        let paces = vec![Pace::new(8, 0, Unit::Miles); 3];
        assert!(matches!(
            pad_paces(paces, 2),
            Err(PaceZonesError::LengthMismatch { .. })
        ));
        assert!(matches!(
            pad_paces(Vec::new(), 2),
            Err(PaceZonesError::EmptyInput { .. })
        ));
        assert!(pad_paces(Vec::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_align_series() {
        let series = align_series(&[1.0, 2.0], &[0.0, 0.5], &[0.0, 0.1]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].value, 2.0);
        assert_eq!(series[1].time, 0.5);
        assert!(align_series(&[1.0], &[0.0, 0.5], &[0.0, 0.1]).is_err());
    }

    #[test]
    fn test_build_table() {
        let mut s = streams(10);
        s.velocity[8] = 0.0;
        s.velocity[9] = 0.0;
        s.velocity[3] = 3.0;

        let table = AlignedTable::build(&s, &classifier(), &AnalysisConfig::default()).unwrap();
        assert_eq!(table.len(), 10);

        let source: Vec<Pace> = paces_from_velocity(&s.velocity, Unit::Miles);
        assert_eq!(source.len(), 8);
        let mean = Pace::mean(&source).unwrap();
        assert_eq!(table.samples[8].pace, mean);
        assert_eq!(table.samples[9].pace, mean);
        assert_eq!(table.samples[3].pace, Pace::from_speed(3.0));

        let row = &table.samples[2];
        assert_eq!(row.time, 2.0);
        // 340 m = 0.2113 mi
        assert_eq!(row.distance, 0.21);
        // 32 m = 104.99 ft
        assert_eq!(row.elevation, 105.0);
        assert_eq!(row.zone, HrZone::Moderate);
        assert_eq!(row.hr_gradient, 5.0);
        assert_eq!(table.samples[0].elevation_gradient, 0.0);
    }

    #[test]
    fn test_build_kilometers() {
        let config = AnalysisConfig {
            unit: Unit::Kilometers,
            ..AnalysisConfig::default()
        };
        let table = AlignedTable::build(&streams(3), &classifier(), &config).unwrap();
        assert_eq!(table.unit, Unit::Kilometers);
        assert_eq!(table.samples[2].distance, 0.34);
        assert_eq!(table.samples[2].elevation, 32.0);
        // 1000 / 2.8224 = 354.3 s/km
        assert_eq!(table.samples[0].pace, Pace::new(5, 54, Unit::Kilometers));
    }

    #[test]
    fn test_build_rejects_mismatched_streams() {
        let mut s = streams(5);
        s.heart_rate.pop();
        assert!(matches!(
            AlignedTable::build(&s, &classifier(), &AnalysisConfig::default()),
            Err(PaceZonesError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_build_validates_config() {
        let config = AnalysisConfig {
            distance_decimals: 400,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            AlignedTable::build(&streams(3), &classifier(), &config),
            Err(PaceZonesError::Config { .. })
        ));
    }

    #[test]
    fn test_build_aborts_on_unclassifiable_sample() {
        let mut s = streams(5);
        s.heart_rate[4] = 190.0;
        assert!(matches!(
            AlignedTable::build(&s, &classifier(), &AnalysisConfig::default()),
            Err(PaceZonesError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_series_projection() {
        let table =
            AlignedTable::build(&streams(4), &classifier(), &AnalysisConfig::default()).unwrap();
        let hr = table.series(|s| s.heart_rate);
        assert_eq!(hr.len(), 4);
        assert_eq!(hr[3].value, 125.0);
        assert_eq!(table.column(SampleField::PaceSeconds)[0], 570.0);
        assert_eq!(table.column(SampleField::PaceMinutes)[0], 9.5);
    }
}
