//! Zone-grouped activity analytics.
//!
//! [`analyze_activity`] runs the whole pipeline for one activity: align the
//! streams, classify every sample, summarize each zone, filter pace outliers
//! per zone and compute whole-activity correlation and elevation figures.
//!
//! ## Example
//! ```rust
//! use pace_zones::{analyze_activity, ActivityStreams, AnalysisConfig};
//! use pace_zones::zones::{ZoneBoundary, ZoneClassifier};
//!
//! let streams = ActivityStreams {
//!     heart_rate: vec![110.0, 125.0, 140.0, 155.0],
//!     velocity: vec![2.6, 2.9, 3.1, 3.4],
//!     elevation: vec![10.0, 12.0, 11.0, 15.0],
//!     time: vec![0.0, 60.0, 120.0, 180.0],
//!     distance: vec![0.0, 170.0, 350.0, 550.0],
//! };
//! let classifier = ZoneClassifier::new(vec![
//!     ZoneBoundary::new(0.0, 119.0),
//!     ZoneBoundary::new(120.0, 149.0),
//!     ZoneBoundary::new(150.0, 169.0),
//! ]);
//!
//! let analysis = analyze_activity(&streams, &classifier, &AnalysisConfig::default()).unwrap();
//! assert_eq!(analysis.zones.len(), 3);
//! println!("{}", analysis.report());
//! ```

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result};
use crate::outliers::exclude_outliers_by_zone;
use crate::pace::Pace;
use crate::report::ActivityReport;
use crate::stats::{mean, pearson_correlation};
use crate::streams::{column, AlignedSample, AlignedTable, SampleField};
use crate::units::Unit;
use crate::zones::{HrZone, HrZoneDistribution, ZoneClassifier};
use crate::{ActivityStreams, AnalysisConfig};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Statistics for the samples of one heart rate zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: HrZone,
    /// Number of samples in the zone
    pub samples: usize,
    pub mean_pace: Pace,
    /// Slowest pace in the zone (the minimum under pace ordering)
    pub min_pace: Pace,
    /// Fastest pace in the zone
    pub max_pace: Pace,
    pub mean_hr: f64,
    pub min_hr: f64,
    pub max_hr: f64,
    pub mean_elevation_gradient: f64,
    pub mean_hr_gradient: f64,
}

/// Total climbing of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationGain {
    /// Distance unit of the table; feet pair with miles, meters with kilometers
    pub unit: Unit,
    /// Gain in the table's elevation unit
    pub gain: f64,
    /// Gain in the other elevation unit
    pub gain_other: f64,
}

impl ElevationGain {
    pub fn from_gradient(gradient: &[f64], unit: Unit) -> Self {
        let gain = elevation_gain(gradient);
        Self {
            unit,
            gain,
            gain_other: unit.elevation_in_other(gain),
        }
    }
}

/// Everything derived from one activity's streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAnalysis {
    pub table: AlignedTable,
    /// Per-zone statistics in rank order
    pub zones: Vec<ZoneSummary>,
    /// Time in zone
    pub distribution: HrZoneDistribution,
    /// Pace samples with per-zone outliers removed (boxplot input)
    pub pace_distribution: Vec<AlignedSample>,
    /// Pearson correlation of heart rate and pace seconds
    pub hr_pace_correlation: Option<f64>,
    pub mean_elevation_gradient: Option<f64>,
    pub mean_hr_gradient: Option<f64>,
    pub elevation_gain: ElevationGain,
}

impl ActivityAnalysis {
    /// Summary for one zone, if any sample fell in it.
    pub fn zone(&self, zone: HrZone) -> Option<&ZoneSummary> {
        self.zones.iter().find(|z| z.zone == zone)
    }

    /// Text summary of the analysis.
    pub fn report(&self) -> ActivityReport<'_> {
        ActivityReport::new(self)
    }
}

/// Group rows by zone, zones in rank order, rows in table order.
pub fn group_by_zone(rows: &[AlignedSample]) -> BTreeMap<HrZone, Vec<&AlignedSample>> {
    let mut groups: BTreeMap<HrZone, Vec<&AlignedSample>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.zone).or_default().push(row);
    }
    groups
}

/// Summarize the rows of one zone.
pub fn summarize_zone(zone: HrZone, rows: &[&AlignedSample]) -> Result<ZoneSummary> {
    let mean_pace = Pace::mean(rows.iter().map(|r| &r.pace))?;
    let min_pace = rows
        .iter()
        .map(|r| r.pace)
        .max_by_key(|p| p.total_seconds())
        .ok_or_empty("slowest pace")?;
    let max_pace = rows
        .iter()
        .map(|r| r.pace)
        .min_by_key(|p| p.total_seconds())
        .ok_or_empty("fastest pace")?;

    let heart_rates: Vec<f64> = rows.iter().map(|r| r.heart_rate).collect();
    let mean_hr = mean(&heart_rates).ok_or_empty("mean heart rate")?;
    let min_hr = heart_rates.iter().copied().fold(f64::INFINITY, f64::min);
    let max_hr = heart_rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let elevation_gradients: Vec<f64> = rows.iter().map(|r| r.elevation_gradient).collect();
    let hr_gradients: Vec<f64> = rows.iter().map(|r| r.hr_gradient).collect();

    Ok(ZoneSummary {
        zone,
        samples: rows.len(),
        mean_pace,
        min_pace,
        max_pace,
        mean_hr,
        min_hr,
        max_hr,
        mean_elevation_gradient: mean(&elevation_gradients).unwrap_or(0.0),
        mean_hr_gradient: mean(&hr_gradients).unwrap_or(0.0),
    })
}

/// Sum of the positive entries of an elevation gradient.
pub fn elevation_gain(gradient: &[f64]) -> f64 {
    gradient
        .iter()
        .filter(|&&g| g > 0.0)
        .fold(0.0, |acc, g| acc + g)
}

/// Run the full analysis pipeline for one activity.
pub fn analyze_activity(
    streams: &ActivityStreams,
    classifier: &ZoneClassifier,
    config: &AnalysisConfig,
) -> Result<ActivityAnalysis> {
    config.validate()?;

    let table = AlignedTable::build(streams, classifier, config)?;

    #[cfg(feature = "parallel")]
    let distribution = crate::zones::calculate_hr_zones_parallel(&streams.heart_rate, classifier)?;
    #[cfg(not(feature = "parallel"))]
    let distribution = crate::zones::calculate_hr_zones(&streams.heart_rate, classifier)?;

    let zones = group_by_zone(&table.samples)
        .into_iter()
        .map(|(zone, rows)| summarize_zone(zone, &rows))
        .collect::<Result<Vec<_>>>()?;

    let pace_distribution = exclude_outliers_by_zone(
        &table.samples,
        SampleField::PaceMinutes,
        config.iqr_multiplier,
    );

    let hr_pace_correlation = pearson_correlation(
        &column(&table.samples, SampleField::HeartRate),
        &column(&table.samples, SampleField::PaceSeconds),
    );

    let elevation_gradient = column(&table.samples, SampleField::ElevationGradient);
    let elevation_gain = ElevationGain::from_gradient(&elevation_gradient, table.unit);
    let mean_elevation_gradient = mean(&elevation_gradient);
    let mean_hr_gradient = mean(&column(&table.samples, SampleField::HrGradient));

    info!(
        "[Analysis] Analyzed {} samples across {} zones, gain={}{}",
        table.len(),
        zones.len(),
        elevation_gain.gain,
        table.unit.elevation_label()
    );

    Ok(ActivityAnalysis {
        table,
        zones,
        distribution,
        pace_distribution,
        hr_pace_correlation,
        mean_elevation_gradient,
        mean_hr_gradient,
        elevation_gain,
    })
}

/// Analyze several activities, one result per activity id.
pub fn analyze_activities(
    activities: &[(String, ActivityStreams)],
    classifier: &ZoneClassifier,
    config: &AnalysisConfig,
) -> Vec<(String, Result<ActivityAnalysis>)> {
    activities
        .iter()
        .map(|(id, streams)| (id.clone(), analyze_logged(id, streams, classifier, config)))
        .collect()
}

/// Analyze several activities in parallel. Each activity is still processed
/// as a whole on one thread.
#[cfg(feature = "parallel")]
pub fn analyze_activities_parallel(
    activities: &[(String, ActivityStreams)],
    classifier: &ZoneClassifier,
    config: &AnalysisConfig,
) -> Vec<(String, Result<ActivityAnalysis>)> {
    if activities.len() < 4 {
        return analyze_activities(activities, classifier, config);
    }

    activities
        .par_iter()
        .map(|(id, streams)| (id.clone(), analyze_logged(id, streams, classifier, config)))
        .collect()
}

fn analyze_logged(
    activity_id: &str,
    streams: &ActivityStreams,
    classifier: &ZoneClassifier,
    config: &AnalysisConfig,
) -> Result<ActivityAnalysis> {
    let result = analyze_activity(streams, classifier, config);
    if let Err(e) = &result {
        warn!("[Analysis] Activity {} skipped: {}", activity_id, e);
    }
    result
}
