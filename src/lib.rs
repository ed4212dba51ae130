//! # Pace Zones
//!
//! Pace arithmetic and heart-rate zone analytics for running activities.
//!
//! This library provides:
//! - A unit-aware [`Pace`] type (min/mi or min/km) with arithmetic, inverted
//!   "faster is greater" ordering and a stable text/JSON form
//! - Heart rate zone classification from athlete zone boundaries
//! - Stream alignment into one typed row per sample
//! - Per-zone IQR outlier filtering and zone summaries
//! - Whole-activity correlation, gradient and elevation gain figures
//!
//! ## Features
//!
//! - **`parallel`** - Analyze many activities in parallel with rayon
//! - **`http`** - Fetch streams and athlete zones from the Strava API
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use pace_zones::{analyze_activity, ActivityStreams, AnalysisConfig, Pace, Unit};
//! use pace_zones::zones::{ZoneBoundary, ZoneClassifier};
//!
//! let pace: Pace = "9:30/mi".parse().unwrap();
//! assert_eq!(pace.convert().to_string(), "5:54/km");
//!
//! let streams = ActivityStreams {
//!     heart_rate: vec![112.0, 128.0, 133.0],
//!     velocity: vec![2.7, 0.0, 3.0],
//!     elevation: vec![10.0, 11.0, 13.0],
//!     time: vec![0.0, 30.0, 60.0],
//!     distance: vec![0.0, 80.0, 170.0],
//! };
//! let classifier = ZoneClassifier::new(vec![
//!     ZoneBoundary::new(0.0, 119.0),
//!     ZoneBoundary::new(120.0, 149.0),
//! ]);
//!
//! let analysis = analyze_activity(&streams, &classifier, &AnalysisConfig::default()).unwrap();
//! for zone in &analysis.zones {
//!     println!("{}: {}", zone.zone, zone.mean_pace);
//! }
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, PaceZonesError, Result};

// Distance units and conversion constants
pub mod units;
pub use units::Unit;

// Unit-aware pace value type
pub mod pace;
pub use pace::{Pace, PaceRecord};

// Heart rate zones and classification
pub mod zones;
pub use zones::{
    calculate_hr_zones, classify, HrZone, HrZoneDistribution, ZoneBoundary, ZoneClassifier,
};
#[cfg(feature = "parallel")]
pub use zones::calculate_hr_zones_parallel;

// Numeric aggregates (mean, quantile, correlation)
pub mod stats;

// Stream alignment
pub mod streams;
pub use streams::{
    align_series, gradient, pad_paces, paces_from_velocity, AlignedSample, AlignedTable,
    SampleField, SeriesPoint,
};

// Per-zone IQR outlier filtering
pub mod outliers;
pub use outliers::{exclude_outliers, exclude_outliers_by_zone};

// Zone aggregation and the analysis pipeline
pub mod analysis;
pub use analysis::{
    analyze_activities, analyze_activity, elevation_gain, group_by_zone, ActivityAnalysis,
    ElevationGain, ZoneSummary,
};
#[cfg(feature = "parallel")]
pub use analysis::analyze_activities_parallel;

// Text summary
pub mod report;
pub use report::ActivityReport;

// HTTP module for stream fetching
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::{ActivitySummary, StravaClient, StreamFetchResult};

// ============================================================================
// Core Types
// ============================================================================

/// Raw per-sample streams of one activity, in the API's native units.
///
/// `velocity` may hold zero or negative samples; those are skipped when paces
/// are derived. The other streams must all match the length of `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStreams {
    /// Heart rate in BPM
    pub heart_rate: Vec<f64>,
    /// Smoothed speed in m/s
    pub velocity: Vec<f64>,
    /// Altitude in meters
    pub elevation: Vec<f64>,
    /// Elapsed time in seconds
    pub time: Vec<f64>,
    /// Cumulative distance in meters
    pub distance: Vec<f64>,
}

impl ActivityStreams {
    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Configuration for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Distance unit for paces and distances. Elevation follows it: feet for
    /// miles, meters for kilometers.
    /// Default: miles
    pub unit: Unit,

    /// Fence distance, in inter-quartile ranges, for pace outlier exclusion.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Round elevation samples to whole feet/meters before differencing.
    /// Default: true
    pub round_elevation: bool,

    /// Decimal places kept on aligned distances.
    /// Default: 2
    pub distance_decimals: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            unit: Unit::Miles,
            iqr_multiplier: outliers::DEFAULT_IQR_MULTIPLIER,
            round_elevation: true,
            distance_decimals: 2,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig =
            serde_json::from_str(json).map_err(|e| PaceZonesError::Config {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(PaceZonesError::Config {
                message: format!(
                    "iqr_multiplier must be a non-negative number, got {}",
                    self.iqr_multiplier
                ),
            });
        }
        if self.distance_decimals > 9 {
            return Err(PaceZonesError::Config {
                message: format!(
                    "distance_decimals must be at most 9, got {}",
                    self.distance_decimals
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
