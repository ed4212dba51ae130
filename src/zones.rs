//! Heart rate zone classification and time-in-zone distribution.
//!
//! Zones come from the athlete profile as ordered `{min, max}` buckets. The
//! profile's topmost, open-ended bucket is dropped by convention, so a
//! standard five-zone profile classifies into the first four zones.
//!
//! ## Example
//! ```rust
//! use pace_zones::zones::{HrZone, ZoneBoundary, ZoneClassifier};
//!
//! let classifier = ZoneClassifier::new(vec![
//!     ZoneBoundary::new(0.0, 119.0),
//!     ZoneBoundary::new(120.0, 149.0),
//!     ZoneBoundary::new(150.0, 169.0),
//! ]);
//! assert_eq!(classifier.classify(135.0).unwrap(), HrZone::Moderate);
//! assert!(classifier.classify(200.0).is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PaceZonesError, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of heart rate zones the crate knows about.
pub const ZONE_COUNT: usize = 5;

/// A heart rate training zone. The discriminant is the zone rank, which alone
/// decides equality, hashing and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum HrZone {
    Endurance = 0,
    Moderate = 1,
    Tempo = 2,
    Threshold = 3,
    Redline = 4,
}

impl HrZone {
    /// All zones in rank order.
    pub const ALL: [HrZone; ZONE_COUNT] = [
        HrZone::Endurance,
        HrZone::Moderate,
        HrZone::Tempo,
        HrZone::Threshold,
        HrZone::Redline,
    ];

    /// Look up a zone by rank.
    pub fn from_rank(rank: usize) -> Result<HrZone> {
        Self::ALL
            .get(rank)
            .copied()
            .ok_or(PaceZonesError::InvalidZone { rank })
    }

    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            HrZone::Endurance => "Endurance",
            HrZone::Moderate => "Moderate",
            HrZone::Tempo => "Tempo",
            HrZone::Threshold => "Threshold",
            HrZone::Redline => "Redline",
        }
    }

    /// Display colour for plots.
    pub fn color(&self) -> &'static str {
        match self {
            HrZone::Endurance => "green",
            HrZone::Moderate => "yellow",
            HrZone::Tempo => "orange",
            HrZone::Threshold => "red",
            HrZone::Redline => "black",
        }
    }
}

impl fmt::Display for HrZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HrZone {
    type Err = PaceZonesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|zone| zone.label().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| PaceZonesError::UnknownZone {
                label: s.to_string(),
            })
    }
}

/// One heart rate bucket, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBoundary {
    pub min: f64,
    pub max: f64,
}

impl ZoneBoundary {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, heart_rate: f64) -> bool {
        self.min <= heart_rate && heart_rate <= self.max
    }
}

/// Classify one heart rate sample against ordered zone boundaries.
///
/// The first bucket containing `heart_rate` wins and bucket `i` maps to zone
/// rank `i`. Negative, NaN and unmatched samples are [`PaceZonesError::OutOfRange`].
pub fn classify(boundaries: &[ZoneBoundary], heart_rate: f64) -> Result<HrZone> {
    if heart_rate.is_nan() || heart_rate < 0.0 {
        return Err(PaceZonesError::OutOfRange { heart_rate });
    }
    boundaries
        .iter()
        .position(|b| b.contains(heart_rate))
        .ok_or(PaceZonesError::OutOfRange { heart_rate })
        .and_then(HrZone::from_rank)
}

/// Zone boundaries for one athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneClassifier {
    boundaries: Vec<ZoneBoundary>,
}

impl ZoneClassifier {
    /// Use the given boundaries as-is.
    pub fn new(boundaries: Vec<ZoneBoundary>) -> Self {
        Self { boundaries }
    }

    /// Build from a full athlete profile, dropping the topmost bucket.
    pub fn from_profile(mut profile_zones: Vec<ZoneBoundary>) -> Self {
        profile_zones.pop();
        Self::new(profile_zones)
    }

    pub fn boundaries(&self) -> &[ZoneBoundary] {
        &self.boundaries
    }

    pub fn classify(&self, heart_rate: f64) -> Result<HrZone> {
        classify(&self.boundaries, heart_rate)
    }

    /// Classify a whole stream. The first unclassifiable sample aborts.
    pub fn classify_all(&self, heart_rates: &[f64]) -> Result<Vec<HrZone>> {
        heart_rates.iter().map(|&hr| self.classify(hr)).collect()
    }
}

/// Result of heart rate zone distribution calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrZoneDistribution {
    /// Total data points analyzed
    pub total_samples: u32,
    /// Samples in each zone (indexed by rank)
    pub zone_samples: [u32; ZONE_COUNT],
    /// Percentage of samples in each zone
    pub zone_percentages: [f32; ZONE_COUNT],
    /// Average heart rate across all samples
    pub average_hr: f32,
    /// Peak heart rate
    pub peak_hr: f32,
}

impl HrZoneDistribution {
    fn empty() -> Self {
        Self {
            total_samples: 0,
            zone_samples: [0; ZONE_COUNT],
            zone_percentages: [0.0; ZONE_COUNT],
            average_hr: 0.0,
            peak_hr: 0.0,
        }
    }

    fn from_counts(zone_samples: [u32; ZONE_COUNT], sum: f64, peak: f64, total: u32) -> Self {
        let mut zone_percentages = [0.0f32; ZONE_COUNT];
        for i in 0..ZONE_COUNT {
            zone_percentages[i] = (zone_samples[i] as f32 / total as f32) * 100.0;
        }

        Self {
            total_samples: total,
            zone_samples,
            zone_percentages,
            average_hr: (sum / total as f64) as f32,
            peak_hr: peak as f32,
        }
    }

    /// Get percentage for a specific zone
    pub fn get_zone_percent(&self, zone: HrZone) -> f32 {
        self.zone_percentages[zone.rank()]
    }
}

/// Calculate heart rate zone distribution from a stream of HR data.
///
/// # Arguments
/// * `hr_data` - Heart rate values in BPM (1Hz sampling assumed)
/// * `classifier` - The athlete's zone boundaries
///
/// # Returns
/// Zone distribution with time in each zone, or the first out-of-range sample
pub fn calculate_hr_zones(
    hr_data: &[f64],
    classifier: &ZoneClassifier,
) -> Result<HrZoneDistribution> {
    if hr_data.is_empty() {
        return Ok(HrZoneDistribution::empty());
    }

    let mut zone_samples = [0u32; ZONE_COUNT];
    let mut sum = 0.0f64;
    let mut peak = 0.0f64;

    for &hr in hr_data {
        let zone = classifier.classify(hr)?;
        zone_samples[zone.rank()] += 1;
        sum += hr;
        peak = peak.max(hr);
    }

    Ok(HrZoneDistribution::from_counts(
        zone_samples,
        sum,
        peak,
        hr_data.len() as u32,
    ))
}

/// Calculate HR zone distribution using parallel processing.
#[cfg(feature = "parallel")]
pub fn calculate_hr_zones_parallel(
    hr_data: &[f64],
    classifier: &ZoneClassifier,
) -> Result<HrZoneDistribution> {
    if hr_data.len() < 10_000 {
        return calculate_hr_zones(hr_data, classifier);
    }

    let (zone_counts, sum, peak) = hr_data
        .par_iter()
        .try_fold(
            || ([0u32; ZONE_COUNT], 0.0f64, 0.0f64),
            |(mut zones, sum, peak), &hr| {
                let zone = classifier.classify(hr)?;
                zones[zone.rank()] += 1;
                Ok::<_, PaceZonesError>((zones, sum + hr, peak.max(hr)))
            },
        )
        .try_reduce(
            || ([0u32; ZONE_COUNT], 0.0f64, 0.0f64),
            |(mut z1, s1, p1), (z2, s2, p2)| {
                for i in 0..ZONE_COUNT {
                    z1[i] += z2[i];
                }
                Ok((z1, s1 + s2, p1.max(p2)))
            },
        )?;

    Ok(HrZoneDistribution::from_counts(
        zone_counts,
        sum,
        peak,
        hr_data.len() as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries() -> Vec<ZoneBoundary> {
        vec![
            ZoneBoundary::new(0.0, 119.0),
            ZoneBoundary::new(120.0, 149.0),
            ZoneBoundary::new(150.0, 169.0),
        ]
    }

    #[test]
    fn test_classify() {
        let b = boundaries();
        assert_eq!(classify(&b, 100.0).unwrap().rank(), 0);
        assert_eq!(classify(&b, 120.0).unwrap(), HrZone::Moderate);
        assert_eq!(classify(&b, 169.0).unwrap(), HrZone::Tempo);
        assert!(matches!(
            classify(&b, 200.0),
            Err(PaceZonesError::OutOfRange { .. })
        ));
        assert!(matches!(
            classify(&b, -1.0),
            Err(PaceZonesError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_classify_gap_is_out_of_range() {
        let b = vec![ZoneBoundary::new(0.0, 119.0), ZoneBoundary::new(121.0, 149.0)];
        assert!(matches!(
            classify(&b, 120.0),
            Err(PaceZonesError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_too_many_buckets_is_invalid_zone() {
        let b: Vec<ZoneBoundary> = (0..6)
            .map(|i| ZoneBoundary::new(i as f64 * 20.0, i as f64 * 20.0 + 19.0))
            .collect();
        assert_eq!(classify(&b, 90.0).unwrap(), HrZone::Redline);
        assert!(matches!(
            classify(&b, 110.0),
            Err(PaceZonesError::InvalidZone { rank: 5 })
        ));
    }

    #[test]
    fn test_zone_rank_identity() {
        assert_eq!(HrZone::from_rank(2).unwrap(), HrZone::Tempo);
        assert!(matches!(
            HrZone::from_rank(7),
            Err(PaceZonesError::InvalidZone { rank: 7 })
        ));
        assert!(HrZone::Endurance < HrZone::Threshold);
        assert_eq!(HrZone::Tempo.to_string(), "Tempo");
        assert_eq!("threshold".parse::<HrZone>().unwrap(), HrZone::Threshold);
        assert!(matches!(
            "Sprint".parse::<HrZone>(),
            Err(PaceZonesError::UnknownZone { ref label }) if label == "Sprint"
        ));
        assert_eq!(HrZone::Redline.color(), "black");
    }

    #[test]
    fn test_from_profile_drops_top_zone() {
        let mut profile = boundaries();
        profile.push(ZoneBoundary::new(170.0, -1.0));
        let classifier = ZoneClassifier::from_profile(profile);
        assert_eq!(classifier.boundaries().len(), 3);
        assert!(classifier.classify(175.0).is_err());
    }

    #[test]
    fn test_classify_all_aborts_on_first_error() {
        let classifier = ZoneClassifier::new(boundaries());
        assert_eq!(
            classifier.classify_all(&[100.0, 130.0]).unwrap(),
            vec![HrZone::Endurance, HrZone::Moderate]
        );
        assert!(classifier.classify_all(&[100.0, 230.0, 130.0]).is_err());
    }

    #[test]
    fn test_hr_zone_distribution() {
        let classifier = ZoneClassifier::new(boundaries());
        let hr_data = vec![100.0, 110.0, 125.0, 140.0, 155.0, 160.0, 165.0, 115.0];
        let result = calculate_hr_zones(&hr_data, &classifier).unwrap();

        assert_eq!(result.total_samples, 8);
        assert_eq!(result.zone_samples, [3, 2, 3, 0, 0]);
        assert_eq!(result.peak_hr, 165.0);
        let total: f32 = result.zone_percentages.iter().sum();
        assert!((total - 100.0).abs() < 0.01);
        assert!((result.get_zone_percent(HrZone::Moderate) - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_data() {
        let classifier = ZoneClassifier::new(boundaries());
        let result = calculate_hr_zones(&[], &classifier).unwrap();
        assert_eq!(result.total_samples, 0);
        assert_eq!(result.peak_hr, 0.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let classifier = ZoneClassifier::new(boundaries());
        let hr_data: Vec<f64> = (0..20_000).map(|i| (90 + i % 80) as f64).collect();
        let seq = calculate_hr_zones(&hr_data, &classifier).unwrap();
        let par = calculate_hr_zones_parallel(&hr_data, &classifier).unwrap();
        assert_eq!(seq.zone_samples, par.zone_samples);
        assert_eq!(seq.peak_hr, par.peak_hr);
    }
}
