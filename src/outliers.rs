//! Inter-quartile range outlier exclusion.
//!
//! Fences are Tukey's `Q1 - k*IQR` and `Q3 + k*IQR`, inclusive. The analysis
//! pipeline filters each heart rate zone against its own fences.

use log::debug;

use crate::stats::iqr_fences;
use crate::streams::{column, AlignedSample, SampleField};
use crate::zones::HrZone;

/// Default fence distance in IQRs.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Keep rows whose `field` lies inside the inclusive IQR fences.
pub fn exclude_outliers(
    rows: &[AlignedSample],
    field: SampleField,
    multiplier: f64,
) -> Vec<AlignedSample> {
    let values = column(rows, field);
    let Some((low, high)) = iqr_fences(&values, multiplier) else {
        return Vec::new();
    };

    rows.iter()
        .zip(values)
        .filter(|(_, v)| low <= *v && *v <= high)
        .map(|(row, _)| row.clone())
        .collect()
}

/// Apply [`exclude_outliers`] to each zone separately and concatenate the
/// survivors, zones in order of first appearance.
pub fn exclude_outliers_by_zone(
    rows: &[AlignedSample],
    field: SampleField,
    multiplier: f64,
) -> Vec<AlignedSample> {
    let mut zones: Vec<HrZone> = Vec::new();
    for row in rows {
        if !zones.contains(&row.zone) {
            zones.push(row.zone);
        }
    }

    let mut kept = Vec::with_capacity(rows.len());
    for zone in zones {
        let group: Vec<AlignedSample> = rows.iter().filter(|r| r.zone == zone).cloned().collect();
        let filtered = exclude_outliers(&group, field, multiplier);
        debug!(
            "[Outliers] {}: kept {}/{} samples",
            zone,
            filtered.len(),
            group.len()
        );
        kept.extend(filtered);
    }
    kept
}
