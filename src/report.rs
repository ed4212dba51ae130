//! Plain-text activity summary.

use std::fmt;

use crate::analysis::ActivityAnalysis;

/// Text summary of one analysis: per-zone average paces, per-zone pace
/// ranges, then whole-activity figures.
pub struct ActivityReport<'a> {
    analysis: &'a ActivityAnalysis,
}

impl<'a> ActivityReport<'a> {
    pub fn new(analysis: &'a ActivityAnalysis) -> Self {
        Self { analysis }
    }

    /// Report lines without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        let a = self.analysis;
        let mut lines = Vec::new();

        for zone in &a.zones {
            lines.push(format!("{} Average Pace: {}", zone.zone, zone.mean_pace));
        }
        lines.push(String::new());
        lines.push(String::new());

        for zone in &a.zones {
            lines.push(format!(
                "{} Range: {} to {}",
                zone.zone, zone.min_pace, zone.max_pace
            ));
        }
        lines.push(String::new());
        lines.push(String::new());

        lines.push(format!(
            "Correlation between Heart Rate and Pace = {}",
            number_or_nan(a.hr_pace_correlation)
        ));
        lines.push(format!(
            "Average Elevation Gradient = {}",
            number_or_nan(a.mean_elevation_gradient)
        ));
        lines.push(format!(
            "Average HR Gradient = {}",
            number_or_nan(a.mean_hr_gradient)
        ));

        let gain = &a.elevation_gain;
        lines.push(format!(
            "Elevation Gain = {:?} {} | {:?} {}",
            gain.gain,
            gain.unit.elevation_label(),
            gain.gain_other,
            gain.unit.other().elevation_label()
        ));

        lines
    }
}

/// Floats keep their decimal point (`10.0`, not `10`); a missing figure is `nan`.
fn number_or_nan(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => "nan".to_string(),
    }
}

impl fmt::Display for ActivityReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::analyze_activity;
    use crate::zones::{ZoneBoundary, ZoneClassifier};
    use crate::{ActivityStreams, AnalysisConfig};

    fn analysis() -> crate::analysis::ActivityAnalysis {
        let streams = ActivityStreams {
            heart_rate: vec![100.0, 110.0, 130.0, 140.0],
            // 600, 600, 480, 480 s/mi
            velocity: vec![2.68224, 2.68224, 3.3528, 3.3528],
            elevation: vec![30.48, 32.004, 32.004, 30.48],
            time: vec![0.0, 60.0, 120.0, 180.0],
            distance: vec![0.0, 160.0, 360.0, 560.0],
        };
        let classifier = ZoneClassifier::new(vec![
            ZoneBoundary::new(0.0, 119.0),
            ZoneBoundary::new(120.0, 149.0),
        ]);
        analyze_activity(&streams, &classifier, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_report_layout() {
        let analysis = analysis();
        let lines = analysis.report().lines();

        assert_eq!(lines[0], "Endurance Average Pace: 10:00/mi");
        assert_eq!(lines[1], "Moderate Average Pace: 8:00/mi");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Endurance Range: 10:00/mi to 10:00/mi");
        assert_eq!(lines[5], "Moderate Range: 8:00/mi to 8:00/mi");
        assert!(lines[8].starts_with("Correlation between Heart Rate and Pace = -0.9"));
        assert_eq!(lines[9], "Average Elevation Gradient = 0.0");
        assert_eq!(lines[10], "Average HR Gradient = 10.0");
        assert_eq!(lines[11], "Elevation Gain = 5.0 ft | 2.0 m");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_downhill_run_reports_zero_gain() {
        let streams = ActivityStreams {
            heart_rate: vec![100.0, 105.0, 110.0],
            velocity: vec![2.68224, 2.68224, 2.68224],
            // 100, 99, 97 ft
            elevation: vec![30.48, 30.175, 29.566],
            time: vec![0.0, 60.0, 120.0],
            distance: vec![0.0, 160.0, 320.0],
        };
        let classifier = ZoneClassifier::new(vec![ZoneBoundary::new(0.0, 119.0)]);
        let analysis =
            analyze_activity(&streams, &classifier, &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.elevation_gain.gain, 0.0);
        assert!(analysis.elevation_gain.gain.is_sign_positive());
        assert!(analysis.elevation_gain.gain_other.is_sign_positive());
        let lines = analysis.report().lines();
        assert_eq!(lines.last().unwrap(), "Elevation Gain = 0.0 ft | 0.0 m");
    }

    #[test]
    fn test_display_joins_lines() {
        let analysis = analysis();
        let text = analysis.report().to_string();
        assert!(text.contains("8:00/mi\n\n\nEndurance Range"));
        assert!(!text.ends_with('\n'));
    }
}
