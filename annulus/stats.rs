//! Quantities derived from an interpolated mean and standard deviation.

use serde::Serialize;
use std::fmt;

/// Width of the normal range, in standard deviations either side of the mean.
pub const NORMAL_RANGE_SDS: f64 = 2.0;

/// Interpolated population statistics for one patient, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub mean_aad: f64,
    pub std_dev: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Prediction {
    pub fn from_statistics(mean_aad: f64, std_dev: f64) -> Self {
        let range = normal_range(mean_aad, std_dev);
        Self {
            mean_aad,
            std_dev,
            lower_bound: range.lower,
            upper_bound: range.upper,
        }
    }

    pub fn normal_range(&self) -> NormalRange {
        NormalRange {
            lower: self.lower_bound,
            upper: self.upper_bound,
        }
    }

    /// Z-score of a measured diameter against this prediction.
    pub fn z_score(&self, measured: f64) -> Option<f64> {
        z_score(measured, self.mean_aad, self.std_dev)
    }

    /// Bundles the prediction with an optional measured diameter.
    pub fn report(&self, measured: Option<f64>) -> PredictionReport {
        let z = measured.and_then(|value| self.z_score(value));
        PredictionReport {
            prediction: *self,
            measured,
            z_score: z,
            band: z.map(ZScoreBand::classify),
        }
    }
}

/// `[mean - 2·sd, mean + 2·sd]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalRange {
    pub lower: f64,
    pub upper: f64,
}

impl NormalRange {
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

pub fn normal_range(mean: f64, std_dev: f64) -> NormalRange {
    NormalRange {
        lower: mean - NORMAL_RANGE_SDS * std_dev,
        upper: mean + NORMAL_RANGE_SDS * std_dev,
    }
}

/// `(measured - mean) / std_dev`.
///
/// Returns `None` unless `measured` is a positive finite number and `std_dev`
/// is positive and finite.
pub fn z_score(measured: f64, mean: f64, std_dev: f64) -> Option<f64> {
    if !(measured.is_finite() && measured > 0.0) {
        return None;
    }
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return None;
    }
    Some((measured - mean) / std_dev)
}

/// Where a Z-score falls relative to the normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZScoreBand {
    Below,
    Within,
    Above,
}

impl ZScoreBand {
    pub fn classify(z: f64) -> Self {
        if z < -NORMAL_RANGE_SDS {
            Self::Below
        } else if z > NORMAL_RANGE_SDS {
            Self::Above
        } else {
            Self::Within
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Below => "below the normal range",
            Self::Within => "within the normal range",
            Self::Above => "above the normal range",
        }
    }
}

impl fmt::Display for ZScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A prediction together with the clinician's measurement, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionReport {
    pub prediction: Prediction,
    pub measured: Option<f64>,
    pub z_score: Option<f64>,
    pub band: Option<ZScoreBand>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_range_spans_two_standard_deviations() {
        let p = Prediction::from_statistics(22.0, 1.5);
        assert_eq!(p.lower_bound, 19.0);
        assert_eq!(p.upper_bound, 25.0);
        assert!(p.normal_range().contains(19.0));
        assert!(p.normal_range().contains(25.0));
        assert!(!p.normal_range().contains(25.01));
    }

    #[test]
    fn z_score_is_plain_arithmetic() {
        let (measured, mean, sd) = (20.0, 22.908, 1.75);
        assert_eq!(z_score(measured, mean, sd), Some((measured - mean) / sd));
        let z = z_score(measured, mean, sd).unwrap();
        assert!((z - (-1.661_714_285_714_285_7)).abs() < 1e-12);
    }

    #[test]
    fn z_score_is_absent_for_unusable_inputs() {
        assert_eq!(z_score(20.0, 22.0, 0.0), None);
        assert_eq!(z_score(20.0, 22.0, -1.0), None);
        assert_eq!(z_score(20.0, 22.0, f64::NAN), None);
        assert_eq!(z_score(0.0, 22.0, 1.5), None);
        assert_eq!(z_score(-3.0, 22.0, 1.5), None);
        assert_eq!(z_score(f64::NAN, 22.0, 1.5), None);
        assert_eq!(z_score(f64::INFINITY, 22.0, 1.5), None);
    }

    #[test]
    fn bands_match_the_normal_range() {
        assert_eq!(ZScoreBand::classify(-2.5), ZScoreBand::Below);
        assert_eq!(ZScoreBand::classify(-2.0), ZScoreBand::Within);
        assert_eq!(ZScoreBand::classify(0.3), ZScoreBand::Within);
        assert_eq!(ZScoreBand::classify(2.0), ZScoreBand::Within);
        assert_eq!(ZScoreBand::classify(2.01), ZScoreBand::Above);
    }

    #[test]
    fn report_without_measurement_has_no_z_score() {
        let p = Prediction::from_statistics(20.0, 2.0);
        let report = p.report(None);
        assert_eq!(report.z_score, None);
        assert_eq!(report.band, None);

        let report = p.report(Some(26.0));
        assert_eq!(report.z_score, Some(3.0));
        assert_eq!(report.band, Some(ZScoreBand::Above));

        let report = p.report(Some(-1.0));
        assert_eq!(report.measured, Some(-1.0));
        assert_eq!(report.z_score, None);
    }
}
