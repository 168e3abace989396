//! Rolling-window z-score gate over a daily series.
//!
//! For each point with a full trailing window (the point itself plus the
//! `window - 1` before it), the rolling mean and *sample* standard deviation
//! (n - 1 denominator) are computed over that window. The point is flagged
//! when it lies strictly outside `mean ± k * std`.

use std::collections::BTreeSet;

use campaign_core::config::AnomalyConfig;
use campaign_core::{CampaignError, CampaignResult, DataGap};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregation::{group_by, Dimension};
use crate::filter::View;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Rolling statistics at one evaluable point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingBand {
    pub date: NaiveDate,
    pub value: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    window: usize,
    k: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self { window: 7, k: 2.0 }
    }
}

impl AnomalyDetector {
    pub fn new(window: usize, k: f64) -> CampaignResult<Self> {
        if window < 2 {
            return Err(CampaignError::Validation(format!(
                "anomaly window must be at least 2, got {window}"
            )));
        }
        if k.is_nan() || k <= 0.0 {
            return Err(CampaignError::Validation(format!(
                "anomaly k must be positive, got {k}"
            )));
        }
        Ok(Self { window, k })
    }

    pub fn from_config(config: &AnomalyConfig) -> CampaignResult<Self> {
        Self::new(config.window, config.k)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Dates of anomalous points. Series shorter than `window + 1` points
    /// yield no anomalies.
    pub fn detect(&self, series: &[DailyPoint]) -> BTreeSet<NaiveDate> {
        self.detect_checked(series).unwrap_or_default()
    }

    /// Like [`detect`](Self::detect) but reports insufficient history explicitly.
    pub fn detect_checked(&self, series: &[DailyPoint]) -> Result<BTreeSet<NaiveDate>, DataGap> {
        Ok(self
            .bands(series)?
            .into_iter()
            .filter(|b| b.is_anomaly)
            .map(|b| b.date)
            .collect())
    }

    /// Rolling bands for every point with a full window.
    pub fn bands(&self, series: &[DailyPoint]) -> Result<Vec<RollingBand>, DataGap> {
        if series.len() <= self.window {
            return Err(DataGap::InsufficientHistory);
        }

        Ok(series
            .windows(self.window)
            .map(|window| {
                let point = window[self.window - 1];
                let (mean, std_dev) = mean_and_sample_std(window);
                let lower = mean - self.k * std_dev;
                let upper = mean + self.k * std_dev;
                RollingBand {
                    date: point.date,
                    value: point.value,
                    mean,
                    std_dev,
                    lower,
                    upper,
                    is_anomaly: point.value > upper || point.value < lower,
                }
            })
            .collect())
    }
}

fn mean_and_sample_std(window: &[DailyPoint]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().map(|p| p.value).sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|p| (p.value - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    (mean, variance.sqrt())
}

/// Daily revenue totals of the view in date order. Days without records
/// are absent, not zero-filled.
pub fn daily_revenue(view: &View<'_>) -> Vec<DailyPoint> {
    group_by(view, Dimension::Day)
        .into_iter()
        .filter_map(|row| {
            row.key.date().map(|date| DailyPoint {
                date,
                value: row.revenue,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{date, record};
    use crate::filter::{filter, FilterParams};
    use crate::store::RecordStore;

    fn series(values: &[f64]) -> Vec<DailyPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyPoint {
                date: date(2023, 3, 1 + i as u32),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_single_spike_flagged() {
        let mut values = vec![100.0; 10];
        values[7] = 1000.0; // day 8
        let flagged = AnomalyDetector::default().detect(&series(&values));
        assert_eq!(flagged.len(), 1);
        assert!(flagged.contains(&date(2023, 3, 8)));
    }

    #[test]
    fn test_leading_points_never_evaluated() {
        let mut values = vec![100.0; 10];
        values[0] = 10_000.0;
        values[3] = 0.0;
        let detector = AnomalyDetector::default();
        let bands = detector.bands(&series(&values)).unwrap();
        assert_eq!(bands.len(), 4);
        assert_eq!(bands[0].date, date(2023, 3, 7));
        let flagged = detector.detect(&series(&values));
        assert!(flagged.iter().all(|d| *d >= date(2023, 3, 7)));
    }

    #[test]
    fn test_insufficient_history() {
        let detector = AnomalyDetector::default();
        let short = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert!(detector.detect(&short).is_empty());
        assert_eq!(
            detector.detect_checked(&short),
            Err(DataGap::InsufficientHistory)
        );
        assert!(detector.detect(&[]).is_empty());
    }

    #[test]
    fn test_drop_flagged() {
        let mut values = vec![100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 100.0, 101.0, 99.0, 100.0];
        values[9] = 0.0;
        let flagged = AnomalyDetector::default().detect(&series(&values));
        assert_eq!(flagged.into_iter().collect::<Vec<_>>(), vec![date(2023, 3, 10)]);
    }

    #[test]
    fn test_sample_std_convention() {
        let bands = AnomalyDetector::new(2, 1.0)
            .unwrap()
            .bands(&series(&[0.0, 2.0, 2.0]))
            .unwrap();
        // window [0, 2]: mean 1, sample std sqrt(2)
        assert!((bands[0].std_dev - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(AnomalyDetector::new(1, 2.0).is_err());
        assert!(AnomalyDetector::new(7, 0.0).is_err());
    }

    #[test]
    fn test_daily_revenue_series() {
        let store = RecordStore::new(vec![
            record(date(2023, 3, 2), "A", "Sales", 1.0, 5.0),
            record(date(2023, 3, 1), "A", "Sales", 1.0, 3.0),
            record(date(2023, 3, 1), "B", "Sales", 1.0, 4.0),
        ]);
        let view = filter(&store, &FilterParams::all(&store).unwrap()).unwrap();
        let points = daily_revenue(&view);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2023, 3, 1));
        assert!((points[0].value - 7.0).abs() < 1e-12);
    }
}
