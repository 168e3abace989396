//! Seasonality impact: Ramadhan and weekend revenue lift, best month, peak day.

use campaign_core::types::CampaignRecord;
use campaign_core::DataGap;
use serde::{Deserialize, Serialize};

use crate::aggregation::{top, AggregateRow, Dimension, RankMetric};
use crate::filter::View;

/// Mean per-record revenue inside and outside a seasonal flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagBreakdown {
    pub flagged_mean_revenue: Option<f64>,
    pub baseline_mean_revenue: Option<f64>,
    /// `(flagged - baseline) / baseline * 100`. 0 when the baseline mean is
    /// not positive, `None` when either side has no records.
    pub lift_pct: Option<f64>,
}

impl FlagBreakdown {
    fn compute(view: &View<'_>, flag: impl Fn(&CampaignRecord) -> bool) -> Self {
        let (mut flagged, mut baseline) = ((0.0, 0usize), (0.0, 0usize));
        for r in view.iter() {
            let side = if flag(r) { &mut flagged } else { &mut baseline };
            side.0 += r.purchase_value;
            side.1 += 1;
        }
        let mean = |(sum, n): (f64, usize)| (n > 0).then(|| sum / n as f64);
        let flagged_mean_revenue = mean(flagged);
        let baseline_mean_revenue = mean(baseline);

        let lift_pct = match (flagged_mean_revenue, baseline_mean_revenue) {
            (Some(f), Some(b)) if b > 0.0 => Some((f - b) / b * 100.0),
            (Some(_), Some(_)) => Some(0.0),
            _ => None,
        };

        Self {
            flagged_mean_revenue,
            baseline_mean_revenue,
            lift_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalImpact {
    pub ramadhan: FlagBreakdown,
    pub weekend: FlagBreakdown,
    /// Month with the highest revenue; earliest month on ties.
    pub best_month: Option<AggregateRow>,
    /// Day with the highest revenue; earliest day on ties.
    pub peak_day: Option<AggregateRow>,
}

pub fn seasonal_impact(view: &View<'_>) -> Result<SeasonalImpact, DataGap> {
    if view.is_empty() {
        return Err(DataGap::EmptyView);
    }
    Ok(SeasonalImpact {
        ramadhan: FlagBreakdown::compute(view, |r| r.is_ramadhan),
        weekend: FlagBreakdown::compute(view, |r| r.is_weekend),
        best_month: top(view, Dimension::Month, RankMetric::Revenue),
        peak_day: top(view, Dimension::Day, RankMetric::Revenue),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{date, record};
    use crate::filter::{filter, FilterParams};
    use crate::store::RecordStore;

    fn flagged(day: u32, revenue: f64, ramadhan: bool, weekend: bool) -> CampaignRecord {
        let mut r = record(date(2023, 3, day), "A", "Sales", 10.0, revenue);
        r.is_ramadhan = ramadhan;
        r.is_weekend = weekend;
        r
    }

    #[test]
    fn test_lift_against_baseline() {
        let store = RecordStore::new(vec![
            flagged(1, 100.0, false, false),
            flagged(2, 100.0, false, true),
            flagged(25, 150.0, true, true),
            flagged(26, 150.0, true, false),
        ]);
        let view = filter(&store, &FilterParams::all(&store).unwrap()).unwrap();
        let impact = seasonal_impact(&view).unwrap();

        assert!((impact.ramadhan.lift_pct.unwrap() - 50.0).abs() < 1e-9);
        assert!((impact.weekend.lift_pct.unwrap() - 0.0).abs() < 1e-9);
        assert_eq!(impact.peak_day.unwrap().key.date(), Some(date(2023, 3, 25)));
        assert_eq!(impact.best_month.unwrap().key.date(), Some(date(2023, 3, 1)));
    }

    #[test]
    fn test_missing_side_is_unavailable() {
        let store = RecordStore::new(vec![flagged(1, 100.0, false, false)]);
        let view = filter(&store, &FilterParams::all(&store).unwrap()).unwrap();
        let impact = seasonal_impact(&view).unwrap();
        assert_eq!(impact.ramadhan.lift_pct, None);
        assert_eq!(impact.ramadhan.flagged_mean_revenue, None);
    }

    #[test]
    fn test_zero_baseline_lift_is_zero() {
        let store = RecordStore::new(vec![
            flagged(1, 0.0, false, false),
            flagged(25, 80.0, true, false),
        ]);
        let view = filter(&store, &FilterParams::all(&store).unwrap()).unwrap();
        assert_eq!(seasonal_impact(&view).unwrap().ramadhan.lift_pct, Some(0.0));
    }
}
