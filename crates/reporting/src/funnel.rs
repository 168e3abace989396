//! Funnel analysis: impressions -> clicks -> add-to-cart -> purchase.

use campaign_core::types::blended;
use campaign_core::DataGap;
use serde::{Deserialize, Serialize};

use crate::filter::View;
use crate::metrics::Totals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Impressions,
    Clicks,
    AddToCart,
    Purchase,
}

impl FunnelStage {
    pub const ORDER: [FunnelStage; 4] = [
        FunnelStage::Impressions,
        FunnelStage::Clicks,
        FunnelStage::AddToCart,
        FunnelStage::Purchase,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStepResult {
    pub stage: FunnelStage,
    pub count: u64,
    /// `count / previous stage count * 100`; `None` for the first stage.
    pub conversion_rate: Option<f64>,
    pub dropped_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelResult {
    pub steps: Vec<FunnelStepResult>,
    /// clicks / impressions
    pub ctr: f64,
    /// add_to_cart / clicks
    pub cart_rate: f64,
    /// purchase / add_to_cart
    pub purchase_rate: f64,
    /// purchase / clicks
    pub overall_conversion_rate: f64,
}

impl FunnelResult {
    /// All rates are percentages, 0 when the denominator stage is empty.
    pub fn from_counts(impressions: u64, clicks: u64, add_to_cart: u64, purchases: u64) -> Self {
        let counts = [impressions, clicks, add_to_cart, purchases];
        let steps = FunnelStage::ORDER
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let (conversion_rate, dropped_off) = if i == 0 {
                    (None, 0)
                } else {
                    (
                        Some(rate(counts[i], counts[i - 1])),
                        counts[i - 1].saturating_sub(counts[i]),
                    )
                };
                FunnelStepResult {
                    stage: *stage,
                    count: counts[i],
                    conversion_rate,
                    dropped_off,
                }
            })
            .collect();

        Self {
            steps,
            ctr: rate(clicks, impressions),
            cart_rate: rate(add_to_cart, clicks),
            purchase_rate: rate(purchases, add_to_cart),
            overall_conversion_rate: rate(purchases, clicks),
        }
    }
}

fn rate(numerator: u64, denominator: u64) -> f64 {
    blended(numerator as f64, denominator as f64) * 100.0
}

/// Stage counts are plain sums over the view.
pub fn analyze_funnel(view: &View<'_>) -> Result<FunnelResult, DataGap> {
    if view.is_empty() {
        return Err(DataGap::EmptyView);
    }
    let totals = Totals::from_records(view.iter());
    Ok(FunnelResult::from_counts(
        totals.impressions,
        totals.clicks,
        totals.add_to_cart,
        totals.purchases,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::ten_row_store;
    use crate::filter::{filter, FilterParams};

    #[test]
    fn test_stage_rates() {
        let funnel = FunnelResult::from_counts(10_000, 200, 40, 10);
        assert!((funnel.ctr - 2.0).abs() < 1e-12);
        assert!((funnel.cart_rate - 20.0).abs() < 1e-12);
        assert!((funnel.purchase_rate - 25.0).abs() < 1e-12);
        assert!((funnel.overall_conversion_rate - 5.0).abs() < 1e-12);

        assert_eq!(funnel.steps.len(), 4);
        assert_eq!(funnel.steps[0].conversion_rate, None);
        assert_eq!(funnel.steps[1].dropped_off, 9_800);
        assert_eq!(funnel.steps[3].stage, FunnelStage::Purchase);
    }

    #[test]
    fn test_empty_stage_denominators() {
        let funnel = FunnelResult::from_counts(1_000, 0, 0, 0);
        assert_eq!(funnel.cart_rate, 0.0);
        assert_eq!(funnel.purchase_rate, 0.0);
        assert_eq!(funnel.overall_conversion_rate, 0.0);
        assert_eq!(funnel.steps[2].conversion_rate, Some(0.0));
    }

    #[test]
    fn test_funnel_sums_view() {
        let store = ten_row_store();
        let view = filter(&store, &FilterParams::all(&store).unwrap()).unwrap();
        let funnel = analyze_funnel(&view).unwrap();
        assert_eq!(funnel.steps[0].count, 10_000);
        assert_eq!(funnel.steps[1].count, 200);
        assert_eq!(funnel.steps[2].count, 40);
        assert_eq!(funnel.steps[3].count, 10);
    }
}
