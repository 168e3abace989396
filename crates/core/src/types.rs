use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One campaign-day row of the input dataset. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub date: NaiveDate,
    pub client_name: String,
    pub industry: String,
    pub campaign_objective: String,
    pub amount_spent: f64,
    pub purchase_value: f64,
    pub impressions: u64,
    pub clicks: u64,
    #[serde(default)]
    pub add_to_cart: u64,
    pub purchase: u64,
    pub is_weekend: bool,
    pub is_ramadhan: bool,
}

impl CampaignRecord {
    /// `purchase_value / amount_spent`, undefined when nothing was spent.
    pub fn roas(&self) -> Option<f64> {
        ratio(self.purchase_value, self.amount_spent)
    }

    /// `amount_spent / clicks`, undefined without clicks.
    pub fn cpc(&self) -> Option<f64> {
        ratio(self.amount_spent, self.clicks as f64)
    }

    /// `clicks / impressions * 100`, undefined without impressions.
    pub fn ctr_percentage(&self) -> Option<f64> {
        ratio(self.clicks as f64, self.impressions as f64).map(|r| r * 100.0)
    }
}

/// Returns `numerator / denominator`, or `None` when the denominator is not
/// strictly positive.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Ratio-of-sums with the blended-figure sentinel: 0 when undefined.
pub fn blended(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator).unwrap_or(0.0)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
