//! Scalar KPIs and period-over-period deltas.
//!
//! Two conventions coexist. Headline cards use the mean of
//! per-record ratios (`mean_roas`, `mean_cpc`, `mean_ctr`); the performance
//! section uses ratio-of-sums (`roas_blended`, `ctr_blended`). The two are
//! reported under distinct names and must not be substituted for each other.

use campaign_core::types::{blended, CampaignRecord};
use campaign_core::DataGap;
use serde::{Deserialize, Serialize};

use crate::filter::View;

/// Running sums over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub records: usize,
    pub spend: f64,
    pub revenue: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub add_to_cart: u64,
    pub purchases: u64,
    roas: MeanAcc,
    cpc: MeanAcc,
    ctr: MeanAcc,
}

/// Mean over the defined values only; undefined ratios are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

impl Totals {
    pub fn add(&mut self, record: &CampaignRecord) {
        self.records += 1;
        self.spend += record.amount_spent;
        self.revenue += record.purchase_value;
        self.impressions += record.impressions;
        self.clicks += record.clicks;
        self.add_to_cart += record.add_to_cart;
        self.purchases += record.purchase;
        self.roas.push(record.roas());
        self.cpc.push(record.cpc());
        self.ctr.push(record.ctr_percentage());
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CampaignRecord>) -> Self {
        let mut totals = Self::default();
        for r in records {
            totals.add(r);
        }
        totals
    }

    /// `Σ purchase_value / Σ amount_spent`, 0 when nothing was spent.
    pub fn roas_blended(&self) -> f64 {
        blended(self.revenue, self.spend)
    }

    /// `Σ clicks / Σ impressions * 100`, 0 without impressions.
    pub fn ctr_blended(&self) -> f64 {
        blended(self.clicks as f64, self.impressions as f64) * 100.0
    }

    /// `Σ amount_spent / Σ clicks`, 0 without clicks.
    pub fn cpc_blended(&self) -> f64 {
        blended(self.spend, self.clicks as f64)
    }

    pub fn mean_roas(&self) -> Option<f64> {
        self.roas.mean()
    }

    pub fn mean_cpc(&self) -> Option<f64> {
        self.cpc.mean()
    }

    pub fn mean_ctr(&self) -> Option<f64> {
        self.ctr.mean()
    }
}

/// KPI snapshot of one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub record_count: usize,
    pub spend: f64,
    pub revenue: f64,
    pub impressions: u64,
    pub clicks: u64,
    /// Mean of per-record ROAS ("Avg ROAS"). `None` if no record had spend.
    pub mean_roas: Option<f64>,
    /// Ratio of sums ("Overall ROAS"). 0 when spend is 0.
    pub roas_blended: f64,
    /// Mean of per-record CPC ("Avg CPC"). `None` if no record had clicks.
    pub mean_cpc: Option<f64>,
    /// Mean of per-record CTR ("Avg CTR"). `None` if no record had impressions.
    pub mean_ctr: Option<f64>,
    /// Ratio of sums ("Overall CTR"). 0 without impressions.
    pub ctr_blended: f64,
}

pub fn summarize(view: &View<'_>) -> Result<Summary, DataGap> {
    if view.is_empty() {
        return Err(DataGap::EmptyView);
    }
    let totals = Totals::from_records(view.iter());
    Ok(Summary {
        record_count: totals.records,
        spend: totals.spend,
        revenue: totals.revenue,
        impressions: totals.impressions,
        clicks: totals.clicks,
        mean_roas: totals.mean_roas(),
        roas_blended: totals.roas_blended(),
        mean_cpc: totals.mean_cpc(),
        mean_ctr: totals.mean_ctr(),
        ctr_blended: totals.ctr_blended(),
    })
}

/// Blended ROAS of a single objective, e.g. "ROAS (Sales Only)".
pub fn objective_roas(view: &View<'_>, objective: &str) -> f64 {
    Totals::from_records(view.iter().filter(|r| r.campaign_objective == objective)).roas_blended()
}

// ─── Deltas ─────────────────────────────────────────────────────────────────

/// Formatting family of a metric's period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// Spend, revenue, CPC: shown as relative change.
    Relative,
    /// CTR, ROAS: shown as the absolute difference in points.
    PercentagePoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delta {
    Unavailable,
    Change {
        kind: DeltaKind,
        /// `(current - previous) / previous * 100`
        percent_change: f64,
        difference: f64,
    },
}

impl Delta {
    pub fn is_available(&self) -> bool {
        matches!(self, Delta::Change { .. })
    }

    pub fn percent_change(&self) -> Option<f64> {
        match self {
            Delta::Change { percent_change, .. } => Some(*percent_change),
            Delta::Unavailable => None,
        }
    }

    /// Display text for a metric card, `None` when there is nothing to compare.
    pub fn label(&self) -> Option<String> {
        match self {
            Delta::Unavailable => None,
            Delta::Change {
                kind: DeltaKind::Relative,
                percent_change,
                ..
            } => Some(format!("{percent_change:+.1}% vs Prev")),
            Delta::Change {
                kind: DeltaKind::PercentagePoints,
                difference,
                ..
            } => Some(format!("{difference:+.2} pts")),
        }
    }
}

/// Period-over-period change. Unavailable when `previous` is 0.
pub fn delta(current: f64, previous: f64, kind: DeltaKind) -> Delta {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return Delta::Unavailable;
    }
    let difference = current - previous;
    Delta::Change {
        kind,
        percent_change: difference / previous * 100.0,
        difference,
    }
}

fn delta_opt(current: Option<f64>, previous: Option<f64>, kind: DeltaKind) -> Delta {
    match (current, previous) {
        (Some(c), Some(p)) => delta(c, p, kind),
        _ => Delta::Unavailable,
    }
}

/// Headline-card deltas against the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiDeltas {
    pub spend: Delta,
    pub revenue: Delta,
    pub roas: Delta,
    pub cpc: Delta,
    pub ctr: Delta,
}

impl KpiDeltas {
    pub fn unavailable() -> Self {
        Self {
            spend: Delta::Unavailable,
            revenue: Delta::Unavailable,
            roas: Delta::Unavailable,
            cpc: Delta::Unavailable,
            ctr: Delta::Unavailable,
        }
    }
}

/// Compares headline figures. With no previous summary every delta is unavailable.
pub fn compare(current: &Summary, previous: Option<&Summary>) -> KpiDeltas {
    let Some(prev) = previous else {
        return KpiDeltas::unavailable();
    };
    KpiDeltas {
        spend: delta(current.spend, prev.spend, DeltaKind::Relative),
        revenue: delta(current.revenue, prev.revenue, DeltaKind::Relative),
        roas: delta_opt(current.mean_roas, prev.mean_roas, DeltaKind::PercentagePoints),
        cpc: delta_opt(current.mean_cpc, prev.mean_cpc, DeltaKind::Relative),
        ctr: delta_opt(current.mean_ctr, prev.mean_ctr, DeltaKind::PercentagePoints),
    }
}
