//! Segment and time-bucket aggregation with deterministic ranking.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use campaign_core::types::CampaignRecord;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::View;
use crate::metrics::Totals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Day,
    /// Date truncated to the first of its month.
    Month,
    Client,
    Industry,
    Objective,
    ClientIndustry,
}

/// Group key. Ordering is chronological for dates and lexical for labels,
/// which is also the tie-break order used by [`rank`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Date(NaiveDate),
    Label(String),
    Pair(String, String),
}

impl GroupKey {
    fn of(record: &CampaignRecord, dimension: Dimension) -> Self {
        match dimension {
            Dimension::Day => GroupKey::Date(record.date),
            Dimension::Month => GroupKey::Date(record.date.with_day(1).unwrap_or(record.date)),
            Dimension::Client => GroupKey::Label(record.client_name.clone()),
            Dimension::Industry => GroupKey::Label(record.industry.clone()),
            Dimension::Objective => GroupKey::Label(record.campaign_objective.clone()),
            Dimension::ClientIndustry => {
                GroupKey::Pair(record.client_name.clone(), record.industry.clone())
            }
        }
    }

    /// Entity name for label keys; the first component for pairs.
    pub fn name(&self) -> Option<&str> {
        match self {
            GroupKey::Label(name) | GroupKey::Pair(name, _) => Some(name),
            GroupKey::Date(_) => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            GroupKey::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// One derived row per group. Money and count fields are sums; `roas`,
/// `ctr` and `cpc` are ratio-of-sums for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub records: usize,
    pub spend: f64,
    pub revenue: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub add_to_cart: u64,
    pub purchases: u64,
    /// `Σ revenue / Σ spend`, 0 when the group spent nothing.
    pub roas: f64,
    pub ctr: f64,
    pub cpc: f64,
    /// Mean of per-record ROAS within the group (headline convention).
    pub mean_roas: Option<f64>,
    /// Mean revenue per record.
    pub avg_revenue: f64,
    /// Mean spend per record.
    pub avg_spend: f64,
}

impl AggregateRow {
    fn from_totals(key: GroupKey, totals: &Totals) -> Self {
        let n = totals.records.max(1) as f64;
        Self {
            key,
            records: totals.records,
            spend: totals.spend,
            revenue: totals.revenue,
            impressions: totals.impressions,
            clicks: totals.clicks,
            add_to_cart: totals.add_to_cart,
            purchases: totals.purchases,
            roas: totals.roas_blended(),
            ctr: totals.ctr_blended(),
            cpc: totals.cpc_blended(),
            mean_roas: totals.mean_roas(),
            avg_revenue: totals.revenue / n,
            avg_spend: totals.spend / n,
        }
    }

    pub fn value(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::Revenue => self.revenue,
            RankMetric::Spend => self.spend,
            RankMetric::Roas => self.roas,
            // Groups without a defined mean rank last.
            RankMetric::MeanRoas => self.mean_roas.unwrap_or(f64::NEG_INFINITY),
        }
    }
}

/// Rows ordered by key: chronological for `Day`/`Month`, lexical otherwise.
pub fn group_by(view: &View<'_>, dimension: Dimension) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<GroupKey, Totals> = BTreeMap::new();
    for record in view.iter() {
        groups
            .entry(GroupKey::of(record, dimension))
            .or_default()
            .add(record);
    }
    groups
        .into_iter()
        .map(|(key, totals)| AggregateRow::from_totals(key, &totals))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Revenue,
    Spend,
    /// Ratio-of-sums ROAS.
    Roas,
    /// Mean of per-record ROAS.
    MeanRoas,
}

/// Descending by `metric`; equal values fall back to ascending key order.
pub fn rank(rows: &[AggregateRow], metric: RankMetric) -> Vec<AggregateRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| compare_desc(a, b, metric));
    ranked
}

pub fn ranked(view: &View<'_>, dimension: Dimension, metric: RankMetric) -> Vec<AggregateRow> {
    rank(&group_by(view, dimension), metric)
}

/// "Hero" pick: the first row in ranked order. Exact ties resolve to the
/// lexically (or chronologically) smallest key.
pub fn top(view: &View<'_>, dimension: Dimension, metric: RankMetric) -> Option<AggregateRow> {
    group_by(view, dimension)
        .into_iter()
        .min_by(|a, b| compare_desc(a, b, metric))
}

fn compare_desc(a: &AggregateRow, b: &AggregateRow, metric: RankMetric) -> Ordering {
    b.value(metric)
        .total_cmp(&a.value(metric))
        .then_with(|| a.key.cmp(&b.key))
}
