//! Automated data highlights shown above the trend charts.

use campaign_core::types::blended;
use campaign_core::DataGap;
use serde::{Deserialize, Serialize};

use crate::aggregation::{top, AggregateRow, Dimension, RankMetric};
use crate::filter::PeriodViews;
use crate::metrics::{delta, Delta, DeltaKind, Totals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDominance {
    pub client: String,
    pub revenue: f64,
    /// Share of total revenue in percent, 0 when there is no revenue.
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedFigure {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub market_dominance: Option<MarketDominance>,
    /// Relative spend change against the previous period.
    pub cost_trend: Delta,
    /// Objective with the highest mean per-record ROAS.
    pub efficiency_winner: Option<NamedFigure>,
    /// Industry with the most revenue.
    pub winning_industry: Option<NamedFigure>,
    /// Industry with the highest blended ROAS.
    pub efficient_industry: Option<NamedFigure>,
}

fn named(
    row: Option<AggregateRow>,
    value: impl Fn(&AggregateRow) -> Option<f64>,
) -> Option<NamedFigure> {
    let row = row?;
    Some(NamedFigure {
        name: row.key.name()?.to_string(),
        value: value(&row)?,
    })
}

pub fn highlights(periods: &PeriodViews<'_>) -> Result<Highlights, DataGap> {
    let view = &periods.current;
    if view.is_empty() {
        return Err(DataGap::EmptyView);
    }
    let current = Totals::from_records(view.iter());

    let market_dominance = top(view, Dimension::Client, RankMetric::Revenue).and_then(|row| {
        Some(MarketDominance {
            client: row.key.name()?.to_string(),
            revenue: row.revenue,
            share_pct: blended(row.revenue, current.revenue) * 100.0,
        })
    });

    let cost_trend = if periods.has_prior_period() {
        let previous = Totals::from_records(periods.previous.iter());
        delta(current.spend, previous.spend, DeltaKind::Relative)
    } else {
        Delta::Unavailable
    };

    Ok(Highlights {
        market_dominance,
        cost_trend,
        efficiency_winner: named(top(view, Dimension::Objective, RankMetric::MeanRoas), |r| {
            r.mean_roas
        }),
        winning_industry: named(top(view, Dimension::Industry, RankMetric::Revenue), |r| {
            Some(r.revenue)
        }),
        efficient_industry: named(top(view, Dimension::Industry, RankMetric::Roas), |r| {
            Some(r.roas)
        }),
    })
}
