//! Budget reallocation "what-if" projections.
//!
//! The model holds ROAS constant: moving `x` of spend from a source with
//! ROAS `r_s` to a target with ROAS `r_t` changes revenue by `x * (r_t - r_s)`.
//! This is a first-order approximation. Diminishing returns, audience
//! saturation and creative fatigue are not modelled. Global spend is
//! unchanged because spend is moved, not added.

use campaign_core::config::ReallocationConfig;
use campaign_core::types::blended;
use campaign_core::{CampaignError, CampaignResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregation::{group_by, AggregateRow, Dimension, GroupKey};
use crate::filter::View;
use crate::metrics::Totals;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReallocationRequest {
    pub source: String,
    pub target: String,
    pub source_spend: f64,
    pub source_roas: f64,
    pub target_roas: f64,
    /// Share of the source's spend to move, in percent.
    pub transfer_pct: f64,
    pub global_current_revenue: f64,
    pub global_total_spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReallocationOutcome {
    pub source: String,
    pub target: String,
    pub transfer_amount: f64,
    pub revenue_lost: f64,
    pub revenue_gained: f64,
    pub net_impact: f64,
    pub new_global_revenue: f64,
    pub old_global_roas: f64,
    pub new_global_roas: f64,
}

impl ReallocationOutcome {
    pub fn is_profitable(&self) -> bool {
        self.net_impact > 0.0
    }
}

pub fn simulate(request: &ReallocationRequest) -> CampaignResult<ReallocationOutcome> {
    if !(0.0..=100.0).contains(&request.transfer_pct) {
        return Err(CampaignError::Validation(format!(
            "transfer_pct must be within [0, 100], got {}",
            request.transfer_pct
        )));
    }
    if request.source == request.target {
        return Err(CampaignError::Validation(format!(
            "source and target must differ, both are '{}'",
            request.source
        )));
    }
    if request.source_spend.is_nan() || request.source_spend < 0.0 {
        return Err(CampaignError::Validation(format!(
            "source_spend must not be negative, got {}",
            request.source_spend
        )));
    }

    let transfer_amount = request.source_spend * request.transfer_pct / 100.0;
    let revenue_lost = transfer_amount * request.source_roas;
    let revenue_gained = transfer_amount * request.target_roas;
    let net_impact = revenue_gained - revenue_lost;
    let new_global_revenue = request.global_current_revenue + net_impact;

    Ok(ReallocationOutcome {
        source: request.source.clone(),
        target: request.target.clone(),
        transfer_amount,
        revenue_lost,
        revenue_gained,
        net_impact,
        new_global_revenue,
        old_global_roas: blended(request.global_current_revenue, request.global_total_spend),
        new_global_roas: blended(new_global_revenue, request.global_total_spend),
    })
}

/// Moves `transfer_pct` of one client's spend to another client, using both
/// clients' ratio-of-sums ROAS and the view's global totals.
pub fn simulate_clients(
    view: &View<'_>,
    source: &str,
    target: &str,
    transfer_pct: f64,
) -> CampaignResult<ReallocationOutcome> {
    if source == target {
        return Err(CampaignError::Validation(format!(
            "source and target must differ, both are '{source}'"
        )));
    }
    let rows = group_by(view, Dimension::Client);
    let source_row = find_client(&rows, source)?;
    let target_row = find_client(&rows, target)?;
    let global = Totals::from_records(view.iter());

    let outcome = simulate(&ReallocationRequest {
        source: source.to_string(),
        target: target.to_string(),
        source_spend: source_row.spend,
        source_roas: source_row.roas,
        target_roas: target_row.roas,
        transfer_pct,
        global_current_revenue: global.revenue,
        global_total_spend: global.spend,
    })?;
    debug!(
        source,
        target,
        transfer_pct,
        net_impact = outcome.net_impact,
        "Client reallocation simulated"
    );
    Ok(outcome)
}

fn find_client<'r>(rows: &'r [AggregateRow], name: &str) -> CampaignResult<&'r AggregateRow> {
    rows.iter()
        .find(|r| matches!(&r.key, GroupKey::Label(n) if n == name))
        .ok_or_else(|| {
            CampaignError::Validation(format!("unknown client '{name}' in current view"))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkSource {
    /// Blended ROAS of the benchmark objective in the current view.
    Observed,
    /// Configured fallback; the view had no benchmark-objective spend.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReallocation {
    pub outcome: ReallocationOutcome,
    pub benchmark_roas: f64,
    pub benchmark_source: BenchmarkSource,
    /// `net_impact / current revenue * 100`, 0 when there is no revenue.
    pub projected_growth_pct: f64,
}

/// Moves part of a whole objective's spend (e.g. Traffic) into the benchmark
/// objective (e.g. Sales) at the benchmark's ROAS.
pub fn simulate_category(
    view: &View<'_>,
    config: &ReallocationConfig,
    transfer_pct: f64,
) -> CampaignResult<CategoryReallocation> {
    let source = Totals::from_records(
        view.iter()
            .filter(|r| r.campaign_objective == config.source_objective),
    );
    let benchmark = Totals::from_records(
        view.iter()
            .filter(|r| r.campaign_objective == config.benchmark_objective),
    );
    let global = Totals::from_records(view.iter());

    let (benchmark_roas, benchmark_source) = if benchmark.spend > 0.0 {
        (benchmark.roas_blended(), BenchmarkSource::Observed)
    } else {
        warn!(
            objective = %config.benchmark_objective,
            fallback = config.fallback_benchmark_roas,
            "No benchmark spend in view, using fallback ROAS"
        );
        (config.fallback_benchmark_roas, BenchmarkSource::Fallback)
    };

    let outcome = simulate(&ReallocationRequest {
        source: config.source_objective.clone(),
        target: config.benchmark_objective.clone(),
        source_spend: source.spend,
        source_roas: source.roas_blended(),
        target_roas: benchmark_roas,
        transfer_pct,
        global_current_revenue: global.revenue,
        global_total_spend: global.spend,
    })?;
    let projected_growth_pct = blended(outcome.net_impact, global.revenue) * 100.0;

    Ok(CategoryReallocation {
        outcome,
        benchmark_roas,
        benchmark_source,
        projected_growth_pct,
    })
}
