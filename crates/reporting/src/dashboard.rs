//! Campaign performance dashboard: assembles every engine output for one
//! filter selection into a single serializable report.

use campaign_core::{CampaignResult, DataGap, InsightsConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregation::{group_by, rank, AggregateRow, Dimension, RankMetric};
use crate::anomaly::{daily_revenue, AnomalyDetector};
use crate::filter::{filter_with_previous, DateRange, FilterParams};
use crate::funnel::{analyze_funnel, FunnelResult};
use crate::highlights::{highlights, Highlights};
use crate::metrics::{compare, objective_roas, summarize, KpiDeltas, Summary};
use crate::quadrant::{quadrant_matrix, QuadrantMatrix};
use crate::reallocation::{
    simulate_category, simulate_clients, CategoryReallocation, ReallocationOutcome,
};
use crate::seasonality::{seasonal_impact, SeasonalImpact};
use crate::store::RecordStore;

/// Two-client what-if selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTransfer {
    pub source: String,
    pub target: String,
    pub transfer_pct: f64,
}

impl ClientTransfer {
    /// From the lowest-ROAS client to the highest-ROAS other client.
    /// `None` when fewer than two clients are in view.
    pub fn suggested(client_rows: &[AggregateRow], transfer_pct: f64) -> Option<Self> {
        let by_roas = rank(client_rows, RankMetric::Roas);
        let source = by_roas.last()?.key.name()?.to_string();
        let target = by_roas
            .iter()
            .filter_map(|r| r.key.name())
            .find(|name| *name != source)?
            .to_string();
        Some(Self {
            source,
            target,
            transfer_pct,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub filters: FilterParams,
    pub previous_period: Option<DateRange>,
    pub summary: Summary,
    pub previous_summary: Option<Summary>,
    /// `Some(NoPriorPeriod)` when deltas could not be computed.
    pub comparison_gap: Option<DataGap>,
    pub deltas: KpiDeltas,
    pub highlights: Highlights,
    pub daily_trend: Vec<AggregateRow>,
    pub monthly_trend: Vec<AggregateRow>,
    pub anomalies: Vec<NaiveDate>,
    pub anomaly_gap: Option<DataGap>,
    pub clients_by_revenue: Vec<AggregateRow>,
    pub clients_by_industry: Vec<AggregateRow>,
    pub industries_by_revenue: Vec<AggregateRow>,
    pub industries_by_roas: Vec<AggregateRow>,
    pub objectives: Vec<AggregateRow>,
    /// Blended ROAS of the benchmark objective only.
    pub benchmark_objective_roas: f64,
    pub funnel: FunnelResult,
    pub seasonality: SeasonalImpact,
    pub quadrants: QuadrantMatrix,
    pub category_reallocation: CategoryReallocation,
    pub client_reallocation: Option<ReallocationOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardReport {
    NoData { reason: DataGap, filters: FilterParams },
    Ready(Box<DashboardOverview>),
}

impl DashboardReport {
    /// Builds the report for `params`. An empty current view yields
    /// [`DashboardReport::NoData`]; invalid arguments are errors.
    pub fn build(
        store: &RecordStore,
        params: &FilterParams,
        config: &InsightsConfig,
        transfer: Option<&ClientTransfer>,
    ) -> CampaignResult<Self> {
        let periods = filter_with_previous(store, params)?;
        let view = &periods.current;

        let summary = match summarize(view) {
            Ok(summary) => summary,
            Err(reason) => {
                info!(%reason, "No data for current filters");
                return Ok(Self::NoData {
                    reason,
                    filters: params.clone(),
                });
            }
        };
        let previous_summary = summarize(&periods.previous).ok();
        let deltas = compare(&summary, previous_summary.as_ref());
        let comparison_gap = previous_summary.is_none().then_some(DataGap::NoPriorPeriod);

        let detector = AnomalyDetector::from_config(&config.anomaly)?;
        let (anomalies, anomaly_gap) = match detector.detect_checked(&daily_revenue(view)) {
            Ok(dates) => (dates.into_iter().collect(), None),
            Err(gap) => (Vec::new(), Some(gap)),
        };

        let client_rows = group_by(view, Dimension::Client);
        let industry_rows = group_by(view, Dimension::Industry);

        let suggested = match transfer {
            Some(_) => None,
            None => {
                ClientTransfer::suggested(&client_rows, config.reallocation.default_transfer_pct)
            }
        };
        let transfer = transfer.or(suggested.as_ref());
        let client_reallocation = transfer
            .map(|t| simulate_clients(view, &t.source, &t.target, t.transfer_pct))
            .transpose()?;

        let overview = DashboardOverview {
            filters: params.clone(),
            previous_period: periods.previous_range,
            previous_summary,
            comparison_gap,
            deltas,
            highlights: highlights(&periods)?,
            daily_trend: group_by(view, Dimension::Day),
            monthly_trend: group_by(view, Dimension::Month),
            anomalies,
            anomaly_gap,
            clients_by_revenue: rank(&client_rows, RankMetric::Revenue),
            clients_by_industry: rank(
                &group_by(view, Dimension::ClientIndustry),
                RankMetric::Revenue,
            ),
            industries_by_revenue: rank(&industry_rows, RankMetric::Revenue),
            industries_by_roas: rank(&industry_rows, RankMetric::Roas),
            objectives: group_by(view, Dimension::Objective),
            benchmark_objective_roas: objective_roas(
                view,
                &config.reallocation.benchmark_objective,
            ),
            funnel: analyze_funnel(view)?,
            seasonality: seasonal_impact(view)?,
            quadrants: quadrant_matrix(view)?,
            category_reallocation: simulate_category(
                view,
                &config.reallocation,
                config.reallocation.default_transfer_pct,
            )?,
            client_reallocation,
            summary,
        };

        info!(
            records = overview.summary.record_count,
            anomalies = overview.anomalies.len(),
            prior_period = overview.comparison_gap.is_none(),
            "Dashboard report built"
        );
        Ok(Self::Ready(Box::new(overview)))
    }

    pub fn overview(&self) -> Option<&DashboardOverview> {
        match self {
            Self::Ready(overview) => Some(overview),
            Self::NoData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{date, ten_row_store};
    use campaign_core::CampaignError;

    #[test]
    fn test_report_for_full_range() {
        let store = ten_row_store();
        let params = FilterParams::all(&store).unwrap();
        let report =
            DashboardReport::build(&store, &params, &InsightsConfig::default(), None).unwrap();
        let overview = report.overview().unwrap();

        assert_eq!(overview.summary.record_count, 10);
        assert_eq!(overview.comparison_gap, Some(DataGap::NoPriorPeriod));
        assert!(!overview.deltas.spend.is_available());
        assert_eq!(overview.monthly_trend.len(), 3);
        // Ten distinct days clears the 7-day window.
        assert_eq!(overview.anomaly_gap, None);
        assert_eq!(overview.clients_by_revenue[0].key.name(), Some("A"));

        // Suggested transfer: lowest ROAS client (B) to highest (C).
        let moved = overview.client_reallocation.as_ref().unwrap();
        assert_eq!(moved.source, "B");
        assert_eq!(moved.target, "C");
    }

    #[test]
    fn test_report_no_data() {
        let store = ten_row_store();
        let params =
            FilterParams::new(["Nobody"], ["Sales"], date(2023, 3, 1), date(2023, 3, 10)).unwrap();
        let report =
            DashboardReport::build(&store, &params, &InsightsConfig::default(), None).unwrap();
        assert!(matches!(
            report,
            DashboardReport::NoData {
                reason: DataGap::EmptyView,
                ..
            }
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "no_data");
    }

    #[test]
    fn test_report_short_history_and_explicit_transfer() {
        let store = ten_row_store();
        let params =
            FilterParams::new(["A", "B"], ["Sales", "Traffic"], date(2023, 3, 1), date(2023, 3, 10))
                .unwrap();
        let transfer = ClientTransfer {
            source: "A".into(),
            target: "B".into(),
            transfer_pct: 10.0,
        };
        let report =
            DashboardReport::build(&store, &params, &InsightsConfig::default(), Some(&transfer))
                .unwrap();
        let overview = report.overview().unwrap();

        assert_eq!(overview.anomaly_gap, Some(DataGap::InsufficientHistory));
        assert!(overview.anomalies.is_empty());
        assert_eq!(overview.comparison_gap, None);
        assert!(overview.deltas.spend.is_available());
        assert_eq!(overview.client_reallocation.as_ref().unwrap().source, "A");
    }

    #[test]
    fn test_report_rejects_unknown_transfer_client() {
        let store = ten_row_store();
        let params = FilterParams::all(&store).unwrap();
        let transfer = ClientTransfer {
            source: "A".into(),
            target: "Missing".into(),
            transfer_pct: 10.0,
        };
        let err =
            DashboardReport::build(&store, &params, &InsightsConfig::default(), Some(&transfer))
                .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));
    }
}
