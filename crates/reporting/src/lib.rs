//! Campaign analytics and reporting: record store, filtering, KPI summaries,
//! segment aggregation, funnel, anomaly detection, and budget reallocation
//! projections over an in-memory campaign dataset.

pub mod aggregation;
pub mod anomaly;
pub mod cache;
pub mod dashboard;
pub mod filter;
pub mod funnel;
pub mod highlights;
pub mod metrics;
pub mod quadrant;
pub mod reallocation;
pub mod seasonality;
pub mod store;

pub use aggregation::{group_by, rank, AggregateRow, Dimension, GroupKey, RankMetric};
pub use anomaly::AnomalyDetector;
pub use cache::ReportCache;
pub use dashboard::{ClientTransfer, DashboardOverview, DashboardReport};
pub use filter::{filter, filter_with_previous, DateRange, FilterParams, PeriodViews, View};
pub use funnel::{analyze_funnel, FunnelResult};
pub use metrics::{delta, summarize, Delta, DeltaKind, Summary};
pub use reallocation::{simulate, ReallocationOutcome, ReallocationRequest};
pub use store::RecordStore;
