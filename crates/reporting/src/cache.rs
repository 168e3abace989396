//! Optional memoization of built reports, owned by the presentation layer.

use std::sync::Arc;

use campaign_core::{CampaignResult, InsightsConfig};
use dashmap::DashMap;
use tracing::debug;

use crate::dashboard::{ClientTransfer, DashboardReport};
use crate::filter::FilterParams;
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    params: FilterParams,
    transfer: Option<(String, String, u64)>,
}

impl CacheKey {
    fn new(params: &FilterParams, transfer: Option<&ClientTransfer>) -> Self {
        Self {
            params: params.clone(),
            transfer: transfer
                .map(|t| (t.source.clone(), t.target.clone(), t.transfer_pct.to_bits())),
        }
    }
}

/// Reports keyed by the filter-parameter tuple for one store and config.
/// Safe to share across threads; the store and config must not change for
/// the cache's lifetime.
///
/// Entries are never evicted. Every distinct selection adds one report, so
/// the owner must call [`clear`](Self::clear) when the selection space is
/// unbounded (e.g. at the end of a session).
pub struct ReportCache {
    config: InsightsConfig,
    reports: DashMap<CacheKey, Arc<DashboardReport>>,
}

impl ReportCache {
    pub fn new(config: InsightsConfig) -> Self {
        Self {
            config,
            reports: DashMap::new(),
        }
    }

    pub fn get_or_build(
        &self,
        store: &RecordStore,
        params: &FilterParams,
        transfer: Option<&ClientTransfer>,
    ) -> CampaignResult<Arc<DashboardReport>> {
        let key = CacheKey::new(params, transfer);
        if let Some(hit) = self.reports.get(&key) {
            debug!("Report cache hit");
            return Ok(Arc::clone(hit.value()));
        }
        let report = Arc::new(DashboardReport::build(store, params, &self.config, transfer)?);
        self.reports.insert(key, report.clone());
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn clear(&self) {
        self.reports.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{date, ten_row_store};

    #[test]
    fn test_cache_hit_returns_same_report() {
        let store = ten_row_store();
        let cache = ReportCache::new(InsightsConfig::default());
        let params = FilterParams::all(&store).unwrap();

        let first = cache.get_or_build(&store, &params, None).unwrap();
        let second = cache.get_or_build(&store, &params, None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_filters_distinct_entries() {
        let store = ten_row_store();
        let cache = ReportCache::new(InsightsConfig::default());
        let all = FilterParams::all(&store).unwrap();
        let march =
            FilterParams::new(["A"], ["Sales"], date(2023, 3, 1), date(2023, 3, 31)).unwrap();

        let a = cache.get_or_build(&store, &all, None).unwrap();
        let b = cache.get_or_build(&store, &march, None).unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
