//! Filter engine: client/objective/date predicates producing a current view
//! and an equal-length previous-period view.

use std::collections::BTreeSet;

use campaign_core::types::CampaignRecord;
use campaign_core::{CampaignError, CampaignResult};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::RecordStore;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CampaignResult<Self> {
        if start > end {
            return Err(CampaignError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The range of identical length ending the day before `start`.
    /// `None` only if that range falls outside the representable calendar.
    pub fn previous(&self) -> Option<Self> {
        let delta_days = (self.end - self.start).num_days();
        let prev_end = self.start.checked_sub_signed(Duration::days(1))?;
        let prev_start = prev_end.checked_sub_signed(Duration::days(delta_days))?;
        Some(Self {
            start: prev_start,
            end: prev_end,
        })
    }
}

/// The user's filter selection. Empty client or objective sets select nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterParams {
    pub clients: BTreeSet<String>,
    pub objectives: BTreeSet<String>,
    pub range: DateRange,
}

impl FilterParams {
    pub fn new(
        clients: impl IntoIterator<Item = impl Into<String>>,
        objectives: impl IntoIterator<Item = impl Into<String>>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CampaignResult<Self> {
        Ok(Self {
            clients: clients.into_iter().map(Into::into).collect(),
            objectives: objectives.into_iter().map(Into::into).collect(),
            range: DateRange::new(start, end)?,
        })
    }

    /// Every client and objective over the whole dataset. `None` for an empty store.
    pub fn all(store: &RecordStore) -> Option<Self> {
        Some(Self {
            clients: store.clients().into_iter().collect(),
            objectives: store.objectives().into_iter().collect(),
            range: store.span()?,
        })
    }

    fn matches_segment(&self, record: &CampaignRecord) -> bool {
        self.clients.contains(&record.client_name)
            && self.objectives.contains(&record.campaign_objective)
    }
}

/// A date-ordered subset of the store. Views borrow records; they never
/// modify or copy the store.
#[derive(Debug, Clone)]
pub struct View<'a> {
    records: Vec<&'a CampaignRecord>,
    range: DateRange,
}

impl<'a> View<'a> {
    pub fn records(&self) -> &[&'a CampaignRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CampaignRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// A new view holding the records of this one that satisfy `predicate`.
    pub fn subset(&self, predicate: impl Fn(&CampaignRecord) -> bool) -> View<'a> {
        View {
            records: self.records.iter().copied().filter(|r| predicate(r)).collect(),
            range: self.range,
        }
    }

    /// Records of a single campaign objective.
    pub fn objective(&self, objective: &str) -> View<'a> {
        self.subset(|r| r.campaign_objective == objective)
    }

    fn empty(range: DateRange) -> Self {
        Self {
            records: Vec::new(),
            range,
        }
    }
}

/// Current and previous-period views produced together for comparison.
#[derive(Debug, Clone)]
pub struct PeriodViews<'a> {
    pub current: View<'a>,
    pub previous: View<'a>,
    pub previous_range: Option<DateRange>,
}

impl PeriodViews<'_> {
    /// Whether period-over-period comparisons have anything to compare against.
    pub fn has_prior_period(&self) -> bool {
        !self.previous.is_empty()
    }
}

/// Records whose client and objective are selected and whose date falls in
/// `params.range`, inclusive on both ends.
pub fn filter<'a>(store: &'a RecordStore, params: &FilterParams) -> CampaignResult<View<'a>> {
    let range = DateRange::new(params.range.start, params.range.end)?;
    Ok(select(store, params, range))
}

/// The filtered view plus the preceding range of identical length under the
/// same client/objective predicate.
pub fn filter_with_previous<'a>(
    store: &'a RecordStore,
    params: &FilterParams,
) -> CampaignResult<PeriodViews<'a>> {
    let current = filter(store, params)?;
    let previous_range = params.range.previous();
    let previous = match previous_range {
        Some(range) => select(store, params, range),
        None => View::empty(params.range),
    };

    debug!(
        current = current.len(),
        previous = previous.len(),
        start = %params.range.start,
        end = %params.range.end,
        "Filters applied"
    );

    Ok(PeriodViews {
        current,
        previous,
        previous_range,
    })
}

fn select<'a>(store: &'a RecordStore, params: &FilterParams, range: DateRange) -> View<'a> {
    if params.clients.is_empty() || params.objectives.is_empty() {
        return View::empty(range);
    }
    View {
        records: store
            .records()
            .iter()
            .filter(|r| range.contains(r.date) && params.matches_segment(r))
            .collect(),
        range,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn record(
        day: NaiveDate,
        client: &str,
        objective: &str,
        spend: f64,
        revenue: f64,
    ) -> CampaignRecord {
        CampaignRecord {
            date: day,
            client_name: client.to_string(),
            industry: format!("{client} Industry"),
            campaign_objective: objective.to_string(),
            amount_spent: spend,
            purchase_value: revenue,
            impressions: 1_000,
            clicks: 20,
            add_to_cart: 4,
            purchase: 1,
            ..Default::default()
        }
    }

    /// Ten rows over three clients, two objectives and two months.
    pub(crate) fn ten_row_store() -> RecordStore {
        RecordStore::new(vec![
            record(date(2023, 2, 20), "A", "Sales", 10.0, 30.0),
            record(date(2023, 2, 25), "B", "Traffic", 20.0, 0.0),
            record(date(2023, 3, 1), "A", "Sales", 100.0, 250.0),
            record(date(2023, 3, 2), "A", "Traffic", 50.0, 0.0),
            record(date(2023, 3, 3), "B", "Sales", 80.0, 120.0),
            record(date(2023, 3, 5), "C", "Sales", 40.0, 200.0),
            record(date(2023, 3, 7), "B", "Traffic", 60.0, 0.0),
            record(date(2023, 3, 10), "A", "Sales", 70.0, 210.0),
            record(date(2023, 3, 11), "A", "Sales", 500.0, 900.0),
            record(date(2023, 4, 2), "C", "Traffic", 30.0, 0.0),
        ])
    }

    #[test]
    fn test_previous_range_matches_length() {
        let range = DateRange::new(date(2023, 3, 1), date(2023, 3, 10)).unwrap();
        let prev = range.previous().unwrap();
        assert_eq!(prev.start, date(2023, 2, 19));
        assert_eq!(prev.end, date(2023, 2, 28));
        assert_eq!(prev.days(), range.days());
        assert_eq!(range.days(), 10);
    }

    #[test]
    fn test_single_day_previous_range() {
        let range = DateRange::new(date(2023, 3, 1), date(2023, 3, 1)).unwrap();
        let prev = range.previous().unwrap();
        assert_eq!(prev.start, date(2023, 2, 28));
        assert_eq!(prev.end, date(2023, 2, 28));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            DateRange::new(date(2023, 3, 2), date(2023, 3, 1)),
            Err(CampaignError::Validation(_))
        ));
    }

    #[test]
    fn test_filter_predicate_inclusive() {
        let store = ten_row_store();
        let params =
            FilterParams::new(["A", "B"], ["Sales"], date(2023, 3, 1), date(2023, 3, 10)).unwrap();
        let view = filter(&store, &params).unwrap();

        let dates: Vec<_> = view.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2023, 3, 1), date(2023, 3, 3), date(2023, 3, 10)]);
        assert!(view
            .iter()
            .all(|r| r.campaign_objective == "Sales" && r.client_name != "C"));
    }

    #[test]
    fn test_empty_selection_yields_empty_view() {
        let store = ten_row_store();
        let params = FilterParams::new(
            Vec::<String>::new(),
            ["Sales"],
            date(2023, 2, 1),
            date(2023, 4, 30),
        )
        .unwrap();
        assert!(filter(&store, &params).unwrap().is_empty());
    }

    #[test]
    fn test_previous_view_uses_same_segment() {
        let store = ten_row_store();
        let params =
            FilterParams::new(["A", "B"], ["Sales", "Traffic"], date(2023, 3, 1), date(2023, 3, 10))
                .unwrap();
        let periods = filter_with_previous(&store, &params).unwrap();
        assert_eq!(periods.current.len(), 5);
        assert_eq!(periods.previous.len(), 2);
        assert!(periods.has_prior_period());
    }

    #[test]
    fn test_previous_before_dataset_is_empty() {
        let store = ten_row_store();
        let params = FilterParams::all(&store).unwrap();
        let periods = filter_with_previous(&store, &params).unwrap();
        assert_eq!(periods.current.len(), 10);
        assert!(!periods.has_prior_period());
        assert!(periods.previous_range.unwrap().end < store.min_date().unwrap());
    }
}
