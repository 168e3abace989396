//! Record store: the immutable, date-ordered campaign dataset everything
//! else reads from.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use campaign_core::config::SeasonalConfig;
use campaign_core::types::{is_weekend, CampaignRecord};
use campaign_core::{CampaignError, CampaignResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::info;

use crate::filter::DateRange;

/// Columns every input file must carry. `add_to_cart` is optional.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "created_date",
    "client_name",
    "campaign_objective",
    "industry",
    "amount_spent",
    "purchase_value",
    "roas",
    "cpc",
    "ctr_percentage",
    "impressions",
    "clicks",
    "purchase",
    "is_weekend",
    "is_ramadhan",
];

/// Raw fields read from a CSV row. Derived columns (`roas`, `cpc`,
/// `ctr_percentage`, `is_weekend`, `is_ramadhan`) are recomputed.
#[derive(Debug, Deserialize)]
struct CsvRow {
    created_date: String,
    client_name: String,
    industry: String,
    campaign_objective: String,
    amount_spent: f64,
    purchase_value: f64,
    impressions: u64,
    clicks: u64,
    #[serde(default)]
    add_to_cart: Option<u64>,
    purchase: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<CampaignRecord>,
}

impl RecordStore {
    /// Build a store from already-typed records. Records are stably sorted
    /// by date; their flags are taken as given.
    pub fn new(mut records: Vec<CampaignRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn from_csv_path(
        path: impl AsRef<Path>,
        seasonal: &SeasonalConfig,
    ) -> CampaignResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(file, seasonal)?;
        info!(
            path = %path.display(),
            rows = store.len(),
            min_date = ?store.min_date(),
            max_date = ?store.max_date(),
            "Campaign dataset loaded"
        );
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R, seasonal: &SeasonalConfig) -> CampaignResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let present: BTreeSet<&str> = headers.iter().collect();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !present.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(CampaignError::Schema(missing.join(", ")));
        }

        let mut records = Vec::new();
        for (idx, row) in rdr.deserialize::<CsvRow>().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let row = row.map_err(|e| CampaignError::Parse {
                row: line,
                message: e.to_string(),
            })?;
            let date = parse_date(&row.created_date).ok_or_else(|| CampaignError::Parse {
                row: line,
                message: format!("invalid created_date '{}'", row.created_date),
            })?;
            for (column, value) in [
                ("amount_spent", row.amount_spent),
                ("purchase_value", row.purchase_value),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(CampaignError::Parse {
                        row: line,
                        message: format!(
                            "{column} must be a finite, non-negative amount, got {value}"
                        ),
                    });
                }
            }

            records.push(CampaignRecord {
                date,
                client_name: row.client_name,
                industry: row.industry,
                campaign_objective: row.campaign_objective,
                amount_spent: row.amount_spent,
                purchase_value: row.purchase_value,
                impressions: row.impressions,
                clicks: row.clicks,
                add_to_cart: row.add_to_cart.unwrap_or(0),
                purchase: row.purchase,
                is_weekend: is_weekend(date),
                is_ramadhan: seasonal.is_ramadhan(date),
            });
        }

        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[CampaignRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Full date span of the dataset.
    pub fn span(&self) -> Option<DateRange> {
        Some(DateRange {
            start: self.min_date()?,
            end: self.max_date()?,
        })
    }

    /// Distinct client names in first-seen order.
    pub fn clients(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.client_name.as_str()))
    }

    /// Distinct campaign objectives in first-seen order.
    pub fn objectives(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.campaign_objective.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
