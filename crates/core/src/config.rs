use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

use crate::error::{CampaignError, CampaignResult};

/// Root configuration. Loaded from environment variables with the prefix
/// `CAMPAIGN_INSIGHTS__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub seasonal: SeasonalConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub reallocation: ReallocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

// ─── Seasonal Calendar ──────────────────────────────────────────────────────

/// Fixed seasonal calendar. The Ramadhan window is configured, not computed.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonalConfig {
    #[serde(default = "default_ramadhan_start")]
    pub ramadhan_start: NaiveDate,
    #[serde(default = "default_ramadhan_end")]
    pub ramadhan_end: NaiveDate,
}

impl SeasonalConfig {
    /// Inclusive on both ends.
    pub fn is_ramadhan(&self, date: NaiveDate) -> bool {
        self.ramadhan_start <= date && date <= self.ramadhan_end
    }
}

// ─── Anomaly Detection ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "default_anomaly_window")]
    pub window: usize,
    #[serde(default = "default_anomaly_k")]
    pub k: f64,
}

// ─── Budget Reallocation ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ReallocationConfig {
    /// Objective whose spend is moved in the category simulation.
    #[serde(default = "default_source_objective")]
    pub source_objective: String,
    /// Objective whose observed ROAS serves as the benchmark.
    #[serde(default = "default_benchmark_objective")]
    pub benchmark_objective: String,
    /// Benchmark ROAS used when the filter contains no benchmark-objective spend.
    #[serde(default = "default_fallback_benchmark_roas")]
    pub fallback_benchmark_roas: f64,
    #[serde(default = "default_transfer_pct")]
    pub default_transfer_pct: f64,
}

fn default_csv_path() -> String {
    "marketing_data.csv".to_string()
}
fn default_ramadhan_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 3, 22).unwrap_or_default()
}
fn default_ramadhan_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 4, 21).unwrap_or_default()
}
fn default_anomaly_window() -> usize {
    7
}
fn default_anomaly_k() -> f64 {
    2.0
}
fn default_source_objective() -> String {
    "Traffic".to_string()
}
fn default_benchmark_objective() -> String {
    "Sales".to_string()
}
fn default_fallback_benchmark_roas() -> f64 {
    1.62
}
fn default_transfer_pct() -> f64 {
    20.0
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            ramadhan_start: default_ramadhan_start(),
            ramadhan_end: default_ramadhan_end(),
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: default_anomaly_window(),
            k: default_anomaly_k(),
        }
    }
}

impl Default for ReallocationConfig {
    fn default() -> Self {
        Self {
            source_objective: default_source_objective(),
            benchmark_objective: default_benchmark_objective(),
            fallback_benchmark_roas: default_fallback_benchmark_roas(),
            default_transfer_pct: default_transfer_pct(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            seasonal: SeasonalConfig::default(),
            anomaly: AnomalyConfig::default(),
            reallocation: ReallocationConfig::default(),
        }
    }
}

impl InsightsConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(file: Option<&Path>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            csv_path = %config.data.csv_path,
            window = config.anomaly.window,
            fallback_roas = config.reallocation.fallback_benchmark_roas,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> CampaignResult<()> {
        if self.anomaly.window < 2 {
            return Err(CampaignError::Config(format!(
                "anomaly.window must be at least 2, got {}",
                self.anomaly.window
            )));
        }
        if self.anomaly.k.is_nan() || self.anomaly.k <= 0.0 {
            return Err(CampaignError::Config(format!(
                "anomaly.k must be positive, got {}",
                self.anomaly.k
            )));
        }
        if self.seasonal.ramadhan_start > self.seasonal.ramadhan_end {
            return Err(CampaignError::Config(
                "seasonal.ramadhan_start is after seasonal.ramadhan_end".to_string(),
            ));
        }
        let realloc = &self.reallocation;
        if realloc.source_objective.trim().is_empty()
            || realloc.benchmark_objective.trim().is_empty()
        {
            return Err(CampaignError::Config(
                "reallocation.source_objective and benchmark_objective must be set".to_string(),
            ));
        }
        if realloc.source_objective == realloc.benchmark_objective {
            return Err(CampaignError::Config(format!(
                "reallocation.source_objective and benchmark_objective are both '{}'",
                realloc.source_objective
            )));
        }
        if realloc.fallback_benchmark_roas.is_nan() || realloc.fallback_benchmark_roas < 0.0 {
            return Err(CampaignError::Config(
                "reallocation.fallback_benchmark_roas must not be negative".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&realloc.default_transfer_pct) {
            return Err(CampaignError::Config(
                "reallocation.default_transfer_pct must be within [0, 100]".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = InsightsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.anomaly.window, 7);
        assert!((config.reallocation.fallback_benchmark_roas - 1.62).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ramadhan_window_inclusive() {
        let seasonal = SeasonalConfig::default();
        assert!(!seasonal.is_ramadhan(NaiveDate::from_ymd_opt(2023, 3, 21).unwrap()));
        assert!(seasonal.is_ramadhan(NaiveDate::from_ymd_opt(2023, 3, 22).unwrap()));
        assert!(seasonal.is_ramadhan(NaiveDate::from_ymd_opt(2023, 4, 21).unwrap()));
        assert!(!seasonal.is_ramadhan(NaiveDate::from_ymd_opt(2023, 4, 22).unwrap()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = InsightsConfig::default();
        config.anomaly.window = 1;
        assert!(matches!(config.validate(), Err(CampaignError::Config(_))));

        let mut config = InsightsConfig::default();
        config.seasonal.ramadhan_start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert!(config.validate().is_err());

        let mut config = InsightsConfig::default();
        config.reallocation.default_transfer_pct = 120.0;
        assert!(config.validate().is_err());

        let mut config = InsightsConfig::default();
        config.reallocation.source_objective = "Sales".to_string();
        assert!(matches!(
            config.validate(),
            Err(CampaignError::Config(m)) if m.contains("both 'Sales'")
        ));

        let mut config = InsightsConfig::default();
        config.reallocation.benchmark_objective = "  ".to_string();
        assert!(matches!(config.validate(), Err(CampaignError::Config(_))));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[reallocation]\nfallback_benchmark_roas = 2.5\n\n[seasonal]\nramadhan_start = \"2024-03-11\"\nramadhan_end = \"2024-04-09\""
        )
        .unwrap();

        let config = InsightsConfig::load(Some(file.path())).unwrap();
        assert!((config.reallocation.fallback_benchmark_roas - 2.5).abs() < f64::EPSILON);
        assert_eq!(
            config.seasonal.ramadhan_start,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
        assert_eq!(config.anomaly.window, 7);
    }
}
