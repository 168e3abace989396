use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: missing required column(s) {0}")]
    Schema(String),

    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data unavailable: {0}")]
    Data(#[from] DataGap),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for CampaignError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Recoverable "nothing to show" states. These are values handed back to
/// the caller, never failures of the overall computation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataGap {
    #[error("no records match the current filters")]
    EmptyView,

    #[error("ratio denominator is zero")]
    UndefinedRatio,

    #[error("not enough history to evaluate the rolling window")]
    InsufficientHistory,

    #[error("no data for the previous period")]
    NoPriorPeriod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: CampaignError = config::ConfigError::Message("bad window".into()).into();
        assert!(matches!(err, CampaignError::Config(ref m) if m.contains("bad window")));
    }

    #[test]
    fn test_data_gap_display() {
        assert_eq!(
            DataGap::NoPriorPeriod.to_string(),
            "no data for the previous period"
        );
        let json = serde_json::to_string(&DataGap::EmptyView).unwrap();
        assert_eq!(json, "\"empty_view\"");
    }
}
