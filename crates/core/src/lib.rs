pub mod config;
pub mod error;
pub mod types;

pub use config::InsightsConfig;
pub use error::{CampaignError, CampaignResult, DataGap};
pub use types::CampaignRecord;
