//! Client quadrant matrix: spend vs efficiency against the client averages.

use campaign_core::DataGap;
use serde::{Deserialize, Serialize};

use crate::aggregation::{group_by, Dimension};
use crate::filter::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// High spend, high ROAS: scale up.
    Star,
    /// High spend, low ROAS: optimize.
    Alert,
    /// Low spend, high ROAS: experiment.
    Potential,
    /// Low spend, low ROAS: monitor.
    LowPriority,
}

impl Quadrant {
    /// Values on an average line count as the high side.
    pub fn classify(spend: f64, roas: f64, avg_spend: f64, avg_roas: f64) -> Self {
        match (spend >= avg_spend, roas >= avg_roas) {
            (true, true) => Quadrant::Star,
            (true, false) => Quadrant::Alert,
            (false, true) => Quadrant::Potential,
            (false, false) => Quadrant::LowPriority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPosition {
    pub client: String,
    pub spend: f64,
    pub revenue: f64,
    pub roas: f64,
    pub quadrant: Quadrant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantMatrix {
    /// Mean of client total spend.
    pub avg_spend: f64,
    /// Mean of client-level blended ROAS.
    pub avg_roas: f64,
    pub clients: Vec<ClientPosition>,
}

pub fn quadrant_matrix(view: &View<'_>) -> Result<QuadrantMatrix, DataGap> {
    let rows = group_by(view, Dimension::Client);
    if rows.is_empty() {
        return Err(DataGap::EmptyView);
    }
    let n = rows.len() as f64;
    let avg_spend = rows.iter().map(|r| r.spend).sum::<f64>() / n;
    let avg_roas = rows.iter().map(|r| r.roas).sum::<f64>() / n;

    let clients = rows
        .into_iter()
        .filter_map(|row| {
            let client = row.key.name()?.to_string();
            Some(ClientPosition {
                quadrant: Quadrant::classify(row.spend, row.roas, avg_spend, avg_roas),
                client,
                spend: row.spend,
                revenue: row.revenue,
                roas: row.roas,
            })
        })
        .collect();

    Ok(QuadrantMatrix {
        avg_spend,
        avg_roas,
        clients,
    })
}
