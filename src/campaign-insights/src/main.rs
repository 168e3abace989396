//! Campaign Insights: KPI summary, trends, anomalies and budget what-ifs
//! for a campaign CSV export.
//!
//! Loads the dataset, applies the command-line filters and prints the
//! dashboard report as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use campaign_core::InsightsConfig;
use campaign_reporting::{ClientTransfer, DashboardReport, DateRange, FilterParams, RecordStore};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Campaign performance KPIs, trends, anomalies and budget what-ifs")]
#[command(version)]
struct Cli {
    /// CSV dataset path (overrides config)
    #[arg(long, env = "CAMPAIGN_INSIGHTS__DATA__CSV_PATH")]
    data: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Client to include; repeat for several (default: all)
    #[arg(long = "client")]
    clients: Vec<String>,

    /// Campaign objective to include; repeat for several (default: all)
    #[arg(long = "objective")]
    objectives: Vec<String>,

    /// First day of the range, YYYY-MM-DD (default: earliest in data)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the range, YYYY-MM-DD (default: latest in data)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Client to take budget from in the two-client simulation
    #[arg(long, requires = "target_client")]
    source_client: Option<String>,

    /// Client to move budget to in the two-client simulation
    #[arg(long, requires = "source_client")]
    target_client: Option<String>,

    /// Percentage of the source's spend to move (overrides config)
    #[arg(long)]
    transfer_pct: Option<f64>,

    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_insights=info,campaign_reporting=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => InsightsConfig::load(Some(path))
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => InsightsConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            InsightsConfig::default()
        }),
    };

    // Apply CLI overrides
    if let Some(data) = &cli.data {
        config.data.csv_path = data.display().to_string();
    }
    if let Some(pct) = cli.transfer_pct {
        config.reallocation.default_transfer_pct = pct;
    }
    config.validate()?;

    let store = RecordStore::from_csv_path(&config.data.csv_path, &config.seasonal)
        .with_context(|| format!("loading dataset {}", config.data.csv_path))?;
    let span = store.span().context("dataset contains no records")?;

    let params = FilterParams {
        clients: if cli.clients.is_empty() {
            store.clients().into_iter().collect()
        } else {
            cli.clients.into_iter().collect()
        },
        objectives: if cli.objectives.is_empty() {
            store.objectives().into_iter().collect()
        } else {
            cli.objectives.into_iter().collect()
        },
        range: DateRange::new(cli.start.unwrap_or(span.start), cli.end.unwrap_or(span.end))?,
    };

    info!(
        clients = params.clients.len(),
        objectives = params.objectives.len(),
        start = %params.range.start,
        end = %params.range.end,
        "Building report"
    );

    let transfer = match (cli.source_client, cli.target_client) {
        (Some(source), Some(target)) => Some(ClientTransfer {
            source,
            target,
            transfer_pct: config.reallocation.default_transfer_pct,
        }),
        _ => None,
    };

    let report = DashboardReport::build(&store, &params, &config, transfer.as_ref())?;
    if let DashboardReport::NoData { reason, .. } = &report {
        warn!(%reason, "No data available based on the current filters");
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
