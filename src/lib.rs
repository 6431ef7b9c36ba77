pub mod cli;
pub mod core;
pub mod providers;

use anyhow::{Context, Result, ensure};
use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, info};

use crate::core::calendar::DateWindow;
use crate::core::collect::SeriesCollector;
use crate::core::config::AppConfig;
use crate::core::fetch::SeriesFetcher;
use crate::core::series::{Interval, RequestParameters};
use crate::core::table;

/// Raw dashboard parameters as they arrive from the CLI. Unset values fall
/// back to config defaults in [`resolve_request`].
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub interval: Option<Interval>,
    pub currencies: Vec<String>,
}

/// Maximum number of currency slots per request.
pub const MAX_CURRENCY_SLOTS: usize = 5;

pub async fn run_dashboard(request: DashboardRequest, config_path: Option<&str>) -> Result<()> {
    info!("FX Dashboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let params = resolve_request(&request, &config)?;
    debug!("Resolved request parameters: {params:#?}");

    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    let provider = providers::yahoo_finance::YahooHistoryProvider::new(base_url);
    let fetcher = SeriesFetcher::new(&provider, config.fields.clone());
    let collector = SeriesCollector::new(&fetcher, &config.derived);

    let pb = cli::ui::new_progress_bar(collector.planned_fetches(&params), true);
    pb.set_message("Fetching series...");
    let pb_clone = pb.clone();
    let (set, warnings) = collector.collect(&params, &|| pb_clone.inc(1)).await;
    pb.finish_and_clear();

    let (merged, matrix) = table::assemble(&set);
    cli::dashboard::render(&params.index_label, &set, &warnings, &merged, &matrix);

    Ok(())
}

/// Merges CLI values with config defaults into the immutable parameter set
/// handed to the pipeline. The window is snapped to business days here,
/// once, before any fetch.
fn resolve_request(request: &DashboardRequest, config: &AppConfig) -> Result<RequestParameters> {
    let end = request.end.unwrap_or_else(|| Utc::now().date_naive());
    let start = request.start.unwrap_or(end - Duration::days(365));
    let window = DateWindow::new(start, end)?.adjusted_to_business_days();

    let currencies = if request.currencies.is_empty() {
        config.default_currencies.clone()
    } else {
        request.currencies.clone()
    };
    ensure!(
        currencies.len() <= MAX_CURRENCY_SLOTS,
        "At most {} currency slots are supported, got {}",
        MAX_CURRENCY_SLOTS,
        currencies.len()
    );
    for currency in &currencies {
        ensure!(
            config.currencies.contains(currency) || *currency == config.derived.label,
            "Unknown currency symbol: {currency}"
        );
    }

    Ok(RequestParameters {
        window,
        interval: request.interval.unwrap_or(Interval::Daily),
        index_symbol: config.index.symbol.clone(),
        index_label: config.index.label.clone(),
        currencies,
    })
}

/// Writes a starter configuration file, refusing to clobber an existing
/// one.
pub fn write_default_config() -> Result<()> {
    let path = AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = serde_yaml::to_string(&AppConfig::default())
        .context("Failed to serialize default configuration")?;
    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    info!("Created default configuration at {}", path.display());
    Ok(())
}
