use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::calendar::DateWindow;
use crate::core::history::{HistoryBars, HistoryProvider};
use crate::core::series::Interval;

/// Upper bound on one provider call so a hung request cannot block the
/// whole render.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

fn unix_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
        .timestamp()
}

/// Pads a column to the bar count so sparse provider payloads still line
/// up with the timestamps.
fn aligned_column<T: Clone>(column: Option<Vec<Option<T>>>, len: usize) -> Vec<Option<T>> {
    let mut column = column.unwrap_or_default();
    column.resize(len, None);
    column
}

// YahooHistoryProvider implementation for HistoryProvider
pub struct YahooHistoryProvider {
    base_url: String,
}

impl YahooHistoryProvider {
    pub fn new(base_url: &str) -> Self {
        YahooHistoryProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug, Default)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

#[async_trait]
impl HistoryProvider for YahooHistoryProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(symbol = %symbol, window = %window)
    )]
    async fn fetch_history(
        &self,
        symbol: &str,
        window: DateWindow,
        interval: Interval,
    ) -> Result<HistoryBars> {
        // The chart endpoint treats period2 as exclusive; push it one day
        // out so the user-visible window is inclusive on both ends.
        let period1 = unix_timestamp(window.start());
        let period2 = unix_timestamp(window.end() + Duration::days(1));
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}",
            self.base_url,
            symbol,
            period1,
            period2,
            interval.provider_code()
        );
        debug!("Requesting history data from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxdash/1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        // An empty result is a normal "no rows" answer, not an error; the
        // fetcher reacts by widening its window.
        let Some(item) = data
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
        else {
            return Ok(HistoryBars::default());
        };

        let timestamps = item.timestamp.unwrap_or_default();
        let dates = timestamps
            .iter()
            .map(|ts| {
                DateTime::from_timestamp(*ts, 0)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| anyhow!("Invalid timestamp {} for symbol: {}", ts, symbol))
            })
            .collect::<Result<Vec<_>>>()?;
        let len = dates.len();

        let quote = item
            .indicators
            .as_ref()
            .and_then(|inds| inds.quote.first());
        let adj_close = item
            .indicators
            .as_ref()
            .and_then(|inds| inds.adjclose.as_ref())
            .and_then(|blocks| blocks.first())
            .and_then(|block| block.adjclose.clone())
            .map(|column| aligned_column(Some(column), len));

        Ok(HistoryBars {
            dates,
            open: aligned_column(quote.and_then(|q| q.open.clone()), len),
            high: aligned_column(quote.and_then(|q| q.high.clone()), len),
            low: aligned_column(quote.and_then(|q| q.low.clone()), len),
            close: aligned_column(quote.and_then(|q| q.close.clone()), len),
            volume: aligned_column(quote.and_then(|q| q.volume.clone()), len),
            adj_close,
        })
    }
}
