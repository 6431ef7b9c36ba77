//! Series fetching with date-window relaxation

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::calendar::DateWindow;
use crate::core::history::{HistoryBars, HistoryProvider, PriceField};
use crate::core::series::{AbsenceReason, Interval, SeriesOutcome, TimeSeries};

/// Total attempt budget per symbol, including the first try.
pub const MAX_FETCH_ATTEMPTS: usize = 3;
/// Days added to each side of the window after an empty attempt.
pub const WINDOW_RELAX_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FetchKey {
    symbol: String,
    window: DateWindow,
    interval: Interval,
}

/// Fetches one symbol's series through a [`HistoryProvider`], widening the
/// date window on empty results up to the attempt budget. Outcomes are
/// memoized per `(symbol, window, interval)` for the life of the fetcher.
///
/// All failure modes are folded into [`SeriesOutcome::Absent`]; a fetch
/// never aborts the batch it belongs to.
pub struct SeriesFetcher<'a> {
    provider: &'a (dyn HistoryProvider + Send + Sync),
    fields: Vec<PriceField>,
    memo: Mutex<HashMap<FetchKey, SeriesOutcome>>,
}

impl<'a> SeriesFetcher<'a> {
    pub fn new(provider: &'a (dyn HistoryProvider + Send + Sync), fields: Vec<PriceField>) -> Self {
        SeriesFetcher {
            provider,
            fields,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub async fn fetch(
        &self,
        symbol: &str,
        window: DateWindow,
        interval: Interval,
    ) -> SeriesOutcome {
        let key = FetchKey {
            symbol: symbol.to_string(),
            window,
            interval,
        };
        {
            let memo = self.memo.lock().await;
            if let Some(cached) = memo.get(&key) {
                debug!("Memo HIT for {symbol} over {window}");
                return cached.clone();
            }
        }

        let outcome = self.fetch_with_fallback(symbol, window, interval).await;
        self.memo.lock().await.insert(key, outcome.clone());
        outcome
    }

    async fn fetch_with_fallback(
        &self,
        symbol: &str,
        window: DateWindow,
        interval: Interval,
    ) -> SeriesOutcome {
        let mut current = window;
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            let bars = match self.provider.fetch_history(symbol, current, interval).await {
                Ok(bars) => bars,
                Err(e) => {
                    warn!("History fetch failed for {symbol}: {e}");
                    return SeriesOutcome::Absent(AbsenceReason::Transport(e.to_string()));
                }
            };

            if !bars.is_empty() {
                debug!(
                    "Got {} rows for {symbol} over {current} on attempt {attempt}",
                    bars.len()
                );
                return self.extract_series(symbol, &bars);
            }

            debug!(
                "Attempt {attempt}/{MAX_FETCH_ATTEMPTS}: no rows for {symbol} over {current}, \
                 relaxing window"
            );
            current = current.widened(WINDOW_RELAX_DAYS);
        }

        SeriesOutcome::Absent(AbsenceReason::NoData)
    }

    /// Picks the first configured price field the bars actually carry.
    fn extract_series(&self, symbol: &str, bars: &HistoryBars) -> SeriesOutcome {
        for field in &self.fields {
            let Some(column) = bars.column(*field) else {
                continue;
            };
            let points: Vec<_> = bars
                .dates
                .iter()
                .zip(column)
                .filter_map(|(date, value)| value.map(|v| (*date, v)))
                .collect();
            debug!("Extracted {} {field} points for {symbol}", points.len());
            return SeriesOutcome::Series(TimeSeries::from_points(points));
        }

        warn!("No usable price field for {symbol}");
        SeriesOutcome::Absent(AbsenceReason::MissingField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex as StdMutex;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn window(start: u32, end: u32) -> DateWindow {
        DateWindow::new(date(start), date(end)).unwrap()
    }

    fn bars_with_close(values: Vec<(NaiveDate, f64)>) -> HistoryBars {
        let n = values.len();
        HistoryBars {
            dates: values.iter().map(|(d, _)| *d).collect(),
            close: values.iter().map(|(_, v)| Some(*v)).collect(),
            open: vec![None; n],
            high: vec![None; n],
            low: vec![None; n],
            volume: vec![None; n],
            adj_close: None,
        }
    }

    /// Returns a scripted sequence of responses and records the window of
    /// every call it receives.
    struct MockHistoryProvider {
        responses: StdMutex<Vec<Result<HistoryBars>>>,
        calls: StdMutex<Vec<DateWindow>>,
    }

    impl MockHistoryProvider {
        fn new(responses: Vec<Result<HistoryBars>>) -> Self {
            MockHistoryProvider {
                responses: StdMutex::new(responses),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<DateWindow> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HistoryProvider for MockHistoryProvider {
        async fn fetch_history(
            &self,
            _symbol: &str,
            window: DateWindow,
            _interval: Interval,
        ) -> Result<HistoryBars> {
            self.calls.lock().unwrap().push(window);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(HistoryBars::default());
            }
            responses.remove(0)
        }
    }

    fn fetcher(provider: &MockHistoryProvider) -> SeriesFetcher<'_> {
        SeriesFetcher::new(provider, vec![PriceField::AdjClose, PriceField::Close])
    }

    #[tokio::test]
    async fn test_first_attempt_success_stops_retrying() {
        let provider =
            MockHistoryProvider::new(vec![Ok(bars_with_close(vec![(date(10), 1.5)]))]);
        let outcome = fetcher(&provider)
            .fetch("EURUSD=X", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(provider.calls().len(), 1);
        assert_eq!(
            outcome.series().unwrap().value_at(date(10)),
            Some(1.5)
        );
    }

    #[tokio::test]
    async fn test_empty_attempts_widen_window_by_two_days() {
        let provider = MockHistoryProvider::new(vec![
            Ok(HistoryBars::default()),
            Ok(HistoryBars::default()),
            Ok(bars_with_close(vec![(date(11), 2.0)])),
        ]);
        let outcome = fetcher(&provider)
            .fetch("USDBRL=X", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(
            provider.calls(),
            vec![window(10, 12), window(8, 14), window(6, 16)]
        );
        assert!(outcome.series().is_some());
    }

    #[tokio::test]
    async fn test_all_attempts_empty_is_no_data() {
        let provider = MockHistoryProvider::new(vec![
            Ok(HistoryBars::default()),
            Ok(HistoryBars::default()),
            Ok(HistoryBars::default()),
        ]);
        let outcome = fetcher(&provider)
            .fetch("USDARS=X", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(provider.calls().len(), MAX_FETCH_ATTEMPTS);
        assert_eq!(outcome, SeriesOutcome::Absent(AbsenceReason::NoData));
    }

    #[tokio::test]
    async fn test_transport_error_stops_the_loop() {
        let provider = MockHistoryProvider::new(vec![Err(anyhow!("connection refused"))]);
        let outcome = fetcher(&provider)
            .fetch("USDCNY=X", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(provider.calls().len(), 1);
        assert_eq!(
            outcome,
            SeriesOutcome::Absent(AbsenceReason::Transport(
                "connection refused".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_missing_price_field() {
        let mut bars = bars_with_close(vec![(date(10), 1.0)]);
        bars.close = vec![None];
        let provider = MockHistoryProvider::new(vec![Ok(bars)]);
        // Only accept adjusted close, which the bars do not carry
        let fetcher = SeriesFetcher::new(&provider, vec![PriceField::AdjClose]);
        let outcome = fetcher
            .fetch("USDJPY=X", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(outcome, SeriesOutcome::Absent(AbsenceReason::MissingField));
    }

    #[tokio::test]
    async fn test_adjclose_preferred_over_close() {
        let mut bars = bars_with_close(vec![(date(10), 1.0)]);
        bars.adj_close = Some(vec![Some(2.0)]);
        let provider = MockHistoryProvider::new(vec![Ok(bars)]);
        let outcome = fetcher(&provider)
            .fetch("GGAL", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(outcome.series().unwrap().value_at(date(10)), Some(2.0));
    }

    #[tokio::test]
    async fn test_memoized_fetch_skips_provider() {
        let provider =
            MockHistoryProvider::new(vec![Ok(bars_with_close(vec![(date(10), 1.5)]))]);
        let fetcher = fetcher(&provider);

        let first = fetcher
            .fetch("EURUSD=X", window(10, 12), Interval::Daily)
            .await;
        let second = fetcher
            .fetch("EURUSD=X", window(10, 12), Interval::Daily)
            .await;

        assert_eq!(provider.calls().len(), 1);
        assert_eq!(first, second);

        // A different window is a different request
        let _ = fetcher
            .fetch("EURUSD=X", window(10, 13), Interval::Daily)
            .await;
        assert_eq!(provider.calls().len(), 2);
    }
}
