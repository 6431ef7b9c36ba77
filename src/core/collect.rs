//! Orchestration of per-symbol fetches into a named series set

use futures::future::join_all;
use tracing::debug;

use crate::core::derived::{self, DerivedRateConfig};
use crate::core::fetch::SeriesFetcher;
use crate::core::series::{NamedSeriesSet, PipelineWarning, RequestParameters, SeriesOutcome};

enum FetchPlan {
    Simple { symbol: String },
    Derived,
}

/// Drives one fetch per requested symbol (two for the derived-rate label)
/// and collects the outcomes under their display labels. Fetches run
/// concurrently, but results are assembled in plan order so the output is
/// deterministic regardless of completion order.
pub struct SeriesCollector<'a> {
    fetcher: &'a SeriesFetcher<'a>,
    derived: &'a DerivedRateConfig,
}

impl<'a> SeriesCollector<'a> {
    pub fn new(fetcher: &'a SeriesFetcher<'a>, derived: &'a DerivedRateConfig) -> Self {
        SeriesCollector { fetcher, derived }
    }

    /// Number of provider fetches the request will issue, for progress
    /// reporting.
    pub fn planned_fetches(&self, params: &RequestParameters) -> u64 {
        1 + params
            .currencies
            .iter()
            .map(|c| if *c == self.derived.label { 2u64 } else { 1 })
            .sum::<u64>()
    }

    /// Collects the index series and every currency slot. A failed or
    /// absent entry is retained in the set under its label, and yields
    /// exactly one warning. `update_callback` is invoked once per
    /// completed provider fetch.
    pub async fn collect(
        &self,
        params: &RequestParameters,
        update_callback: &(dyn Fn()),
    ) -> (NamedSeriesSet, Vec<PipelineWarning>) {
        let mut plan = vec![(
            params.index_label.clone(),
            FetchPlan::Simple {
                symbol: params.index_symbol.clone(),
            },
        )];
        for currency in &params.currencies {
            let kind = if *currency == self.derived.label {
                FetchPlan::Derived
            } else {
                FetchPlan::Simple {
                    symbol: currency.clone(),
                }
            };
            plan.push((currency.clone(), kind));
        }

        let fetch_futures = plan.into_iter().map(|(label, kind)| async move {
            let outcome = match kind {
                FetchPlan::Simple { symbol } => {
                    let outcome = self
                        .fetcher
                        .fetch(&symbol, params.window, params.interval)
                        .await;
                    update_callback();
                    outcome
                }
                FetchPlan::Derived => {
                    let adr = self
                        .fetcher
                        .fetch(&self.derived.adr_symbol, params.window, params.interval)
                        .await;
                    update_callback();
                    let local = self
                        .fetcher
                        .fetch(&self.derived.local_symbol, params.window, params.interval)
                        .await;
                    update_callback();
                    derived::derive(self.derived, &adr, &local)
                }
            };
            (label, outcome)
        });

        let mut set = NamedSeriesSet::new();
        for (label, outcome) in join_all(fetch_futures).await {
            set.insert(&label, outcome);
        }

        let warnings: Vec<_> = set
            .iter()
            .filter_map(|(label, outcome)| match outcome {
                SeriesOutcome::Absent(reason) => Some(PipelineWarning {
                    label: label.to_string(),
                    reason: reason.clone(),
                }),
                SeriesOutcome::Series(_) => None,
            })
            .collect();

        debug!(
            "Collected {} series ({} absent) for window {}",
            set.len(),
            warnings.len(),
            params.window
        );
        (set, warnings)
    }
}
