//! History provider abstraction and raw bar data

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::calendar::DateWindow;
use crate::core::series::Interval;

/// A price column usable as the series value. The fetcher tries these in
/// the configured preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    AdjClose,
    Close,
}

impl Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PriceField::AdjClose => "adjclose",
                PriceField::Close => "close",
            }
        )
    }
}

impl FromStr for PriceField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adjclose" => Ok(PriceField::AdjClose),
            "close" => Ok(PriceField::Close),
            _ => Err(anyhow::anyhow!("Invalid price field: {}", s)),
        }
    }
}

/// Raw column-oriented bars as returned by a provider. The quote columns
/// are always present (padded with `None`); the adjusted-close block may be
/// missing entirely, which is distinct from being present but sparse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryBars {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<u64>>,
    pub adj_close: Option<Vec<Option<f64>>>,
}

impl HistoryBars {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns the column for `field`, or `None` when the provider omitted
    /// it from the response.
    pub fn column(&self, field: PriceField) -> Option<&[Option<f64>]> {
        match field {
            PriceField::AdjClose => self.adj_close.as_deref(),
            PriceField::Close => Some(&self.close),
        }
    }
}

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch_history(
        &self,
        symbol: &str,
        window: DateWindow,
        interval: Interval,
    ) -> Result<HistoryBars>;
}
