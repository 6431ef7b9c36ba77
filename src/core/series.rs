//! Core series types and the per-request parameter set

use chrono::NaiveDate;
use clap::ValueEnum;
use std::fmt::Display;
use std::str::FromStr;

use crate::core::calendar::DateWindow;

/// Sampling granularity of a fetched time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// Interval code in the provider's namespace.
    pub fn provider_code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Interval::Daily => "daily",
                Interval::Weekly => "weekly",
                Interval::Monthly => "monthly",
            }
        )
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "1d" => Ok(Interval::Daily),
            "weekly" | "1wk" => Ok(Interval::Weekly),
            "monthly" | "1mo" => Ok(Interval::Monthly),
            _ => Err(anyhow::anyhow!("Invalid interval: {}", s)),
        }
    }
}

/// An ordered price series with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    /// Builds a series from unordered points. Sorts by date; on duplicate
    /// dates the last point wins.
    pub fn from_points(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        points.reverse();
        points.dedup_by_key(|(date, _)| *date);
        points.reverse();
        TimeSeries { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NaiveDate, f64)> {
        self.points.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(date, _)| *date)
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|index| self.points[index].1)
    }

    pub fn first(&self) -> Option<&(NaiveDate, f64)> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&(NaiveDate, f64)> {
        self.points.last()
    }
}

/// Why a requested series has no data. An absence is a normal outcome of
/// the pipeline, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AbsenceReason {
    /// The fetch exhausted its attempt budget with no rows.
    NoData,
    /// Rows came back but no usable price field was present.
    MissingField,
    /// The provider call itself failed.
    Transport(String),
    /// One or both legs of a derived rate were unavailable.
    DerivationUnavailable,
}

/// The result of fetching or deriving one series.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    Series(TimeSeries),
    Absent(AbsenceReason),
}

impl SeriesOutcome {
    pub fn series(&self) -> Option<&TimeSeries> {
        match self {
            SeriesOutcome::Series(series) => Some(series),
            SeriesOutcome::Absent(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SeriesOutcome::Absent(_))
    }
}

/// A per-symbol warning surfaced to the user. Failures are contained at
/// symbol scope and never abort the render.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineWarning {
    pub label: String,
    pub reason: AbsenceReason,
}

impl PipelineWarning {
    /// Transport failures render as errors, the rest as warnings.
    pub fn is_error(&self) -> bool {
        matches!(self.reason, AbsenceReason::Transport(_))
    }
}

impl Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            AbsenceReason::NoData => write!(f, "No data available for {}.", self.label),
            AbsenceReason::MissingField => {
                write!(f, "No usable price field available for {}.", self.label)
            }
            AbsenceReason::Transport(e) => {
                write!(f, "Error downloading data for {}: {}", self.label, e)
            }
            AbsenceReason::DerivationUnavailable => {
                write!(f, "No data available for derived rate {}.", self.label)
            }
        }
    }
}

/// Ordered label -> outcome mapping built fresh per request. Duplicate
/// labels are last-write-wins at the position of the last occurrence.
#[derive(Debug, Default)]
pub struct NamedSeriesSet {
    entries: Vec<(String, SeriesOutcome)>,
}

impl NamedSeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: &str, outcome: SeriesOutcome) {
        self.entries.retain(|(existing, _)| existing != label);
        self.entries.push((label.to_string(), outcome));
    }

    pub fn get(&self, label: &str) -> Option<&SeriesOutcome> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesOutcome)> {
        self.entries
            .iter()
            .map(|(label, outcome)| (label.as_str(), outcome))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable parameter set for one render, built once from CLI values and
/// config defaults and passed by value into the pipeline.
#[derive(Debug, Clone)]
pub struct RequestParameters {
    pub window: DateWindow,
    pub interval: Interval,
    pub index_symbol: String,
    pub index_label: String,
    pub currencies: Vec<String>,
}
