//! Core pipeline: date normalization, fetching, derivation, assembly

pub mod calendar;
pub mod collect;
pub mod config;
pub mod derived;
pub mod fetch;
pub mod history;
pub mod log;
pub mod series;
pub mod table;

// Re-export main types for cleaner imports
pub use calendar::{DateWindow, adjust_to_business_day};
pub use history::{HistoryBars, HistoryProvider, PriceField};
pub use series::{
    AbsenceReason, Interval, NamedSeriesSet, PipelineWarning, RequestParameters, SeriesOutcome,
    TimeSeries,
};
