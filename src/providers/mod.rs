pub mod yahoo_finance;

// Re-export the provider seam for consumers wiring up the pipeline
pub use crate::core::history::HistoryProvider;
