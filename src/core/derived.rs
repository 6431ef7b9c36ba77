//! Synthetic exchange-rate derivation from two underlying legs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::series::{AbsenceReason, SeriesOutcome, TimeSeries};

/// Which leg goes in the numerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatioOrientation {
    #[default]
    AdrOverLocal,
    LocalOverAdr,
}

/// Configuration for the derived "financial rate" series: the two leg
/// symbols, the ratio orientation, and a constant scale factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedRateConfig {
    pub label: String,
    pub adr_symbol: String,
    pub local_symbol: String,
    #[serde(default)]
    pub orientation: RatioOrientation,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for DerivedRateConfig {
    fn default() -> Self {
        DerivedRateConfig {
            label: "Dolar Financiero (GGAL)".to_string(),
            adr_symbol: "GGAL".to_string(),
            local_symbol: "GGAL.BA".to_string(),
            orientation: RatioOrientation::default(),
            scale: default_scale(),
        }
    }
}

/// Combines the two legs into the derived series: for every date present in
/// both, the configured ratio times the scale factor. Dates present in only
/// one leg are dropped. A zero denominator yields a non-finite value at
/// that date only.
///
/// Either leg absent or empty makes the whole derivation unavailable; no
/// division is attempted in that case.
pub fn derive(config: &DerivedRateConfig, adr: &SeriesOutcome, local: &SeriesOutcome) -> SeriesOutcome {
    let (Some(adr), Some(local)) = (
        adr.series().filter(|s| !s.is_empty()),
        local.series().filter(|s| !s.is_empty()),
    ) else {
        return SeriesOutcome::Absent(AbsenceReason::DerivationUnavailable);
    };

    let points: Vec<_> = adr
        .iter()
        .filter_map(|(date, adr_value)| {
            local.value_at(*date).map(|local_value| {
                let ratio = match config.orientation {
                    RatioOrientation::AdrOverLocal => adr_value / local_value,
                    RatioOrientation::LocalOverAdr => local_value / adr_value,
                };
                (*date, config.scale * ratio)
            })
        })
        .collect();

    debug!(
        "Derived {} from {} common dates ({} adr, {} local)",
        config.label,
        points.len(),
        adr.len(),
        local.len()
    );
    SeriesOutcome::Series(TimeSeries::from_points(points))
}
