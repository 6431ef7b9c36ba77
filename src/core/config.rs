use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::derived::DerivedRateConfig;
use crate::core::history::PriceField;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

/// The reference index series shown first on the dashboard.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexConfig {
    pub symbol: String,
    pub label: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            symbol: "DX-Y.NYB".to_string(),
            label: "DXY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub index: IndexConfig,
    /// The symbol universe currency slots may select from. The derived
    /// label below is always a valid selection too.
    #[serde(default = "default_currency_universe")]
    pub currencies: Vec<String>,
    /// Slots used when the CLI passes no --currency flags.
    #[serde(default = "default_selected_currencies")]
    pub default_currencies: Vec<String>,
    #[serde(default)]
    pub derived: DerivedRateConfig,
    /// Price fields tried in order when extracting a series from bars.
    #[serde(default = "default_price_fields")]
    pub fields: Vec<PriceField>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            index: IndexConfig::default(),
            currencies: default_currency_universe(),
            default_currencies: default_selected_currencies(),
            derived: DerivedRateConfig::default(),
            fields: default_price_fields(),
        }
    }
}

fn default_currency_universe() -> Vec<String> {
    [
        "USDBRL=X",
        "USDARS=X",
        "USDCNY=X",
        "EURUSD=X",
        "USDJPY=X",
        "GBPUSD=X",
        "AUDUSD=X",
        "USDZAR=X",
        "USDINR=X",
        "USDMXN=X",
        "USDRUB=X",
        "Dolar Financiero (GGAL)",
        "EUR=X",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_selected_currencies() -> Vec<String> {
    [
        "USDBRL=X",
        "Dolar Financiero (GGAL)",
        "USDCNY=X",
        "EUR=X",
        "USDJPY=X",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_price_fields() -> Vec<PriceField> {
    vec![PriceField::AdjClose, PriceField::Close]
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxdash", "fxdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
