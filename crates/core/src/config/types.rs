use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::query::CompileOptions;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Query compiler options derived from the display settings.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            usd_to_currency_rate: self.display.usd_to_currency_rate,
        }
    }
}

/// Card database location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("AllPrintings.sqlite")
}

/// Output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Currency label shown next to prices.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Multiplier from stored USD prices to `currency`.
    #[serde(default = "default_rate")]
    pub usd_to_currency_rate: f64,
    /// Format used by card lookups when none is given.
    #[serde(default)]
    pub default_format: Option<String>,
    /// Formats listed in verbose card output, in display order.
    #[serde(default = "default_shown_formats")]
    pub shown_formats: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            usd_to_currency_rate: default_rate(),
            default_format: None,
            shown_formats: default_shown_formats(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_rate() -> f64 {
    1.0
}

fn default_shown_formats() -> Vec<String> {
    [
        "standard",
        "brawl",
        "pioneer",
        "historic",
        "modern",
        "pauper",
        "legacy",
        "penny",
        "vintage",
        "commander",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
