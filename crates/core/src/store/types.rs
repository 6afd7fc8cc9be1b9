//! Types for the card store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordering of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Cmc,
    Price,
    SetCode,
}

impl SortKey {
    /// Result column the key sorts on.
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "v_name",
            Self::Cmc => "convertedManaCost",
            Self::Price => "price",
            Self::SetCode => "setCode",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Cmc => "cmc",
            Self::Price => "price",
            Self::SetCode => "setcode",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "cmc" => Ok(Self::Cmc),
            "price" => Ok(Self::Price),
            "setcode" => Ok(Self::SetCode),
            other => Err(StoreError::Internal(format!("invalid sort key '{other}'"))),
        }
    }
}

/// Options for a listing search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub reverse: bool,
    /// Maximum number of cards; all when `None`.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Parameters of a single card lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardLookup {
    /// Display name, matched case-insensitively.
    pub name: String,
    pub set_code: Option<String>,
    /// Only printings legal in this format.
    pub format: Option<String>,
    /// Skip loading sibling faces.
    #[serde(default)]
    pub single_side: bool,
    /// Also load formats and price.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub rulings: bool,
}

impl CardLookup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// "card not found in 'm15': 'x'"
    pub(crate) fn not_found(&self) -> StoreError {
        self.missing("card")
    }

    /// "token card not found in 'tm15': 'x'"
    pub(crate) fn token_not_found(&self) -> StoreError {
        self.missing("token card")
    }

    fn missing(&self, what: &str) -> StoreError {
        let mut location = String::new();
        if let Some(set_code) = &self.set_code {
            location.push_str(&format!(" in '{set_code}'"));
        }
        if let Some(format) = &self.format {
            location.push_str(&format!(" in '{format}'"));
        }
        StoreError::NotFound(format!("{what} not found{location}: '{}'", self.name))
    }
}

/// Errors for card store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Card database not found: {0}")]
    Missing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
