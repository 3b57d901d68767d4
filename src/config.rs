use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::{AggregateOptions, DEFAULT_HISTOGRAM_BINS, DEFAULT_TOP_CATEGORIES};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Display configuration
// ---------------------------------------------------------------------------

/// Formatting and chart settings. Every field has a default, so an empty
/// TOML document is a valid configuration.
///
/// ```toml
/// currency_prefix = "R$"
/// thousands_separator = "."
/// top_categories = 10
/// histogram_bins = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_prefix: String,
    pub thousands_separator: String,
    pub top_categories: usize,
    pub histogram_bins: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            currency_prefix: "R$".to_string(),
            thousands_separator: ".".to_string(),
            top_categories: DEFAULT_TOP_CATEGORIES,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl DisplayConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: DisplayConfig = toml::from_str(text)?;
        Ok(config.clamped())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            top_categories: self.top_categories,
            histogram_bins: self.histogram_bins,
        }
    }

    fn clamped(mut self) -> Self {
        if self.top_categories == 0 {
            warn!("top_categories must be at least 1, using 1");
            self.top_categories = 1;
        }
        if self.histogram_bins == 0 {
            warn!("histogram_bins must be at least 1, using 1");
            self.histogram_bins = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DisplayConfig::from_toml_str("").unwrap();
        assert_eq!(config, DisplayConfig::default());
        assert_eq!(config.aggregate_options(), AggregateOptions::default());
    }

    #[test]
    fn test_partial_document() {
        let config =
            DisplayConfig::from_toml_str("currency_prefix = \"$\"\ntop_categories = 5\n").unwrap();
        assert_eq!(config.currency_prefix, "$");
        assert_eq!(config.thousands_separator, ".");
        assert_eq!(config.top_categories, 5);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = DisplayConfig::from_toml_str("histogram_bins = 0").unwrap();
        assert_eq!(config.histogram_bins, 1);
    }

    #[test]
    fn test_bad_types_are_rejected() {
        let err = DisplayConfig::from_toml_str("top_categories = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
