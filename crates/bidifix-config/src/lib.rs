//! Bidifix configuration.
//!
//! Centralizes the knobs of the direction-correction engine: the marker
//! class names the styling layer keys on, the selectors that identify
//! content wrappers, math regions and code blocks, and the retry policy
//! for deferred math fix-up. Loaded from `bidifix.toml`, with `BIDIFIX_*`
//! environment variables taking precedence for temporary overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BidifixConfig {
    /// Marker classes applied to corrected elements.
    pub markers: MarkerConfig,
    /// Selectors identifying the regions the engine cares about.
    pub selectors: SelectorConfig,
    /// Retry policy for deferred math fix-up.
    pub retry: RetryConfig,
}

/// Marker classes the external style sheet selects on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Class set on elements (and their content wrappers) whose text was
    /// classified as containing RTL script.
    pub rtl_class: String,
    /// Class set on math regions whose direction was forced back to LTR.
    pub math_class: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            rtl_class: "rtl-applied".to_string(),
            math_class: "math-ltr".to_string(),
        }
    }
}

/// Region selectors. All are comma-separated lists of simple selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Nearest-ancestor content wrapper that inherits the RTL marker.
    pub wrapper: String,
    /// Math-typesetting output regions to force LTR.
    pub math: String,
    /// Code/preformatted containers that must never flip to RTL.
    pub code: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            wrapper: ".markdown, .prose, [data-message-role]".to_string(),
            math: ".katex-html, math".to_string(),
            code: "pre, code".to_string(),
        }
    }
}

/// Bounded-retry policy for math regions that render asynchronously after
/// the mutation that inserted their container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per chain started for a newly inserted element.
    pub insert_attempts: u32,
    /// Attempts per chain started for a character-data change.
    pub text_attempts: u32,
    /// Attempts for the document-wide chain started at engine startup.
    pub initial_attempts: u32,
    /// Delay between attempts, in milliseconds.
    pub delay_ms: u64,
    /// Delay for the startup chain, in milliseconds.
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            insert_attempts: 3,
            text_attempts: 2,
            initial_attempts: 4,
            delay_ms: 200,
            initial_delay_ms: 250,
        }
    }
}

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl BidifixConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `bidifix.toml` from the current directory, or fall back to
    /// defaults if it is absent or malformed.
    pub fn load_or_default() -> Self {
        Self::load_from_file("bidifix.toml").unwrap_or_default()
    }

    /// Apply `BIDIFIX_*` environment overrides on top of file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(class) = std::env::var("BIDIFIX_RTL_CLASS") {
            self.markers.rtl_class = class;
        }
        if let Ok(class) = std::env::var("BIDIFIX_MATH_CLASS") {
            self.markers.math_class = class;
        }
        if let Ok(val) = std::env::var("BIDIFIX_RETRY_ATTEMPTS")
            && let Ok(attempts) = val.parse::<u32>()
        {
            self.retry.insert_attempts = attempts;
        }
        if let Ok(val) = std::env::var("BIDIFIX_RETRY_DELAY_MS")
            && let Ok(delay) = val.parse::<u64>()
        {
            self.retry.delay_ms = delay;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = BidifixConfig::default();
        assert_eq!(config.markers.rtl_class, "rtl-applied");
        assert_eq!(config.markers.math_class, "math-ltr");
        assert!(config.selectors.wrapper.contains(".markdown"));
        assert_eq!(config.retry.insert_attempts, 3);
        assert_eq!(config.retry.delay_ms, 200);
    }

    #[test]
    fn partial_file_falls_back_per_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[markers]\nrtl_class = \"dir-rtl\"\n\n[retry]\ndelay_ms = 50"
        )
        .unwrap();

        let config = BidifixConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.markers.rtl_class, "dir-rtl");
        // Untouched fields keep their defaults.
        assert_eq!(config.markers.math_class, "math-ltr");
        assert_eq!(config.retry.delay_ms, 50);
        assert_eq!(config.retry.insert_attempts, 3);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "markers = 3").unwrap();
        assert!(matches!(
            BidifixConfig::load_from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
