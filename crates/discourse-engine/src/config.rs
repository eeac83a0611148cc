//! # Engine Configuration
//!
//! Tuning knobs for one engine instance, loaded from TOML with optional
//! environment overrides:
//!
//! - `DISCOURSE_BACKOFF_FACTOR`: post-job delay multiplier (default: 4)
//! - `DISCOURSE_FRESHNESS_MS`: overlay freshness window (default: 60000)
//!
//! Malformed override values are ignored and the file/default value stays.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`EngineConfig::backoff_factor`].
pub const ENV_BACKOFF_FACTOR: &str = "DISCOURSE_BACKOFF_FACTOR";

/// Environment variable overriding [`EngineConfig::freshness_window_ms`].
pub const ENV_FRESHNESS_MS: &str = "DISCOURSE_FRESHNESS_MS";

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// After a job of runtime `t`, the queue idles `t * backoff_factor`.
    pub backoff_factor: u32,
    /// How long the overlay trusts a cached result.
    pub freshness_window_ms: u64,
    /// Remember positive classifications per entity.
    pub classification_memo: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backoff_factor: 4,
            freshness_window_ms: 60_000,
            classification_memo: true,
        }
    }
}

impl EngineConfig {
    /// Parse from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Apply `DISCOURSE_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(factor) = lookup(ENV_BACKOFF_FACTOR).and_then(|s| s.trim().parse().ok()) {
            self.backoff_factor = factor;
        }
        if let Some(ms) = lookup(ENV_FRESHNESS_MS).and_then(|s| s.trim().parse().ok()) {
            self.freshness_window_ms = ms;
        }
        self
    }

    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.freshness_window_ms)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.backoff_factor, 4);
        assert_eq!(config.freshness_window(), Duration::from_secs(60));
        assert!(config.classification_memo);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("backoff_factor = 2").expect("parse");
        assert_eq!(config.backoff_factor, 2);
        assert_eq!(config.freshness_window_ms, 60_000);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = EngineConfig::from_toml_str("backoff_factor = \"lots\"");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "freshness_window_ms = 500\nclassification_memo = false").expect("write");

        let config = EngineConfig::from_file(file.path()).expect("load");
        assert_eq!(config.freshness_window(), Duration::from_millis(500));
        assert!(!config.classification_memo);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = EngineConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn overrides_replace_valid_values_only() {
        let config = EngineConfig::default().with_overrides(|key| match key {
            ENV_BACKOFF_FACTOR => Some("8".to_string()),
            ENV_FRESHNESS_MS => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.backoff_factor, 8);
        assert_eq!(config.freshness_window_ms, 60_000);
    }
}
