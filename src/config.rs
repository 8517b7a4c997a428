//! Configuration management module
//!
//! YAML-backed settings for the acceptance harness: where the storefront
//! lives, where the selector catalog and failure screenshots go, and how
//! patient the waits are. A missing config file falls back to defaults; a
//! missing catalog file does not (the catalog is loaded separately and is
//! fatal when absent).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use element_locator::ResolverConfig;
use page_probe::SessionConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "shopcheck.yaml";

/// Harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storefront entry URL
    pub base_url: String,
    /// Token the homepage title must contain
    pub expected_title: String,
    /// Currency symbol prices must start with
    pub currency_symbol: String,
    /// Run the browser without a visible window
    pub headless: bool,
    /// Durable selector catalog location
    pub catalog_path: PathBuf,
    /// Directory for failure screenshots
    pub screenshot_dir: PathBuf,
    /// Per-condition bound for settle-phase load waits, in milliseconds
    pub settle_timeout_ms: u64,
    /// Fixed post-load delay absorbing async rendering, in milliseconds
    pub quiescence_ms: u64,
    /// Bound for the post-discovery visibility wait, in milliseconds
    pub discovery_wait_ms: u64,
    /// Bound for the result-list marker wait, in milliseconds
    pub marker_timeout_ms: u64,
    /// Maximum search attempts before giving up
    pub search_attempts: u32,
    /// Pause between search attempts, in milliseconds
    pub retry_pause_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.com/".to_string(),
            expected_title: "Amazon.com".to_string(),
            currency_symbol: "$".to_string(),
            headless: true,
            catalog_path: PathBuf::from("locators/amazon-locators.json"),
            screenshot_dir: PathBuf::from("."),
            settle_timeout_ms: 10_000,
            quiescence_ms: 2_000,
            discovery_wait_ms: 5_000,
            marker_timeout_ms: 10_000,
            search_attempts: 3,
            retry_pause_ms: 1_000,
        }
    }
}

impl Config {
    /// Resolver settings derived from this configuration.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            settle_timeout: Duration::from_millis(self.settle_timeout_ms),
            quiescence: Duration::from_millis(self.quiescence_ms),
            discovery_wait: Duration::from_millis(self.discovery_wait_ms),
            screenshot_dir: self.screenshot_dir.clone(),
        }
    }

    /// Browser session settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            headless: self.headless,
            ..SessionConfig::default()
        }
    }
}

/// Load configuration from `path`, or from `shopcheck.yaml` in the working
/// directory, falling back to defaults when the file does not exist.
pub async fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path.clone(),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    };

    if path.exists() {
        let content = fs::read_to_string(&path)
            .await
            .context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            path.display()
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let config = Config::default();
        assert!(config.headless);
        assert_eq!(config.search_attempts, 3);
        assert_eq!(config.currency_symbol, "$");
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.base_url, config.base_url);
        assert_eq!(parsed.settle_timeout_ms, config.settle_timeout_ms);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("base_url: https://example.com/\n").unwrap();
        assert_eq!(parsed.base_url, "https://example.com/");
        assert_eq!(parsed.search_attempts, 3);
    }

    #[test]
    fn test_resolver_config_mapping() {
        let config = Config::default();
        let resolver = config.resolver_config();
        assert_eq!(resolver.settle_timeout, Duration::from_secs(10));
        assert_eq!(resolver.quiescence, Duration::from_secs(2));
    }
}
