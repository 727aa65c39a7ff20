//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MAPCACHE_*)
//! 2. TOML config file (if MAPCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::category::CategoryMap;

mod validation;

pub use validation::ConfigError;

/// Cache name prefix between the app name and the version tag.
const CACHE_INFIX: &str = "-cache-";

/// Worker configuration with layered loading.
///
/// The version tag and stale-version list are explicit values handed to
/// the worker at construction, never implicit globals; tests instantiate
/// independent configurations freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Application name, the first half of the cache generation name.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Current application version tag, e.g. `v1.0.1`.
    #[serde(default = "default_version")]
    pub version: String,

    /// Known prior version tags whose generations are pruned at
    /// activation. Maintained by hand on each version bump, not computed.
    #[serde(default)]
    pub stale_versions: Vec<String>,

    /// Whether activation spawns the background refresh task.
    #[serde(default)]
    pub refresh_on_activate: bool,

    /// Path to the SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network fetch timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extension-to-category table for selective purge.
    #[serde(default)]
    pub categories: CategoryMap,
}

fn default_app_name() -> String {
    "kmz_viewer".into()
}

fn default_version() -> String {
    "v1.0.1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./mapcache.sqlite")
}

fn default_user_agent() -> String {
    "mapcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            version: default_version(),
            stale_versions: Vec::new(),
            refresh_on_activate: false,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            categories: CategoryMap::default(),
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The current cache generation name: `<app_name>-cache-<version>`.
    pub fn cache_name(&self) -> String {
        format!("{}{}{}", self.app_name, CACHE_INFIX, self.version)
    }

    /// Generation names for every known stale version.
    pub fn stale_cache_names(&self) -> Vec<String> {
        self.stale_versions
            .iter()
            .map(|v| format!("{}{}{}", self.app_name, CACHE_INFIX, v))
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MAPCACHE_`
    /// 2. TOML file from `MAPCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MAPCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MAPCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
