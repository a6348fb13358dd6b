//! Configuration for the access engine.
//!
//! Loaded via the `config` crate from environment variables
//! (`STOREFRONT__PROVIDER_TIMEOUT_MS`, `STOREFRONT__BASE_FLAGS__SHOPPING_LIST_ENABLED`,
//! ...) and optionally a file that the environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::flags::FeatureFlagSet;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STOREFRONT";

/// Access engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Store-configured feature flags before per-user gating.
    #[serde(default)]
    pub base_flags: FeatureFlagSet,

    /// Upper bound on one identity provider call, in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Whether anonymous visitors get a degraded guest session.
    #[serde(default = "default_guest_fallback")]
    pub guest_fallback: bool,
}

fn default_provider_timeout_ms() -> u64 {
    10_000
}

fn default_guest_fallback() -> bool {
    true
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            base_flags: FeatureFlagSet::default(),
            provider_timeout_ms: default_provider_timeout_ms(),
            guest_fallback: default_guest_fallback(),
        }
    }
}

impl AccessConfig {
    /// Returns the provider timeout as a duration.
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from `path`, with environment variables taking
    /// precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
