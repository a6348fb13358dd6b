//! Probe configuration.
//!
//! Loaded via the `config` crate from environment variables sharing the
//! access engine's prefix, e.g. `STOREFRONT__IDENTITY_BASE_URL` and
//! `STOREFRONT__ACCESS__PROVIDER_TIMEOUT_MS`.

use b2b_storefront_access::AccessConfig;
use b2b_storefront_access::config::ENV_PREFIX;
use serde::Deserialize;

/// Probe configuration composed from the access engine config.
#[derive(Debug, Deserialize)]
pub struct ProbeConfig {
    /// Base URL of the storefront API serving `/customers/me`.
    pub identity_base_url: String,

    /// Environment variable holding the visitor's access token.
    #[serde(default = "default_access_token_var")]
    pub access_token_var: String,

    /// Access engine configuration.
    #[serde(default)]
    pub access: AccessConfig,
}

fn default_access_token_var() -> String {
    "STOREFRONT_ACCESS_TOKEN".to_string()
}

impl ProbeConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
