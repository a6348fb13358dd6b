//! Identity provider and credential source backed by the outside world.

use async_trait::async_trait;
use b2b_storefront_access::{
    CredentialSource, CustomerRecord, IdentityProvider, IdentityProviderError,
};
use reqwest::StatusCode;
use rootcause::Report;
use tracing::{debug, instrument, warn};

/// Reads the access token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    variable: String,
}

impl EnvCredentialSource {
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl CredentialSource for EnvCredentialSource {
    fn access_token(&self) -> Option<String> {
        std::env::var(&self.variable)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

/// Looks up the current customer with `GET {base}/customers/me`.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIdentityProvider {
    /// Creates a provider against the storefront API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, Report<IdentityProviderError>> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IdentityProviderError::Unavailable {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: customer_endpoint(base_url),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self, access_token), fields(endpoint = %self.endpoint))]
    async fn current_customer(
        &self,
        access_token: &str,
    ) -> Result<Option<CustomerRecord>, Report<IdentityProviderError>> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "customer lookup request failed");
                IdentityProviderError::Unavailable {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityProviderError::Unavailable {
                reason: format!("failed to read response body: {e}"),
            })?;
        debug!(%status, "customer lookup answered");

        Ok(interpret_response(status, &body)?)
    }
}

fn customer_endpoint(base_url: &str) -> String {
    format!("{}/customers/me", base_url.trim_end_matches('/'))
}

/// Maps a `/customers/me` answer onto the provider contract: `404` or a
/// `null` body means the token belongs to no customer.
fn interpret_response(
    status: StatusCode,
    body: &str,
) -> Result<Option<CustomerRecord>, IdentityProviderError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(IdentityProviderError::Rejected {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(IdentityProviderError::Unavailable {
            reason: format!("HTTP {status}"),
        });
    }
    if body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Option<CustomerRecord>>(body).map_err(|e| {
        IdentityProviderError::InvalidResponse {
            reason: e.to_string(),
        }
    })
}
