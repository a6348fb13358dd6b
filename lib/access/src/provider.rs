//! Seams to the outside world: where the access token comes from and who
//! answers "which customer owns this token".

use async_trait::async_trait;
use b2b_storefront_core::Result;
use parking_lot::RwLock;

use crate::error::IdentityProviderError;
use crate::session::CustomerRecord;

/// Supplies the current visitor's access token.
///
/// Reading the token must not block; hosts typically read a cookie or a
/// value cached at sign-in.
pub trait CredentialSource: Send + Sync {
    /// Returns the access token, or `None` for an anonymous visitor.
    fn access_token(&self) -> Option<String>;
}

/// Looks up the customer behind an access token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetches the current customer.
    ///
    /// `Ok(None)` means the provider answered but knows no customer for
    /// the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or rejects the call.
    async fn current_customer(
        &self,
        access_token: &str,
    ) -> Result<Option<CustomerRecord>, IdentityProviderError>;
}

/// Credential source holding a token set by the host at sign-in.
#[derive(Debug, Default)]
pub struct StaticCredentialSource {
    token: RwLock<Option<String>>,
}

impl StaticCredentialSource {
    /// Creates a source holding `token`.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    /// Replaces the held token. Blank tokens clear it.
    pub fn set(&self, token: Option<String>) {
        *self.token.write() = token.filter(|t| !t.trim().is_empty());
    }
}

impl CredentialSource for StaticCredentialSource {
    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_are_absent() {
        let source = StaticCredentialSource::new(Some("  ".to_string()));
        assert!(source.access_token().is_none());

        source.set(Some("abc".to_string()));
        assert_eq!(source.access_token().as_deref(), Some("abc"));

        source.set(None);
        assert!(source.access_token().is_none());
    }
}
