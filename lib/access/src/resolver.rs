//! Authentication resolver: an ordered chain of strategies.
//!
//! The first strategy that authenticates wins. If none does, the outcome of
//! the last strategy attempted is returned, so a trailing guest fallback
//! determines what an anonymous visitor sees.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::AccessConfig;
use crate::error::ResolveError;
use crate::provider::{CredentialSource, IdentityProvider};
use crate::session::AuthSession;
use crate::state::{AuthSource, AuthState, Identity};

/// One way of producing an identity.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Source reported for this strategy's outcomes.
    fn source(&self) -> AuthSource;

    /// Attempts to resolve an identity. Failures are part of the returned
    /// state, never an error.
    async fn attempt(&self) -> AuthState;
}

/// Resolves the visitor against the identity provider using the access
/// token from the credential source.
pub struct ProviderStrategy {
    credentials: Arc<dyn CredentialSource>,
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl ProviderStrategy {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        provider: Arc<dyn IdentityProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            provider,
            timeout,
        }
    }

    fn fail(&self, error: ResolveError) -> AuthState {
        AuthState::failed(error, self.source())
    }
}

#[async_trait]
impl AuthStrategy for ProviderStrategy {
    fn name(&self) -> &'static str {
        "provider"
    }

    fn source(&self) -> AuthSource {
        AuthSource::Api
    }

    #[instrument(skip(self), name = "provider_strategy")]
    async fn attempt(&self) -> AuthState {
        let Some(token) = self.credentials.access_token() else {
            debug!("no access token, skipping provider lookup");
            return self.fail(ResolveError::NoCredential);
        };

        let lookup = self.provider.current_customer(&token);
        let record = match tokio::time::timeout(self.timeout, lookup).await {
            Err(_) => {
                warn!(timeout = ?self.timeout, "customer lookup timed out");
                return self.fail(ResolveError::Provider {
                    reason: format!("no answer within {}ms", self.timeout.as_millis()),
                });
            }
            Ok(Err(report)) => {
                warn!(error = %report, "customer lookup failed");
                return self.fail(ResolveError::Provider {
                    reason: "customer lookup failed".to_string(),
                });
            }
            Ok(Ok(None)) => {
                return self.fail(ResolveError::Provider {
                    reason: "no customer returned".to_string(),
                });
            }
            Ok(Ok(Some(record))) => record,
        };

        let session = AuthSession::from_customer(record, Some(token));
        info!(
            user_id = %session.user_id(),
            role = %session.role(),
            is_b2b = session.is_b2b_user(),
            "customer resolved"
        );
        AuthState::resolved(Identity::Authenticated { session }, self.source())
    }
}

/// Produces a degraded guest identity without contacting anything.
#[derive(Debug, Default)]
pub struct GuestFallbackStrategy;

/// Reason attached to degraded guest states.
pub const GUEST_FALLBACK_REASON: &str = "signed-in identity unavailable, continuing as guest";

#[async_trait]
impl AuthStrategy for GuestFallbackStrategy {
    fn name(&self) -> &'static str {
        "guest_fallback"
    }

    fn source(&self) -> AuthSource {
        AuthSource::Manual
    }

    async fn attempt(&self) -> AuthState {
        AuthState::resolved(
            Identity::DegradedGuest {
                session: AuthSession::guest(),
                reason: GUEST_FALLBACK_REASON.to_string(),
            },
            self.source(),
        )
    }
}

/// Ordered chain of strategies.
///
/// Owned by the session store, which is the only caller of `resolve`.
#[derive(Default)]
pub struct Resolver {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl Resolver {
    /// Creates a resolver with no strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront chain: provider lookup, then the guest fallback when
    /// enabled in `config`.
    #[must_use]
    pub fn standard(
        credentials: Arc<dyn CredentialSource>,
        provider: Arc<dyn IdentityProvider>,
        config: &AccessConfig,
    ) -> Self {
        let resolver = Self::new().with_strategy(ProviderStrategy::new(
            credentials,
            provider,
            config.provider_timeout(),
        ));
        if config.guest_fallback {
            resolver.with_strategy(GuestFallbackStrategy)
        } else {
            resolver
        }
    }

    /// Appends a strategy to the end of the chain.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl AuthStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Number of strategies in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    #[instrument(skip(self), fields(strategies = self.strategies.len()))]
    pub(crate) async fn resolve(&self) -> AuthState {
        let mut last = None;

        for strategy in &self.strategies {
            let outcome = AssertUnwindSafe(strategy.attempt()).catch_unwind().await;
            let state = match outcome {
                Ok(state) => state,
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    warn!(strategy = strategy.name(), %reason, "strategy panicked");
                    AuthState::failed(ResolveError::Unknown { reason }, strategy.source())
                }
            };

            if state.is_authenticated() {
                debug!(strategy = strategy.name(), "strategy authenticated");
                return state;
            }

            let error = state.error().unwrap_or_default();
            debug!(strategy = strategy.name(), %error, "strategy did not authenticate");
            last = Some(state);
        }

        last.unwrap_or_else(|| AuthState::failed(ResolveError::NoStrategies, AuthSource::None))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "strategy panicked".to_string()
    }
}
