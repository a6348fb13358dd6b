//! The externally visible authentication state.
//!
//! Identity is a tagged variant, so an authenticated state always carries a
//! session and a degraded guest can never be mistaken for a signed-in user.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::ResolveError;
use crate::session::AuthSession;

/// Which mechanism produced the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AuthSource {
    /// Resolved against the identity provider.
    #[serde(rename = "API")]
    Api,
    /// Produced locally without contacting the provider.
    Manual,
    /// No mechanism (initial, logged out, or empty strategy chain).
    #[default]
    None,
}

/// Who the visitor is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Identity {
    /// A real customer session.
    Authenticated { session: AuthSession },
    /// A guest session populated so dependent views can render a degraded
    /// experience. Not authenticated.
    DegradedGuest { session: AuthSession, reason: String },
    /// No session.
    Unauthenticated { error: Option<ResolveError> },
}

impl Identity {
    /// Returns true only for a real customer session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Snapshot of the store's committed state.
///
/// Serializes flat for UI consumers (`isAuthenticated`, `session`, `error`
/// and the rest), with the tagged `identity` alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    is_initialized: bool,
    is_loading: bool,
    identity: Identity,
    source: AuthSource,
}

impl AuthState {
    /// State before the first resolution.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            is_initialized: false,
            is_loading: false,
            identity: Identity::Unauthenticated { error: None },
            source: AuthSource::None,
        }
    }

    /// Terminal state after an explicit logout.
    #[must_use]
    pub fn logged_out() -> Self {
        Self {
            is_initialized: true,
            is_loading: false,
            identity: Identity::Unauthenticated { error: None },
            source: AuthSource::None,
        }
    }

    /// A completed resolution.
    #[must_use]
    pub fn resolved(identity: Identity, source: AuthSource) -> Self {
        Self {
            is_initialized: true,
            is_loading: false,
            identity,
            source,
        }
    }

    /// A completed resolution that ended with `error`.
    #[must_use]
    pub fn failed(error: ResolveError, source: AuthSource) -> Self {
        Self::resolved(Identity::Unauthenticated { error: Some(error) }, source)
    }

    /// This state with a resolution in progress. The identity stays as it
    /// was until the resolution commits.
    #[must_use]
    pub fn loading(&self) -> Self {
        Self {
            is_loading: true,
            ..self.clone()
        }
    }

    /// This state with its session replaced. Only meaningful for
    /// authenticated states; other states are returned unchanged.
    #[must_use]
    pub fn with_session(&self, session: AuthSession) -> Self {
        match &self.identity {
            Identity::Authenticated { .. } => Self {
                identity: Identity::Authenticated { session },
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_authenticated()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn source(&self) -> AuthSource {
        self.source
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The populated session, including a degraded guest session.
    #[must_use]
    pub fn session(&self) -> Option<&AuthSession> {
        match &self.identity {
            Identity::Authenticated { session } | Identity::DegradedGuest { session, .. } => {
                Some(session)
            }
            Identity::Unauthenticated { .. } => None,
        }
    }

    /// The session only if it belongs to an authenticated customer.
    #[must_use]
    pub fn authenticated_session(&self) -> Option<&AuthSession> {
        match &self.identity {
            Identity::Authenticated { session } => Some(session),
            _ => None,
        }
    }

    /// The typed failure, if resolution ended unauthenticated with one.
    #[must_use]
    pub fn failure(&self) -> Option<&ResolveError> {
        match &self.identity {
            Identity::Unauthenticated { error } => error.as_ref(),
            _ => None,
        }
    }

    /// Human-readable error: the failure or the degraded-guest reason.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        match &self.identity {
            Identity::Authenticated { .. } => None,
            Identity::DegradedGuest { reason, .. } => Some(reason.clone()),
            Identity::Unauthenticated { error } => error.as_ref().map(ToString::to_string),
        }
    }
}

impl Serialize for AuthState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AuthState", 7)?;
        state.serialize_field("isAuthenticated", &self.is_authenticated())?;
        state.serialize_field("isInitialized", &self.is_initialized)?;
        state.serialize_field("isLoading", &self.is_loading)?;
        state.serialize_field("session", &self.session())?;
        state.serialize_field("error", &self.error())?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("identity", &self.identity)?;
        state.end()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::uninitialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CustomerRecord;

    fn customer_session() -> AuthSession {
        AuthSession::from_customer(CustomerRecord::new("1", "a@b.test"), Some("t".into()))
    }

    #[test]
    fn uninitialized_state() {
        let state = AuthState::default();
        assert!(!state.is_initialized());
        assert!(!state.is_authenticated());
        assert!(state.session().is_none());
        assert_eq!(state.source(), AuthSource::None);
    }

    #[test]
    fn logged_out_state_matches_terminal_shape() {
        let state = AuthState::logged_out();
        assert!(state.is_initialized());
        assert!(!state.is_loading());
        assert!(!state.is_authenticated());
        assert!(state.session().is_none());
        assert!(state.error().is_none());
        assert_eq!(state.source(), AuthSource::None);
    }

    #[test]
    fn degraded_guest_has_session_but_is_not_authenticated() {
        let state = AuthState::resolved(
            Identity::DegradedGuest {
                session: AuthSession::guest(),
                reason: "guest".to_string(),
            },
            AuthSource::Manual,
        );
        assert!(!state.is_authenticated());
        assert!(state.session().is_some());
        assert!(state.authenticated_session().is_none());
        assert_eq!(state.error().as_deref(), Some("guest"));
    }

    #[test]
    fn loading_keeps_identity() {
        let state = AuthState::resolved(
            Identity::Authenticated {
                session: customer_session(),
            },
            AuthSource::Api,
        );
        let loading = state.loading();
        assert!(loading.is_loading());
        assert!(loading.is_authenticated());
        assert_eq!(loading.session(), state.session());
    }

    #[test]
    fn failed_state_exposes_error_string() {
        let state = AuthState::failed(ResolveError::NoCredential, AuthSource::Api);
        assert_eq!(state.failure(), Some(&ResolveError::NoCredential));
        assert_eq!(state.error().as_deref(), Some("no access token available"));
    }

    #[test]
    fn with_session_ignores_unauthenticated_states() {
        let state = AuthState::logged_out();
        assert_eq!(state.with_session(customer_session()), state);
    }

    #[test]
    fn state_serializes_flat_with_identity_tag() {
        let guest = AuthState::resolved(
            Identity::DegradedGuest {
                session: AuthSession::guest(),
                reason: "guest".to_string(),
            },
            AuthSource::Manual,
        );
        let json = serde_json::to_value(&guest).expect("serialize");
        assert_eq!(json["isAuthenticated"], false);
        assert_eq!(json["isInitialized"], true);
        assert_eq!(json["isLoading"], false);
        assert!(json["session"].is_object());
        assert_eq!(json["error"], "guest");
        assert_eq!(json["source"], "Manual");
        assert_eq!(json["identity"]["status"], "degraded_guest");

        let signed_in = AuthState::resolved(
            Identity::Authenticated {
                session: customer_session(),
            },
            AuthSource::Api,
        );
        let json = serde_json::to_value(&signed_in).expect("serialize");
        assert_eq!(json["isAuthenticated"], true);
        assert!(json["session"].is_object());
        assert!(json["error"].is_null());

        let json = serde_json::to_value(AuthState::logged_out()).expect("serialize");
        assert_eq!(json["isAuthenticated"], false);
        assert!(json["session"].is_null());
        assert!(json["error"].is_null());
        assert_eq!(json["identity"]["status"], "unauthenticated");
    }

    #[test]
    fn source_serializes_like_the_storefront() {
        assert_eq!(
            serde_json::to_string(&AuthSource::Api).expect("serialize"),
            "\"API\""
        );
        assert_eq!(
            serde_json::to_string(&AuthSource::Manual).expect("serialize"),
            "\"Manual\""
        );
    }
}
