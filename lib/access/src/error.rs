//! Error types for the access crate.
//!
//! - `ResolveError`: why a resolution did not authenticate. Captured into
//!   the committed state, never propagated past the store.
//! - `IdentityProviderError`: failures at the identity provider seam,
//!   wrapped in a rootcause `Report`.
//! - `MasqueradeError`: rejected masquerade changes.

use serde::Serialize;
use std::fmt;

use crate::role::Role;

/// Reasons a resolution ended unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    /// No access token is available. Expected for anonymous visitors.
    NoCredential,
    /// The provider was unreachable or returned no usable customer.
    Provider { reason: String },
    /// A strategy failed unexpectedly.
    Unknown { reason: String },
    /// The resolver has no strategies configured.
    NoStrategies,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredential => write!(f, "no access token available"),
            Self::Provider { reason } => write!(f, "identity provider error: {reason}"),
            Self::Unknown { reason } => write!(f, "unexpected resolution failure: {reason}"),
            Self::NoStrategies => write!(f, "no authentication strategy configured"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Errors from identity provider calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProviderError {
    /// The provider could not be reached.
    Unavailable { reason: String },
    /// The provider rejected the access token.
    Rejected { status: u16 },
    /// The provider answered with a body that could not be decoded.
    InvalidResponse { reason: String },
}

impl fmt::Display for IdentityProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "identity provider unavailable: {reason}"),
            Self::Rejected { status } => {
                write!(f, "identity provider rejected the token (status {status})")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid identity provider response: {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityProviderError {}

/// Errors from masquerade changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasqueradeError {
    /// No authenticated session is committed.
    NotAuthenticated,
    /// The session's role may not act on behalf of companies.
    NotPermitted { role: Role },
    /// A resolution is in flight and would replace the session.
    ResolutionInFlight,
}

impl fmt::Display for MasqueradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "no authenticated session"),
            Self::NotPermitted { role } => {
                write!(f, "role '{role}' may not act on behalf of a company")
            }
            Self::ResolutionInFlight => {
                write!(f, "cannot change masquerade while resolution is in flight")
            }
        }
    }
}

impl std::error::Error for MasqueradeError {}
