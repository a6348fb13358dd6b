//! Identity and authorization resolution for the B2B storefront.
//!
//! This crate provides:
//! - The permission and role model (`Role`, `Permission`, `has_permission`)
//! - An ordered authentication strategy chain (`Resolver`)
//! - The single process-wide session store (`SessionStore`)
//! - Feature flags derived from the session (`FeatureFlagDeriver`)
//! - Route filtering against role, company status, permissions and flags
//!
//! # Resolution Model
//!
//! The store owns the only mutable `AuthState`. `initialize` resolves once
//! and coalesces concurrent callers; `reauthenticate` supersedes anything in
//! flight; `logout` commits immediately. Subscribers receive the current
//! state on registration and every committed state afterwards, in order.
//!
//! # Example
//!
//! ```
//! use b2b_storefront_access::{
//!     filter_routes, AccessConfig, Resolver, Role, RouteDescriptor, SessionStore,
//!     StaticCredentialSource,
//! };
//! # use b2b_storefront_access::{CustomerRecord, IdentityProvider, IdentityProviderError};
//! # use std::sync::Arc;
//! # struct Nobody;
//! # #[async_trait::async_trait]
//! # impl IdentityProvider for Nobody {
//! #     async fn current_customer(
//! #         &self,
//! #         _: &str,
//! #     ) -> Result<Option<CustomerRecord>, rootcause::Report<IdentityProviderError>> {
//! #         Ok(None)
//! #     }
//! # }
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let credentials = Arc::new(StaticCredentialSource::new(None));
//! let resolver = Resolver::standard(credentials, Arc::new(Nobody), &AccessConfig::default());
//! let store = SessionStore::new(resolver);
//!
//! let state = store.initialize().await;
//! assert!(!state.is_authenticated());
//!
//! let table = [RouteDescriptor::new("/login"), RouteDescriptor::new("/users").role(Role::Admin)];
//! let routes = filter_routes(
//!     &table,
//!     store.role(),
//!     store.company_status(),
//!     &store.granted_codes(),
//!     &AccessConfig::default().base_flags,
//! );
//! assert_eq!(routes.len(), 1);
//! # });
//! ```

pub mod company;
pub mod config;
pub mod error;
pub mod flags;
pub mod permission;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

// Re-export main types at crate root
pub use company::{CompanyInfo, CompanyStatus, MasqueradeCompany};
pub use config::AccessConfig;
pub use error::{IdentityProviderError, MasqueradeError, ResolveError};
pub use flags::{FeatureFlagDeriver, FeatureFlagSet, UiFlags, derive_flags, derive_ui_flags};
pub use permission::{Permission, Permissions, default_permissions, has_permission};
pub use provider::{CredentialSource, IdentityProvider, StaticCredentialSource};
pub use resolver::{AuthStrategy, GuestFallbackStrategy, ProviderStrategy, Resolver};
pub use role::Role;
pub use routes::{
    FeatureGate, Route, RouteDescriptor, filter_routes, menu_routes, route_descriptors,
};
pub use session::{AuthSession, CustomerRecord};
pub use state::{AuthSource, AuthState, Identity};
pub use store::{SessionStore, Subscription};
