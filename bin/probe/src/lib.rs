//! Storefront access probe.
//!
//! Resolves the current visitor against a live storefront API and reports
//! the committed state, the derived UI flags and the portal routes the
//! visitor may reach.

pub mod config;
pub mod identity;
pub mod portal;

use b2b_storefront_access::{
    AuthState, FeatureFlagDeriver, Route, RouteDescriptor, SessionStore, UiFlags,
    route_descriptors,
};
use serde::Serialize;

/// Everything the probe prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub state: AuthState,
    pub flags: UiFlags,
    pub routes: Vec<RouteDescriptor>,
}

impl ProbeReport {
    /// Snapshots `store` and filters `table` with the derived flags.
    #[must_use]
    pub fn collect<V>(
        store: &SessionStore,
        deriver: &FeatureFlagDeriver,
        table: &[Route<V>],
    ) -> Self {
        let state = store.get_state();
        let flags = deriver.current();
        let routes = route_descriptors(
            table,
            store.role(),
            store.company_status(),
            &store.granted_codes(),
            &flags.flags,
        );

        Self {
            state,
            flags,
            routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::portal_routes;
    use async_trait::async_trait;
    use b2b_storefront_access::{
        AccessConfig, CustomerRecord, IdentityProvider, IdentityProviderError, Resolver,
        StaticCredentialSource,
    };
    use rootcause::Report;
    use std::sync::Arc;

    struct OneCustomer(Option<CustomerRecord>);

    #[async_trait]
    impl IdentityProvider for OneCustomer {
        async fn current_customer(
            &self,
            _access_token: &str,
        ) -> Result<Option<CustomerRecord>, Report<IdentityProviderError>> {
            Ok(self.0.clone())
        }
    }

    fn store(token: Option<&str>, customer: Option<CustomerRecord>) -> SessionStore {
        let credentials = Arc::new(StaticCredentialSource::new(token.map(str::to_string)));
        let resolver = Resolver::standard(
            credentials,
            Arc::new(OneCustomer(customer)),
            &AccessConfig::default(),
        );
        SessionStore::new(resolver)
    }

    #[tokio::test]
    async fn company_buyer_without_quote_code_loses_quote_route() {
        let mut record = CustomerRecord::new("7", "buyer@acme.test");
        record.company_name = Some("Acme".to_string());
        let store = store(Some("tok"), Some(record));
        let deriver = FeatureFlagDeriver::attach(&store, AccessConfig::default().base_flags);

        store.initialize().await;
        let report = ProbeReport::collect(&store, &deriver, &portal_routes());

        assert!(report.state.is_authenticated());
        assert!(report.flags.is_company_account);
        assert!(!report.flags.flags.product_quote_enabled);
        let paths: Vec<_> = report.routes.iter().map(|r| r.path.as_str()).collect();
        assert!(paths.contains(&"/company-orders"));
        assert!(!paths.contains(&"/quotes"));
    }

    #[tokio::test]
    async fn anonymous_visitor_gets_guest_routes() {
        let store = store(None, None);
        let deriver = FeatureFlagDeriver::attach(&store, AccessConfig::default().base_flags);

        store.initialize().await;
        let report = ProbeReport::collect(&store, &deriver, &portal_routes());

        assert!(!report.state.is_authenticated());
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["state"]["source"], "Manual");
        assert_eq!(json["state"]["identity"]["status"], "degraded_guest");
        assert_eq!(json["state"]["isAuthenticated"], false);
        assert!(json["state"]["session"].is_object());
        assert!(
            report
                .routes
                .iter()
                .any(|route| route.path == "/login")
        );
    }
}
