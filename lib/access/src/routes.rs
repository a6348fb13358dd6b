//! Route authorization filtering.
//!
//! The host application owns the route table. Each entry pairs a
//! [`RouteDescriptor`] with whatever the host renders for it; filtering only
//! reads the descriptor and returns the surviving entries in table order.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::company::CompanyStatus;
use crate::flags::FeatureFlagSet;
use crate::role::Role;

/// Feature flag a route depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGate {
    /// Requires `product_quote_enabled`.
    ProductQuote,
    /// Requires `shopping_list_enabled`.
    ShoppingList,
}

impl FeatureGate {
    /// Gate implied by a path, for tables that don't declare one.
    #[must_use]
    pub fn infer(path: &str) -> Option<Self> {
        let path = path.to_ascii_lowercase();
        if path.contains("quote") {
            Some(Self::ProductQuote)
        } else if path.contains("shopping-list") || path.contains("shoppinglist") {
            Some(Self::ShoppingList)
        } else {
            None
        }
    }

    /// Returns true if `flags` open this gate.
    #[must_use]
    pub fn is_open(self, flags: &FeatureFlagSet) -> bool {
        match self {
            Self::ProductQuote => flags.product_quote_enabled,
            Self::ShoppingList => flags.shopping_list_enabled,
        }
    }
}

/// Access requirements of one route. Serializable so it can cross a
/// boundary without the render target.
///
/// A descriptor without a declared `featureGate` gets the gate implied by
/// its path, both from [`RouteDescriptor::new`] and when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRouteDescriptor")]
pub struct RouteDescriptor {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_menu_item: bool,
    pub requires_auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_company_statuses: Option<Vec<CompanyStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_permission_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_gate: Option<FeatureGate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRouteDescriptor {
    path: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_menu_item: bool,
    #[serde(default)]
    requires_auth: bool,
    #[serde(default)]
    required_role: Option<Role>,
    #[serde(default)]
    required_company_statuses: Option<Vec<CompanyStatus>>,
    #[serde(default)]
    required_permission_codes: Option<Vec<String>>,
    #[serde(default)]
    feature_gate: Option<FeatureGate>,
}

impl From<RawRouteDescriptor> for RouteDescriptor {
    fn from(raw: RawRouteDescriptor) -> Self {
        let feature_gate = raw.feature_gate.or_else(|| FeatureGate::infer(&raw.path));
        Self {
            path: raw.path,
            name: raw.name,
            is_menu_item: raw.is_menu_item,
            requires_auth: raw.requires_auth,
            required_role: raw.required_role,
            required_company_statuses: raw.required_company_statuses,
            required_permission_codes: raw.required_permission_codes,
            feature_gate,
        }
    }
}

impl RouteDescriptor {
    /// A public route at `path` with the gate inferred from the path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let feature_gate = FeatureGate::infer(&path);
        Self {
            path,
            name: None,
            is_menu_item: false,
            requires_auth: false,
            required_role: None,
            required_company_statuses: None,
            required_permission_codes: None,
            feature_gate,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn menu_item(mut self) -> Self {
        self.is_menu_item = true;
        self
    }

    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Restricts the route to exactly `role`. Implies authentication.
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.requires_auth = true;
        self.required_role = Some(role);
        self
    }

    /// Restricts the route to companies in one of `statuses`. Implies
    /// authentication.
    #[must_use]
    pub fn statuses(mut self, statuses: impl IntoIterator<Item = CompanyStatus>) -> Self {
        self.requires_auth = true;
        self.required_company_statuses = Some(statuses.into_iter().collect());
        self
    }

    /// Requires every code in `codes`. Implies authentication.
    #[must_use]
    pub fn permissions<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_auth = true;
        self.required_permission_codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the inferred gate.
    #[must_use]
    pub fn gate(mut self, gate: Option<FeatureGate>) -> Self {
        self.feature_gate = gate;
        self
    }

    fn admits<S: AsRef<str>>(
        &self,
        role: Role,
        status: CompanyStatus,
        granted_codes: &[S],
        flags: &FeatureFlagSet,
    ) -> bool {
        if self.feature_gate.is_some_and(|gate| !gate.is_open(flags)) {
            return false;
        }

        if !self.requires_auth {
            return true;
        }

        let role_ok = self.required_role.is_none_or(|required| required == role);
        let status_ok = self
            .required_company_statuses
            .as_ref()
            .is_none_or(|statuses| statuses.contains(&status));
        let codes_ok = self.required_permission_codes.as_ref().is_none_or(|codes| {
            codes
                .iter()
                .all(|code| granted_codes.iter().any(|granted| granted.as_ref() == code))
        });

        role_ok && status_ok && codes_ok
    }
}

/// A route table entry: the descriptor plus the host's render target.
#[derive(Debug, Clone)]
pub struct Route<V> {
    pub descriptor: RouteDescriptor,
    pub view: V,
}

impl<V> Route<V> {
    #[must_use]
    pub fn new(descriptor: RouteDescriptor, view: V) -> Self {
        Self { descriptor, view }
    }
}

impl<V> AsRef<RouteDescriptor> for Route<V> {
    fn as_ref(&self) -> &RouteDescriptor {
        &self.descriptor
    }
}

impl AsRef<RouteDescriptor> for RouteDescriptor {
    fn as_ref(&self) -> &RouteDescriptor {
        self
    }
}

/// Routes in `table` the visitor may reach, in table order.
///
/// An unknown `role` or `status` means the session has not resolved yet;
/// the result is then empty.
#[must_use]
pub fn filter_routes<'a, T, S>(
    table: &'a [T],
    role: Option<Role>,
    status: Option<CompanyStatus>,
    granted_codes: &[S],
    flags: &FeatureFlagSet,
) -> Vec<&'a T>
where
    T: AsRef<RouteDescriptor>,
    S: AsRef<str>,
{
    let (Some(role), Some(status)) = (role, status) else {
        trace!("role or company status unknown, no routes");
        return Vec::new();
    };

    table
        .iter()
        .filter(|route| route.as_ref().admits(role, status, granted_codes, flags))
        .collect()
}

/// Descriptors of the accessible routes, render targets stripped.
#[must_use]
pub fn route_descriptors<T, S>(
    table: &[T],
    role: Option<Role>,
    status: Option<CompanyStatus>,
    granted_codes: &[S],
    flags: &FeatureFlagSet,
) -> Vec<RouteDescriptor>
where
    T: AsRef<RouteDescriptor>,
    S: AsRef<str>,
{
    filter_routes(table, role, status, granted_codes, flags)
        .into_iter()
        .map(|route| route.as_ref().clone())
        .collect()
}

/// Accessible routes that belong in the navigation menu.
#[must_use]
pub fn menu_routes<'a, T, S>(
    table: &'a [T],
    role: Option<Role>,
    status: Option<CompanyStatus>,
    granted_codes: &[S],
    flags: &FeatureFlagSet,
) -> Vec<&'a T>
where
    T: AsRef<RouteDescriptor>,
    S: AsRef<str>,
{
    let mut routes = filter_routes(table, role, status, granted_codes, flags);
    routes.retain(|route| route.as_ref().is_menu_item);
    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths<T: AsRef<RouteDescriptor>>(routes: &[&T]) -> Vec<String> {
        routes.iter().map(|r| r.as_ref().path.clone()).collect()
    }

    fn table() -> Vec<Route<&'static str>> {
        vec![
            Route::new(RouteDescriptor::new("/login"), "login"),
            Route::new(
                RouteDescriptor::new("/orders").menu_item().authenticated(),
                "orders",
            ),
            Route::new(
                RouteDescriptor::new("/quotes")
                    .menu_item()
                    .permissions(["view_quotes"]),
                "quotes",
            ),
            Route::new(
                RouteDescriptor::new("/shopping-lists")
                    .menu_item()
                    .authenticated(),
                "lists",
            ),
            Route::new(
                RouteDescriptor::new("/user-management")
                    .menu_item()
                    .role(Role::Admin)
                    .statuses([CompanyStatus::Approved]),
                "users",
            ),
        ]
    }

    #[test]
    fn quotes_require_every_listed_code() {
        let table = table();
        let flags = FeatureFlagSet::default();

        let routes = filter_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &["view_orders"],
            &flags,
        );
        assert!(!paths(&routes).contains(&"/quotes".to_string()));

        let routes = filter_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &["view_orders", "view_quotes"],
            &flags,
        );
        assert!(paths(&routes).contains(&"/quotes".to_string()));
    }

    #[test]
    fn disabled_quote_flag_hides_quote_routes() {
        let table = table();
        let flags = FeatureFlagSet {
            product_quote_enabled: false,
            ..FeatureFlagSet::default()
        };
        let routes = filter_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &["view_quotes"],
            &flags,
        );
        assert!(!paths(&routes).contains(&"/quotes".to_string()));
    }

    #[test]
    fn gate_applies_to_public_routes() {
        let table = vec![RouteDescriptor::new("/quote-request")];
        let flags = FeatureFlagSet {
            product_quote_enabled: false,
            ..FeatureFlagSet::default()
        };
        let granted: [&str; 0] = [];
        let routes = filter_routes(
            &table,
            Some(Role::B2C),
            Some(CompanyStatus::Default),
            &granted,
            &flags,
        );
        assert!(routes.is_empty());
    }

    #[test]
    fn shopping_list_gate_is_inferred() {
        assert_eq!(
            FeatureGate::infer("/account/shoppingList/3"),
            Some(FeatureGate::ShoppingList)
        );
        assert_eq!(FeatureGate::infer("/orders"), None);

        let table = table();
        let flags = FeatureFlagSet {
            shopping_list_enabled: false,
            ..FeatureFlagSet::default()
        };
        let granted: [&str; 0] = [];
        let routes = filter_routes(
            &table,
            Some(Role::JuniorBuyer),
            Some(CompanyStatus::Approved),
            &granted,
            &flags,
        );
        assert_eq!(paths(&routes), ["/login", "/orders"]);
    }

    #[test]
    fn explicit_gate_overrides_inference() {
        let table = vec![RouteDescriptor::new("/quotes-archive").gate(None)];
        let flags = FeatureFlagSet {
            product_quote_enabled: false,
            ..FeatureFlagSet::default()
        };
        let granted: [&str; 0] = [];
        let routes = filter_routes(
            &table,
            Some(Role::B2C),
            Some(CompanyStatus::Default),
            &granted,
            &flags,
        );
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn role_and_status_are_exact() {
        let table = table();
        let flags = FeatureFlagSet::default();
        let granted: [&str; 0] = [];

        let routes = filter_routes(
            &table,
            Some(Role::SuperAdmin),
            Some(CompanyStatus::Approved),
            &granted,
            &flags,
        );
        assert!(!paths(&routes).contains(&"/user-management".to_string()));

        let routes = filter_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Pending),
            &granted,
            &flags,
        );
        assert!(!paths(&routes).contains(&"/user-management".to_string()));

        let routes = filter_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &granted,
            &flags,
        );
        assert!(paths(&routes).contains(&"/user-management".to_string()));
    }

    #[test]
    fn unknown_role_or_status_yields_nothing() {
        let table = table();
        let flags = FeatureFlagSet::default();
        let granted: [&str; 0] = [];
        let routes = filter_routes(
            &table,
            None,
            Some(CompanyStatus::Approved),
            &granted,
            &flags,
        );
        assert!(routes.is_empty());
        let routes = filter_routes(&table, Some(Role::Admin), None, &granted, &flags);
        assert!(routes.is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let table = table();
        let routes = filter_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &["view_quotes"],
            &FeatureFlagSet::default(),
        );
        assert_eq!(
            paths(&routes),
            ["/login", "/orders", "/quotes", "/shopping-lists", "/user-management"]
        );
    }

    #[test]
    fn menu_routes_drop_non_menu_entries() {
        let table = table();
        let routes = menu_routes(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &["view_quotes"],
            &FeatureFlagSet::default(),
        );
        assert_eq!(routes.first().map(|r| r.view), Some("orders"));
        assert!(routes.iter().all(|r| r.descriptor.is_menu_item));
    }

    #[test]
    fn descriptors_serialize_without_views() {
        let table = table();
        let descriptors = route_descriptors(
            &table,
            Some(Role::Admin),
            Some(CompanyStatus::Approved),
            &["view_quotes"],
            &FeatureFlagSet::default(),
        );
        let json = serde_json::to_value(&descriptors).expect("serialize");

        assert_eq!(json[2]["path"], "/quotes");
        assert_eq!(json[2]["requiredPermissionCodes"][0], "view_quotes");
        assert_eq!(json[2]["featureGate"], "product_quote");
        assert_eq!(json[4]["requiredRole"], 1);
        assert!(json[0].get("requiredRole").is_none());
    }

    #[test]
    fn descriptor_deserializes_with_defaults() {
        let descriptor: RouteDescriptor =
            serde_json::from_str(r#"{"path":"/invoices","requiresAuth":true}"#).expect("parse");
        assert!(descriptor.requires_auth);
        assert!(!descriptor.is_menu_item);
        assert!(descriptor.feature_gate.is_none());

        let descriptor: RouteDescriptor =
            serde_json::from_str(r#"{"path":"/quotes/12"}"#).expect("parse");
        assert_eq!(descriptor.feature_gate, Some(FeatureGate::ProductQuote));
    }
}
