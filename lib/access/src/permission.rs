//! Leveled permissions and the default role templates.
//!
//! A permission is a `code` plus a level in `0..=3`. A code that is absent
//! from a list is treated as level 0.

use serde::{Deserialize, Serialize};

use crate::session::AuthSession;

/// Highest permission level.
pub const MAX_LEVEL: u8 = 3;

/// Level required when a caller does not specify one.
pub const DEFAULT_REQUIRED_LEVEL: u8 = 1;

/// A single permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPermission")]
pub struct Permission {
    code: String,
    level: u8,
}

#[derive(Deserialize)]
struct RawPermission {
    code: String,
    level: u8,
}

impl From<RawPermission> for Permission {
    fn from(raw: RawPermission) -> Self {
        Self::new(raw.code, raw.level)
    }
}

impl Permission {
    /// Creates a permission, clamping the level to [`MAX_LEVEL`].
    #[must_use]
    pub fn new(code: impl Into<String>, level: u8) -> Self {
        Self {
            code: code.into(),
            level: level.min(MAX_LEVEL),
        }
    }

    /// Returns the permission code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the granted level.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }
}

/// An ordered list of permissions with at most one entry per code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct Permissions(Vec<Permission>);

impl Permissions {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the level granted for `code`, 0 when absent.
    #[must_use]
    pub fn level(&self, code: &str) -> u8 {
        self.0
            .iter()
            .find(|p| p.code == code)
            .map_or(0, |p| p.level)
    }

    /// Returns true if `code` is granted at `required_level` or above. An
    /// absent code counts as level 0.
    #[must_use]
    pub fn allows(&self, code: &str, required_level: u8) -> bool {
        self.level(code) >= required_level
    }

    /// Returns true if `code` has an entry, at any level.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|p| p.code == code)
    }

    /// Codes granted at level 1 or above, in list order.
    #[must_use]
    pub fn granted_codes(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|p| p.level >= DEFAULT_REQUIRED_LEVEL)
            .map(|p| p.code.clone())
            .collect()
    }

    /// Returns the permissions as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Permission] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for Permissions {
    /// Collects permissions; a repeated code keeps its highest level at the
    /// position of its first occurrence.
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut list: Vec<Permission> = Vec::new();
        for permission in iter {
            match list.iter_mut().find(|p| p.code == permission.code) {
                Some(existing) => existing.level = existing.level.max(permission.level),
                None => list.push(permission),
            }
        }
        Self(list)
    }
}

impl From<Vec<Permission>> for Permissions {
    fn from(list: Vec<Permission>) -> Self {
        list.into_iter().collect()
    }
}

impl From<Permissions> for Vec<Permission> {
    fn from(permissions: Permissions) -> Self {
        permissions.0
    }
}

/// Permissions seeded for a company account when the backend sends none.
const COMPANY_TEMPLATE: [(&str, u8); 6] = [
    ("orders", 3),
    ("quotes", 3),
    ("invoices", 3),
    ("quick_order", 3),
    ("shopping_lists", 2),
    ("addresses", 2),
];

/// Permissions seeded for a consumer account when the backend sends none.
const CONSUMER_TEMPLATE: [(&str, u8); 6] = [
    ("orders", 1),
    ("quotes", 0),
    ("invoices", 0),
    ("quick_order", 1),
    ("shopping_lists", 0),
    ("addresses", 1),
];

/// Returns the default permission set for an account classification.
#[must_use]
pub fn default_permissions(is_b2b: bool) -> Permissions {
    let template = if is_b2b {
        &COMPANY_TEMPLATE
    } else {
        &CONSUMER_TEMPLATE
    };
    template
        .iter()
        .map(|(code, level)| Permission::new(*code, *level))
        .collect()
}

/// Checks a session's permission list.
///
/// Returns false when there is no session, the code has no entry, or it is
/// granted below `required_level`. Never fails.
#[must_use]
pub fn has_permission(session: Option<&AuthSession>, code: &str, required_level: u8) -> bool {
    session.is_some_and(|s| {
        let permissions = s.permissions();
        permissions.contains(code) && permissions.allows(code, required_level)
    })
}

/// Returns true if any of `candidates` appears in `granted`.
#[must_use]
pub fn has_any_of<S: AsRef<str>>(granted: &[S], candidates: &[&str]) -> bool {
    granted
        .iter()
        .any(|code| candidates.contains(&code.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthSession, CustomerRecord};

    fn session_with(permissions: Vec<Permission>) -> AuthSession {
        let mut record = CustomerRecord::new("7", "buyer@example.com");
        record.permissions = Some(permissions);
        AuthSession::from_customer(record, None)
    }

    #[test]
    fn levels_are_clamped() {
        assert_eq!(Permission::new("orders", 9).level(), MAX_LEVEL);
        let parsed: Permission =
            serde_json::from_str(r#"{"code":"orders","level":5}"#).expect("deserialize");
        assert_eq!(parsed.level(), MAX_LEVEL);
    }

    #[test]
    fn duplicate_codes_collapse_to_highest_level() {
        let list: Permissions = vec![
            Permission::new("orders", 1),
            Permission::new("quotes", 2),
            Permission::new("orders", 3),
        ]
        .into();
        assert_eq!(list.len(), 2);
        assert_eq!(list.level("orders"), 3);
        assert_eq!(list.as_slice()[0].code(), "orders");
    }

    #[test]
    fn missing_code_is_level_zero() {
        let list = Permissions::new();
        assert_eq!(list.level("invoices"), 0);
        assert!(list.allows("invoices", 0));
        assert!(!list.allows("invoices", 1));
        assert!(!list.contains("invoices"));
    }

    #[test]
    fn allows_compares_against_granted_level() {
        let list: Permissions =
            vec![Permission::new("orders", 2), Permission::new("quotes", 0)].into();
        assert!(list.allows("orders", 0));
        assert!(list.allows("orders", 2));
        assert!(!list.allows("orders", 3));
        assert!(list.allows("quotes", 0));
        assert!(!list.allows("quotes", 1));
        assert!(list.allows("returns", 0));
    }

    #[test]
    fn has_permission_needs_an_entry_even_at_level_zero() {
        let session = session_with(vec![Permission::new("quotes", 0)]);
        assert!(has_permission(Some(&session), "quotes", 0));
        assert!(!has_permission(Some(&session), "returns", 0));
        assert!(!has_permission(None, "quotes", 0));
    }

    #[test]
    fn has_permission_respects_levels() {
        let session = session_with(vec![Permission::new("orders", 2)]);
        assert!(has_permission(Some(&session), "orders", 1));
        assert!(has_permission(Some(&session), "orders", 2));
        assert!(!has_permission(Some(&session), "orders", 3));
    }

    #[test]
    fn has_permission_false_for_unknown_code_or_missing_session() {
        let session = session_with(vec![Permission::new("orders", 3)]);
        assert!(!has_permission(
            Some(&session),
            "purchase_approvals",
            DEFAULT_REQUIRED_LEVEL
        ));
        assert!(!has_permission(None, "orders", DEFAULT_REQUIRED_LEVEL));
    }

    #[test]
    fn company_template_grants_full_ordering() {
        let list = default_permissions(true);
        assert_eq!(list.level("orders"), 3);
        assert_eq!(list.level("quotes"), 3);
        assert_eq!(list.level("invoices"), 3);
        assert_eq!(list.level("quick_order"), 3);
        assert_eq!(list.level("shopping_lists"), 2);
        assert_eq!(list.level("addresses"), 2);
    }

    #[test]
    fn consumer_template_withholds_company_features() {
        let list = default_permissions(false);
        assert_eq!(list.level("orders"), 1);
        assert_eq!(list.level("quotes"), 0);
        assert_eq!(list.level("invoices"), 0);
        assert_eq!(list.level("shopping_lists"), 0);
        assert_eq!(
            list.granted_codes(),
            vec!["orders", "quick_order", "addresses"]
        );
    }

    #[test]
    fn has_any_of_matches_exact_codes() {
        let granted = vec!["quotes_create".to_string()];
        assert!(has_any_of(&granted, &["quotes_create", "quotesCreateActions"]));
        assert!(!has_any_of(&granted, &["quotes"]));
        assert!(!has_any_of::<String>(&[], &["quotes_create"]));
    }
}
