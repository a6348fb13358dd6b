//! Resolved identity of the current visitor.
//!
//! An [`AuthSession`] is built from the backend's customer record when
//! resolution succeeds. Sessions are immutable: every resolution (and every
//! masquerade change) produces a new value that replaces the old one whole.

use b2b_storefront_core::{CompanyId, CustomerGroupId, CustomerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::company::{CompanyInfo, CompanyStatus, MasqueradeCompany};
use crate::permission::{Permission, Permissions, default_permissions};
use crate::role::Role;

/// Customer record returned by the identity provider.
///
/// Only `id` and `email` are always present. `role`, `company` and
/// `permissions` are sent by backends that expose the B2B company module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub customer_group_id: Option<CustomerGroupId>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub company: Option<CompanyInfo>,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
}

impl CustomerRecord {
    /// Creates a bare consumer record.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(id),
            email: email.into(),
            first_name: None,
            last_name: None,
            company_name: None,
            customer_group_id: None,
            role: None,
            company: None,
            permissions: None,
        }
    }

    /// Returns true if the record carries a company association or a
    /// customer group.
    #[must_use]
    pub fn is_b2b(&self) -> bool {
        self.company.is_some()
            || self
                .company_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
            || self.customer_group_id.is_some()
    }
}

/// Credential material carried by a session.
///
/// Opaque to this crate. Never serialized and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SessionTokens {
    access_token: Option<String>,
}

impl SessionTokens {
    /// Wraps the access token the session was resolved with.
    #[must_use]
    pub fn new(access_token: Option<String>) -> Self {
        Self { access_token }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns true when the session holds no real credential.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
    }
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// The resolved identity of a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    user_id: CustomerId,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: Role,
    permissions: Permissions,
    company_id: CompanyId,
    company_name: String,
    company_status: CompanyStatus,
    company_info: CompanyInfo,
    #[serde(skip)]
    tokens: SessionTokens,
    #[serde(rename = "isB2BUser")]
    is_b2b_user: bool,
    resolved_at: DateTime<Utc>,
    masquerade: Option<MasqueradeCompany>,
}

impl AuthSession {
    /// Builds a session from a customer record.
    ///
    /// Company accounts default to `Admin` when the backend sends no role;
    /// consumer accounts are always `B2C` unless the backend marks them as
    /// `SuperAdmin`. An explicit permission list from the backend wins over
    /// the role template.
    #[must_use]
    pub fn from_customer(record: CustomerRecord, access_token: Option<String>) -> Self {
        let is_b2b = record.is_b2b();

        let role = if is_b2b {
            record.role.unwrap_or(Role::Admin)
        } else if record.role == Some(Role::SuperAdmin) {
            Role::SuperAdmin
        } else {
            Role::B2C
        };

        let permissions = match record.permissions {
            Some(list) => list.into_iter().collect(),
            None => default_permissions(is_b2b),
        };

        let company_info = match (is_b2b, record.company) {
            (true, Some(company)) => company,
            (true, None) => CompanyInfo {
                id: CompanyId::default(),
                name: record.company_name.clone().unwrap_or_default(),
                status: CompanyStatus::Approved,
                customer_group_id: record.customer_group_id.clone(),
                subsidiaries: Vec::new(),
            },
            (false, _) => CompanyInfo::consumer(),
        };

        Self {
            user_id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role,
            permissions,
            company_id: company_info.id.clone(),
            company_name: company_info.name.clone(),
            company_status: company_info.status,
            company_info,
            tokens: SessionTokens::new(access_token),
            is_b2b_user: is_b2b,
            resolved_at: Utc::now(),
            masquerade: None,
        }
    }

    /// Builds the degraded guest session used when no real identity could
    /// be resolved. It grants nothing.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            user_id: CustomerId::new(String::new()),
            email: String::new(),
            first_name: None,
            last_name: None,
            role: Role::B2C,
            permissions: Permissions::new(),
            company_id: CompanyId::default(),
            company_name: String::new(),
            company_status: CompanyStatus::Default,
            company_info: CompanyInfo::consumer(),
            tokens: SessionTokens::default(),
            is_b2b_user: false,
            resolved_at: Utc::now(),
            masquerade: None,
        }
    }

    /// Returns a copy of this session acting on behalf of `company`, or
    /// back as itself when `None`.
    #[must_use]
    pub fn with_masquerade(&self, company: Option<MasqueradeCompany>) -> Self {
        Self {
            masquerade: company,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &CustomerId {
        &self.user_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Returns "first last", falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name(), self.last_name()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.email.clone(),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    #[must_use]
    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    #[must_use]
    pub fn company_status(&self) -> CompanyStatus {
        self.company_status
    }

    #[must_use]
    pub fn company_info(&self) -> &CompanyInfo {
        &self.company_info
    }

    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    #[must_use]
    pub fn is_b2b_user(&self) -> bool {
        self.is_b2b_user
    }

    /// When the backend record behind this session was fetched.
    #[must_use]
    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    #[must_use]
    pub fn masquerade(&self) -> Option<&MasqueradeCompany> {
        self.masquerade.as_ref()
    }

    #[must_use]
    pub fn is_masquerading(&self) -> bool {
        self.masquerade.is_some()
    }
}
