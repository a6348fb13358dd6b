//! Company records embedded in a session.

use b2b_storefront_core::{CompanyId, CustomerGroupId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a B2B company.
///
/// Transitions are driven by the backend's approval workflow; this crate
/// only reads the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    /// Registration submitted, awaiting approval.
    Pending,
    /// Approved and active.
    Approved,
    /// Registration rejected.
    Rejected,
    /// Suspended by the merchant.
    Inactive,
    /// Removed.
    Deleted,
    /// Not a company at all (consumer account).
    #[default]
    Default,
}

impl CompanyStatus {
    /// Returns true for the B2B lifecycle states.
    #[must_use]
    pub fn is_company(self) -> bool {
        !matches!(self, Self::Default)
    }
}

/// A company as seen by the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub id: CompanyId,
    pub name: String,
    pub status: CompanyStatus,
    #[serde(default)]
    pub customer_group_id: Option<CustomerGroupId>,
    #[serde(default)]
    pub subsidiaries: Vec<CompanyInfo>,
}

impl CompanyInfo {
    /// Company placeholder for consumer accounts.
    #[must_use]
    pub fn consumer() -> Self {
        Self::default()
    }

    /// Finds this company or one of its subsidiaries by id, depth first.
    #[must_use]
    pub fn find(&self, id: &CompanyId) -> Option<&CompanyInfo> {
        if &self.id == id {
            return Some(self);
        }
        self.subsidiaries.iter().find_map(|sub| sub.find(id))
    }
}

/// The company a super admin is currently acting on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasqueradeCompany {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub customer_group_id: Option<CustomerGroupId>,
}
