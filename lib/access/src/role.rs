//! Buyer portal roles.
//!
//! Roles are a closed set of identifiers supplied by the commerce backend.
//! The numeric values are identifiers only: `SuperAdmin = 100` marks the
//! separate system tier and is not "above" `CustomRole`. For that reason
//! `Role` implements equality but no ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a storefront user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Role {
    /// Consumer account, not part of any company.
    B2C,
    /// Company administrator.
    Admin,
    /// Buyer allowed to approve and place larger orders.
    SeniorBuyer,
    /// Buyer with the most restricted company permissions.
    JuniorBuyer,
    /// Company-defined role whose permissions come from the backend.
    CustomRole,
    /// Platform operator able to act on behalf of companies.
    SuperAdmin,
}

impl Role {
    /// Returns the backend's numeric identifier for this role.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::B2C => 0,
            Self::Admin => 1,
            Self::SeniorBuyer => 2,
            Self::JuniorBuyer => 3,
            Self::CustomRole => 4,
            Self::SuperAdmin => 100,
        }
    }

    /// Returns true for roles that belong to a B2B company.
    #[must_use]
    pub fn is_company_role(self) -> bool {
        matches!(
            self,
            Self::Admin | Self::SeniorBuyer | Self::JuniorBuyer | Self::CustomRole
        )
    }

    /// Returns true if this role may act on behalf of a company.
    #[must_use]
    pub fn can_masquerade(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

/// Error returned for a numeric role identifier outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRole(pub u8);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role id: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl TryFrom<u8> for Role {
    type Error = UnknownRole;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::B2C),
            1 => Ok(Self::Admin),
            2 => Ok(Self::SeniorBuyer),
            3 => Ok(Self::JuniorBuyer),
            4 => Ok(Self::CustomRole),
            100 => Ok(Self::SuperAdmin),
            other => Err(UnknownRole(other)),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.id()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::B2C => "b2c",
            Self::Admin => "admin",
            Self::SeniorBuyer => "senior_buyer",
            Self::JuniorBuyer => "junior_buyer",
            Self::CustomRole => "custom_role",
            Self::SuperAdmin => "super_admin",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_are_fixed() {
        assert_eq!(Role::B2C.id(), 0);
        assert_eq!(Role::Admin.id(), 1);
        assert_eq!(Role::SeniorBuyer.id(), 2);
        assert_eq!(Role::JuniorBuyer.id(), 3);
        assert_eq!(Role::CustomRole.id(), 4);
        assert_eq!(Role::SuperAdmin.id(), 100);
    }

    #[test]
    fn try_from_rejects_gaps() {
        assert_eq!(Role::try_from(5), Err(UnknownRole(5)));
        assert_eq!(Role::try_from(99), Err(UnknownRole(99)));
        assert_eq!(Role::try_from(100), Ok(Role::SuperAdmin));
    }

    #[test]
    fn super_admin_is_not_a_company_role() {
        assert!(!Role::SuperAdmin.is_company_role());
        assert!(!Role::B2C.is_company_role());
        assert!(Role::JuniorBuyer.is_company_role());
        assert!(Role::SuperAdmin.can_masquerade());
        assert!(!Role::Admin.can_masquerade());
    }

    #[test]
    fn role_serializes_as_number() {
        let json = serde_json::to_string(&Role::SeniorBuyer).expect("serialize");
        assert_eq!(json, "2");

        let parsed: Role = serde_json::from_str("100").expect("deserialize");
        assert_eq!(parsed, Role::SuperAdmin);

        assert!(serde_json::from_str::<Role>("7").is_err());
    }
}
