//! Built-in role definitions and their grant tables.
//!
//! The three roles form a non-strict ordering (`member < admin < owner`);
//! every shared resource grant of a lower role is held by the higher ones.
//! Grant tables are created once at startup and read-only thereafter;
//! tenant-level custom roles are a documented extension point, not
//! implemented here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::statements::{Action, PermissionSet, Resource, StatementRegistry};

/// Name of a built-in organization role.
///
/// Derived ordering is the role hierarchy: `Member < Admin < Owner`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Member,
    Admin,
    Owner,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl RoleName {
    pub const ALL: [RoleName; 3] = [RoleName::Member, RoleName::Admin, RoleName::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Member => "member",
            RoleName::Admin => "admin",
            RoleName::Owner => "owner",
        }
    }

    /// Fast static hierarchy check: does this role sit at or above `other`?
    pub fn at_least(&self, other: RoleName) -> bool {
        *self >= other
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RoleName {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(RoleName::Member),
            "admin" => Ok(RoleName::Admin),
            "owner" => Ok(RoleName::Owner),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The fixed allow-list for users acting outside any organization.
pub fn personal_grants() -> PermissionSet {
    PermissionSet::new()
        .grant(Resource::Dashboard, [Action::Read])
        .grant(Resource::Profile, [Action::Read, Action::Update])
}

/// One grant table per built-in role.
///
/// This is the single source of truth consumed by both the static and the
/// dynamic evaluation paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    member: PermissionSet,
    admin: PermissionSet,
    owner: PermissionSet,
}

impl RoleTable {
    /// Build the built-in grant tables against `registry`.
    ///
    /// `owner` is the entire registry by construction, which makes the
    /// hierarchy invariant structural at the top; `admin` extends `member`.
    pub fn builtin(registry: &StatementRegistry) -> Self {
        use Action::*;

        let member = personal_grants()
            .grant(Resource::Items, [Read])
            .grant(Resource::Customers, [Read])
            .grant(Resource::Suppliers, [Read])
            .grant(Resource::Invoices, [Read])
            .grant(Resource::Payments, [Read])
            .grant(Resource::Reports, [Read]);

        let admin = member
            .clone()
            .grant(Resource::Items, [Create, Update])
            .grant(Resource::Customers, [Create, Update])
            .grant(Resource::Suppliers, [Create, Update])
            .grant(Resource::Invoices, [Create, Update])
            .grant(Resource::Payments, [Create, Update])
            .grant(Resource::Members, [Create, Read, Update])
            .grant(Resource::Roles, [Read])
            .grant(Resource::Organization, [Read])
            .grant(Resource::Settings, [Read, Update]);

        Self {
            member,
            admin,
            owner: registry.all(),
        }
    }

    pub fn grants(&self, role: RoleName) -> &PermissionSet {
        match role {
            RoleName::Member => &self.member,
            RoleName::Admin => &self.admin,
            RoleName::Owner => &self.owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_ordered() {
        assert!(RoleName::Owner.at_least(RoleName::Admin));
        assert!(RoleName::Admin.at_least(RoleName::Member));
        assert!(RoleName::Owner.at_least(RoleName::Owner));
        assert!(!RoleName::Member.at_least(RoleName::Admin));
    }

    #[test]
    fn role_names_round_trip() {
        for role in RoleName::ALL {
            assert_eq!(role.as_str().parse::<RoleName>().unwrap(), role);
        }
        assert!("superuser".parse::<RoleName>().is_err());
    }

    /// owner ⊇ admin ⊇ member, statement by statement.
    #[test]
    fn higher_roles_cover_lower_roles() {
        let registry = StatementRegistry::builtin();
        let table = RoleTable::builtin(&registry);

        assert!(table.grants(RoleName::Owner).covers(table.grants(RoleName::Admin)));
        assert!(table.grants(RoleName::Admin).covers(table.grants(RoleName::Member)));
    }

    #[test]
    fn owner_covers_entire_registry() {
        let registry = StatementRegistry::builtin();
        let table = RoleTable::builtin(&registry);

        for (resource, action) in registry.iter() {
            assert!(
                table.grants(RoleName::Owner).allows(resource, action),
                "owner is missing {resource}:{action}"
            );
        }
    }

    #[test]
    fn every_grant_table_validates_against_registry() {
        let registry = StatementRegistry::builtin();
        let table = RoleTable::builtin(&registry);

        for role in RoleName::ALL {
            registry
                .validate(table.grants(role))
                .unwrap_or_else(|e| panic!("{role} grant table drifted: {e}"));
        }
        registry.validate(&personal_grants()).unwrap();
    }

    #[test]
    fn member_cannot_delete_items() {
        let registry = StatementRegistry::builtin();
        let table = RoleTable::builtin(&registry);

        assert!(table.grants(RoleName::Member).allows(Resource::Items, Action::Read));
        assert!(!table.grants(RoleName::Member).allows(Resource::Items, Action::Delete));
        assert!(table.grants(RoleName::Owner).allows(Resource::Items, Action::Delete));
    }
}
