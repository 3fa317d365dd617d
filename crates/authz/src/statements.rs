//! Statement registry: the closed universe of checkable permissions.
//!
//! Resources and actions are closed enums rather than opaque strings so that
//! grant tables and permission checks cannot drift apart silently; a request
//! naming a statement outside the registry is a programmer error, not a
//! denial.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An action definable on a resource.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protected resource.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Dashboard,
    Profile,
    Items,
    Customers,
    Suppliers,
    Invoices,
    Payments,
    Members,
    Roles,
    Organization,
    Settings,
    Reports,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Resource::Dashboard,
        Resource::Profile,
        Resource::Items,
        Resource::Customers,
        Resource::Suppliers,
        Resource::Invoices,
        Resource::Payments,
        Resource::Members,
        Resource::Roles,
        Resource::Organization,
        Resource::Settings,
        Resource::Reports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Dashboard => "dashboard",
            Resource::Profile => "profile",
            Resource::Items => "items",
            Resource::Customers => "customers",
            Resource::Suppliers => "suppliers",
            Resource::Invoices => "invoices",
            Resource::Payments => "payments",
            Resource::Members => "members",
            Resource::Roles => "roles",
            Resource::Organization => "organization",
            Resource::Settings => "settings",
            Resource::Reports => "reports",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement validation error.
///
/// Raised for registry/code drift only; a permission that exists but is not
/// granted is a plain denial, never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("unknown statement: {resource}:{action}")]
    UnknownStatement { resource: Resource, action: Action },
}

/// A set of `(resource, actions)` grants.
///
/// Used for role grant tables and for requested permission sets alike; a
/// request passes against a grant table iff every requested pair is covered
/// (AND semantics, no partial success).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    grants: BTreeMap<Resource, BTreeSet<Action>>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style grant of `actions` on `resource`.
    pub fn grant(mut self, resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        self.grants.entry(resource).or_default().extend(actions);
        self
    }

    pub fn insert(&mut self, resource: Resource, action: Action) {
        self.grants.entry(resource).or_default().insert(action);
    }

    /// Absorb every grant of `other`.
    pub fn merge(&mut self, other: &PermissionSet) {
        for (resource, actions) in &other.grants {
            self.grants
                .entry(*resource)
                .or_default()
                .extend(actions.iter().copied());
        }
    }

    /// True iff every `(resource, action)` pair of `requested` is granted here.
    pub fn covers(&self, requested: &PermissionSet) -> bool {
        requested.grants.iter().all(|(resource, actions)| {
            self.grants
                .get(resource)
                .is_some_and(|granted| actions.is_subset(granted))
        })
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.grants
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    pub fn is_empty(&self) -> bool {
        self.grants.values().all(BTreeSet::is_empty)
    }

    /// Iterate all granted `(resource, action)` pairs in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, Action)> + '_ {
        self.grants
            .iter()
            .flat_map(|(resource, actions)| actions.iter().map(move |action| (*resource, *action)))
    }
}

impl FromIterator<(Resource, Action)> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = (Resource, Action)>>(iter: I) -> Self {
        let mut set = PermissionSet::new();
        for (resource, action) in iter {
            set.insert(resource, action);
        }
        set
    }
}

/// The total universe of checkable statements.
///
/// Built once at process start and read-only thereafter. Every grant table
/// and every evaluator request must validate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRegistry {
    statements: BTreeMap<Resource, BTreeSet<Action>>,
}

impl StatementRegistry {
    /// The built-in registry for this deployment.
    pub fn builtin() -> Self {
        use Action::*;

        let mut statements: BTreeMap<Resource, BTreeSet<Action>> = BTreeMap::new();
        let mut declare = |resource: Resource, actions: &[Action]| {
            statements.insert(resource, actions.iter().copied().collect());
        };

        declare(Resource::Dashboard, &[Read]);
        declare(Resource::Profile, &[Read, Update]);
        declare(Resource::Items, &[Create, Read, Update, Delete]);
        declare(Resource::Customers, &[Create, Read, Update, Delete]);
        declare(Resource::Suppliers, &[Create, Read, Update, Delete]);
        declare(Resource::Invoices, &[Create, Read, Update, Delete]);
        declare(Resource::Payments, &[Create, Read, Update, Delete]);
        declare(Resource::Members, &[Create, Read, Update, Delete]);
        declare(Resource::Roles, &[Read, Update]);
        declare(Resource::Organization, &[Read, Update, Delete]);
        declare(Resource::Settings, &[Read, Update]);
        declare(Resource::Reports, &[Read]);

        Self { statements }
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.statements
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Reject any pair of `requested` that falls outside the registry.
    pub fn validate(&self, requested: &PermissionSet) -> Result<(), StatementError> {
        for (resource, action) in requested.iter() {
            if !self.allows(resource, action) {
                return Err(StatementError::UnknownStatement { resource, action });
            }
        }
        Ok(())
    }

    /// The full registry as a permission set (the `owner` grant table).
    pub fn all(&self) -> PermissionSet {
        PermissionSet {
            grants: self.statements.clone(),
        }
    }

    /// Iterate every declared `(resource, action)` statement.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, Action)> + '_ {
        self.statements
            .iter()
            .flat_map(|(resource, actions)| actions.iter().map(move |action| (*resource, *action)))
    }
}
