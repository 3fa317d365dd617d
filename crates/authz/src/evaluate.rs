//! Permission evaluation.
//!
//! One grant check serves both entry points: `check_role_permission` for the
//! static path (role already known, e.g. pre-render UI decisions) and
//! `evaluate` for the dynamic path (role resolved through the membership
//! directory). There is no duplicated grant logic to drift between them.
//!
//! Failure semantics: missing membership or missing organization context
//! fail closed (`Ok(false)`); only a statement outside the registry raises,
//! to surface registry/code drift loudly.

use ledgerdesk_core::{TenantId, UserId};

use crate::membership::MembershipDirectory;
use crate::roles::{RoleName, RoleTable, personal_grants};
use crate::statements::{PermissionSet, StatementError, StatementRegistry};

/// Registry + role tables: the immutable policy loaded at startup.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    registry: StatementRegistry,
    roles: RoleTable,
    personal: PermissionSet,
}

impl AccessPolicy {
    pub fn builtin() -> Self {
        let registry = StatementRegistry::builtin();
        let roles = RoleTable::builtin(&registry);
        Self {
            personal: personal_grants(),
            registry,
            roles,
        }
    }

    pub fn registry(&self) -> &StatementRegistry {
        &self.registry
    }

    pub fn role_table(&self) -> &RoleTable {
        &self.roles
    }

    /// Static check against a named role, no membership lookup.
    pub fn check_role_permission(
        &self,
        role: RoleName,
        requested: &PermissionSet,
    ) -> Result<bool, StatementError> {
        self.registry.validate(requested)?;
        Ok(self.roles.grants(role).covers(requested))
    }

    /// Check against the personal allow-list (no organization context).
    pub fn check_personal(&self, requested: &PermissionSet) -> Result<bool, StatementError> {
        self.registry.validate(requested)?;
        Ok(self.personal.covers(requested))
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Dynamic evaluator: policy plus a membership directory.
#[derive(Debug)]
pub struct Evaluator<D> {
    policy: AccessPolicy,
    directory: D,
}

impl<D: MembershipDirectory> Evaluator<D> {
    pub fn new(directory: D) -> Self {
        Self {
            policy: AccessPolicy::builtin(),
            directory,
        }
    }

    pub fn with_policy(policy: AccessPolicy, directory: D) -> Self {
        Self { policy, directory }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// May `user_id`, in the given organization context, do `requested`?
    ///
    /// - No organization: only the personal allow-list can pass.
    /// - No membership in the organization: `Ok(false)` — a normal condition.
    /// - Statement outside the registry: raises, regardless of membership.
    pub fn evaluate(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        requested: &PermissionSet,
    ) -> Result<bool, StatementError> {
        let Some(tenant_id) = tenant_id else {
            return self.policy.check_personal(requested);
        };

        // Validate before the membership lookup so malformed requests raise
        // even for non-members.
        self.policy.registry.validate(requested)?;

        match self.directory.membership(tenant_id, user_id) {
            None => Ok(false),
            Some(membership) => Ok(self
                .policy
                .roles
                .grants(membership.role)
                .covers(requested)),
        }
    }

    /// OR combinator: true if any one set fully passes.
    ///
    /// Short-circuits on the first success to bound directory lookups.
    pub fn evaluate_any(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        sets: &[PermissionSet],
    ) -> Result<bool, StatementError> {
        for requested in sets {
            if self.evaluate(user_id, tenant_id, requested)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
