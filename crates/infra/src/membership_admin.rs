//! Membership administration.
//!
//! Grant, revoke, and change organization roles, with privilege-escalation
//! checks and audit emission. The acting user must themselves be a member of
//! the organization; managing members requires at least `admin`, and nobody
//! may grant (or touch) a role above their own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use ledgerdesk_audit::{AuditAction, AuditEntity, AuditStore, AuditTrail, EventDetails};
use ledgerdesk_authz::{Membership, RoleName};
use ledgerdesk_core::{DomainError, DomainResult, RequestContext, TenantId, UserId};

use crate::membership_store::MembershipStore;

/// Membership lifecycle service over a store, with audit.
pub struct MembershipAdmin<M, S> {
    members: M,
    audit: Arc<AuditTrail<S>>,
}

impl<M: MembershipStore, S: AuditStore> MembershipAdmin<M, S> {
    pub fn new(members: M, audit: Arc<AuditTrail<S>>) -> Self {
        Self { members, audit }
    }

    pub fn members(&self) -> &M {
        &self.members
    }

    fn actor(&self, ctx: &RequestContext) -> DomainResult<(TenantId, RoleName)> {
        let (Some(actor_id), Some(tenant_id)) = (ctx.user_id, ctx.tenant_id) else {
            return Err(DomainError::Unauthorized);
        };
        let membership = self
            .members
            .membership(tenant_id, actor_id)
            .ok_or(DomainError::Unauthorized)?;
        Ok((tenant_id, membership.role))
    }

    /// Grant `user_id` a membership in the context's organization.
    ///
    /// The actor must be at least admin and must not grant above their own
    /// role.
    pub fn add_member(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        role: RoleName,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Membership> {
        let (tenant_id, actor_role) = self.actor(ctx)?;

        if !actor_role.at_least(RoleName::Admin) || !actor_role.at_least(role) {
            return Err(DomainError::Unauthorized);
        }
        if self.members.membership(tenant_id, user_id).is_some() {
            return Err(DomainError::conflict("user is already a member"));
        }

        let membership = Membership {
            user_id,
            tenant_id,
            role,
            created_at: occurred_at,
        };
        self.members.upsert(membership.clone());

        self.audit.log_event(
            ctx,
            AuditAction::PermissionChange,
            AuditEntity::User,
            &user_id.to_string(),
            EventDetails {
                new_values: Some(json!({ "role": role.as_str() })),
                metadata: Some(json!({ "operation": "member_added" })),
                ..Default::default()
            },
        );

        Ok(membership)
    }

    /// Revoke `user_id`'s membership in the context's organization.
    pub fn remove_member(&self, ctx: &RequestContext, user_id: UserId) -> DomainResult<Membership> {
        let (tenant_id, actor_role) = self.actor(ctx)?;

        let target = self
            .members
            .membership(tenant_id, user_id)
            .ok_or(DomainError::NotFound)?;
        if !actor_role.at_least(RoleName::Admin) || !actor_role.at_least(target.role) {
            return Err(DomainError::Unauthorized);
        }

        let removed = self
            .members
            .remove(tenant_id, user_id)
            .ok_or(DomainError::NotFound)?;

        self.audit.log_event(
            ctx,
            AuditAction::PermissionChange,
            AuditEntity::User,
            &user_id.to_string(),
            EventDetails {
                old_values: Some(json!({ "role": removed.role.as_str() })),
                metadata: Some(json!({ "operation": "member_removed" })),
                ..Default::default()
            },
        );

        Ok(removed)
    }

    /// Promote or demote `user_id` within the context's organization.
    ///
    /// The actor must outrank-or-equal both the target's current role and
    /// the new role.
    pub fn change_role(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        new_role: RoleName,
    ) -> DomainResult<Membership> {
        let (tenant_id, actor_role) = self.actor(ctx)?;

        let target = self
            .members
            .membership(tenant_id, user_id)
            .ok_or(DomainError::NotFound)?;
        if !actor_role.at_least(RoleName::Admin)
            || !actor_role.at_least(target.role)
            || !actor_role.at_least(new_role)
        {
            return Err(DomainError::Unauthorized);
        }
        if target.role == new_role {
            return Err(DomainError::invariant("role already assigned"));
        }

        let updated = Membership {
            role: new_role,
            ..target.clone()
        };
        self.members.upsert(updated.clone());

        self.audit.log_event(
            ctx,
            AuditAction::RoleChange,
            AuditEntity::User,
            &user_id.to_string(),
            EventDetails {
                old_values: Some(json!({ "role": target.role.as_str() })),
                new_values: Some(json!({ "role": new_role.as_str() })),
                ..Default::default()
            },
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use ledgerdesk_audit::{AuditLogFilter, InMemoryAuditStore, PageRequest};
    use ledgerdesk_authz::MembershipDirectory;

    use super::*;
    use crate::membership_store::InMemoryMembershipStore;

    struct Fixture {
        admin: MembershipAdmin<InMemoryMembershipStore, InMemoryAuditStore>,
        audit: Arc<AuditTrail<InMemoryAuditStore>>,
        tenant_id: TenantId,
    }

    fn fixture_with(actor_role: RoleName) -> (Fixture, RequestContext) {
        let audit = Arc::new(AuditTrail::new(InMemoryAuditStore::new()));
        let members = InMemoryMembershipStore::new();
        let tenant_id = TenantId::new();
        let actor_id = UserId::new();

        members.upsert(Membership {
            user_id: actor_id,
            tenant_id,
            role: actor_role,
            created_at: Utc::now(),
        });

        let fixture = Fixture {
            admin: MembershipAdmin::new(members, Arc::clone(&audit)),
            audit,
            tenant_id,
        };
        let ctx = RequestContext::authenticated(actor_id, tenant_id);
        (fixture, ctx)
    }

    #[test]
    fn admin_can_add_members_at_or_below_their_rank() {
        let (f, ctx) = fixture_with(RoleName::Admin);
        let user_id = UserId::new();

        let membership = f
            .admin
            .add_member(&ctx, user_id, RoleName::Member, Utc::now())
            .unwrap();
        assert_eq!(membership.role, RoleName::Member);
        assert!(f.admin.members().membership(f.tenant_id, user_id).is_some());
    }

    #[test]
    fn admin_cannot_grant_owner() {
        let (f, ctx) = fixture_with(RoleName::Admin);

        let err = f
            .admin
            .add_member(&ctx, UserId::new(), RoleName::Owner, Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    #[test]
    fn member_cannot_manage_members() {
        let (f, ctx) = fixture_with(RoleName::Member);

        let err = f
            .admin
            .add_member(&ctx, UserId::new(), RoleName::Member, Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    #[test]
    fn non_member_actor_is_unauthorized() {
        let (f, _) = fixture_with(RoleName::Owner);
        let outsider = RequestContext::authenticated(UserId::new(), f.tenant_id);

        let err = f
            .admin
            .add_member(&outsider, UserId::new(), RoleName::Member, Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    #[test]
    fn duplicate_membership_conflicts() {
        let (f, ctx) = fixture_with(RoleName::Owner);
        let user_id = UserId::new();

        f.admin.add_member(&ctx, user_id, RoleName::Member, Utc::now()).unwrap();
        let err = f
            .admin
            .add_member(&ctx, user_id, RoleName::Admin, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn change_role_logs_the_role_diff() {
        let (f, ctx) = fixture_with(RoleName::Owner);
        let user_id = UserId::new();

        f.admin.add_member(&ctx, user_id, RoleName::Member, Utc::now()).unwrap();
        let updated = f.admin.change_role(&ctx, user_id, RoleName::Admin).unwrap();
        assert_eq!(updated.role, RoleName::Admin);

        let logs = f
            .audit
            .get_audit_logs(f.tenant_id, &AuditLogFilter::default(), PageRequest::default())
            .unwrap()
            .logs;

        let role_change = logs
            .iter()
            .find(|e| e.action == AuditAction::RoleChange)
            .unwrap();
        let changes = role_change.changes.as_ref().unwrap();
        assert_eq!(changes["role"].from, json!("member"));
        assert_eq!(changes["role"].to, json!("admin"));
        assert_eq!(role_change.description, "Changed role on user");
    }

    #[test]
    fn admin_cannot_demote_the_owner() {
        let (f, ctx) = fixture_with(RoleName::Owner);
        let owner_id = UserId::new();
        f.admin.add_member(&ctx, owner_id, RoleName::Owner, Utc::now()).unwrap();

        // A second actor with admin rank may not touch the owner.
        let admin_id = UserId::new();
        f.admin.add_member(&ctx, admin_id, RoleName::Admin, Utc::now()).unwrap();
        let admin_ctx = RequestContext::authenticated(admin_id, f.tenant_id);

        let err = f
            .admin
            .change_role(&admin_ctx, owner_id, RoleName::Member)
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        let err = f.admin.remove_member(&admin_ctx, owner_id).unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    #[test]
    fn unchanged_role_is_an_invariant_violation() {
        let (f, ctx) = fixture_with(RoleName::Owner);
        let user_id = UserId::new();
        f.admin.add_member(&ctx, user_id, RoleName::Member, Utc::now()).unwrap();

        let err = f.admin.change_role(&ctx, user_id, RoleName::Member).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn removal_is_audited_as_permission_change() {
        let (f, ctx) = fixture_with(RoleName::Owner);
        let user_id = UserId::new();
        f.admin.add_member(&ctx, user_id, RoleName::Member, Utc::now()).unwrap();
        f.admin.remove_member(&ctx, user_id).unwrap();

        let logs = f
            .audit
            .get_audit_logs(f.tenant_id, &AuditLogFilter::default(), PageRequest::default())
            .unwrap()
            .logs;

        let permission_changes: Vec<_> = logs
            .iter()
            .filter(|e| e.action == AuditAction::PermissionChange)
            .collect();
        assert_eq!(permission_changes.len(), 2);
        assert!(f.admin.members().membership(f.tenant_id, user_id).is_none());
    }
}
