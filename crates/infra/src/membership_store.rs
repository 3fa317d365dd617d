//! Membership persistence.
//!
//! The read side implements `ledgerdesk-authz`'s [`MembershipDirectory`]
//! contract; the write side adds the lifecycle operations (join, leave,
//! promote/demote) used by [`crate::MembershipAdmin`].

use std::collections::HashMap;
use std::sync::RwLock;

use ledgerdesk_authz::{Membership, MembershipDirectory};
use ledgerdesk_core::{TenantId, UserId};

/// Write contract for membership storage.
pub trait MembershipStore: MembershipDirectory {
    fn upsert(&self, membership: Membership);

    fn remove(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership>;

    fn list(&self, tenant_id: TenantId) -> Vec<Membership>;

    /// Drop every membership of a tenant (organization deletion support —
    /// a membership cannot outlive its organization).
    fn clear_tenant(&self, tenant_id: TenantId);
}

impl<S> MembershipStore for std::sync::Arc<S>
where
    S: MembershipStore + ?Sized,
{
    fn upsert(&self, membership: Membership) {
        (**self).upsert(membership)
    }

    fn remove(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership> {
        (**self).remove(tenant_id, user_id)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Membership> {
        (**self).list(tenant_id)
    }

    fn clear_tenant(&self, tenant_id: TenantId) {
        (**self).clear_tenant(tenant_id)
    }
}

/// In-memory tenant-isolated membership store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    inner: RwLock<HashMap<(TenantId, UserId), Membership>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MembershipDirectory for InMemoryMembershipStore {
    fn membership(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership> {
        let map = self.inner.read().ok()?;
        map.get(&(tenant_id, user_id)).cloned()
    }
}

impl MembershipStore for InMemoryMembershipStore {
    fn upsert(&self, membership: Membership) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((membership.tenant_id, membership.user_id), membership);
        }
    }

    fn remove(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership> {
        let mut map = self.inner.write().ok()?;
        map.remove(&(tenant_id, user_id))
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Membership> {
        let map = match self.inner.read() {
            Ok(map) => map,
            Err(_) => return Vec::new(),
        };

        let mut members: Vec<Membership> = map
            .iter()
            .filter_map(|((t, _), m)| (*t == tenant_id).then(|| m.clone()))
            .collect();
        members.sort_by(|a, b| a.user_id.as_uuid().cmp(b.user_id.as_uuid()));
        members
    }

    fn clear_tenant(&self, tenant_id: TenantId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(t, _), _| *t != tenant_id);
        }
    }
}
