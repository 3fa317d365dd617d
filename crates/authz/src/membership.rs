//! Organization membership: the binding of one user to one tenant with
//! exactly one role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerdesk_core::{TenantId, UserId};

use crate::roles::RoleName;

/// A user's membership in one organization.
///
/// A user may hold zero or many memberships (one per organization). Only the
/// `role` field ever changes after creation (promotion/demotion); a
/// membership is owned by its organization and cannot outlive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: RoleName,
    pub created_at: DateTime<Utc>,
}

/// Read contract for resolving memberships.
///
/// Absence of a membership is a normal, expected condition — implementations
/// return `None`, never an error, for a user who does not belong to the
/// tenant.
pub trait MembershipDirectory: Send + Sync {
    fn membership(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership>;
}

impl<D> MembershipDirectory for std::sync::Arc<D>
where
    D: MembershipDirectory + ?Sized,
{
    fn membership(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership> {
        (**self).membership(tenant_id, user_id)
    }
}
