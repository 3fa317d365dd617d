//! Navigation pruning.
//!
//! A UI affordance only: items the user cannot reach are dropped from the
//! tree. Enforcement stays in the evaluator and the mutation paths — this
//! filter must never be the only gate in front of an operation.

use ledgerdesk_core::{TenantId, UserId};

use crate::evaluate::Evaluator;
use crate::membership::MembershipDirectory;
use crate::statements::{PermissionSet, StatementError};

/// One entry in the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: String,
    pub required: Option<PermissionSet>,
    pub children: Vec<NavItem>,
}

impl NavItem {
    pub fn leaf(label: impl Into<String>, required: Option<PermissionSet>) -> Self {
        Self {
            label: label.into(),
            required,
            children: Vec::new(),
        }
    }

    pub fn group(label: impl Into<String>, children: Vec<NavItem>) -> Self {
        Self {
            label: label.into(),
            required: None,
            children,
        }
    }
}

/// Prune `items` to the entries `user_id` may reach in `tenant_id`.
///
/// Children are filtered independently; a group whose children all vanish is
/// dropped, even if the group itself carries no permission.
pub fn filter_nav<D: MembershipDirectory>(
    evaluator: &Evaluator<D>,
    items: &[NavItem],
    user_id: UserId,
    tenant_id: Option<TenantId>,
) -> Result<Vec<NavItem>, StatementError> {
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        if let Some(required) = &item.required {
            if !evaluator.evaluate(user_id, tenant_id, required)? {
                continue;
            }
        }

        if item.children.is_empty() {
            kept.push(item.clone());
            continue;
        }

        let children = filter_nav(evaluator, &item.children, user_id, tenant_id)?;
        if children.is_empty() {
            continue;
        }
        kept.push(NavItem {
            label: item.label.clone(),
            required: item.required.clone(),
            children,
        });
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use ledgerdesk_core::{TenantId, UserId};

    use super::*;
    use crate::membership::{Membership, MembershipDirectory};
    use crate::roles::RoleName;
    use crate::statements::{Action, Resource};

    struct MapDirectory {
        members: Mutex<HashMap<(TenantId, UserId), RoleName>>,
    }

    impl MapDirectory {
        fn with(tenant_id: TenantId, user_id: UserId, role: RoleName) -> Self {
            let members = Mutex::new(HashMap::from([((tenant_id, user_id), role)]));
            Self { members }
        }
    }

    impl MembershipDirectory for MapDirectory {
        fn membership(&self, tenant_id: TenantId, user_id: UserId) -> Option<Membership> {
            let role = *self.members.lock().unwrap().get(&(tenant_id, user_id))?;
            Some(Membership {
                user_id,
                tenant_id,
                role,
                created_at: Utc::now(),
            })
        }
    }

    fn perm(resource: Resource, action: Action) -> Option<PermissionSet> {
        Some(PermissionSet::new().grant(resource, [action]))
    }

    fn sidebar() -> Vec<NavItem> {
        vec![
            NavItem::leaf("Dashboard", perm(Resource::Dashboard, Action::Read)),
            NavItem::leaf("Items", perm(Resource::Items, Action::Read)),
            NavItem::group(
                "Administration",
                vec![
                    NavItem::leaf("Members", perm(Resource::Members, Action::Read)),
                    NavItem::leaf("Settings", perm(Resource::Settings, Action::Update)),
                ],
            ),
        ]
    }

    #[test]
    fn member_loses_admin_group_entirely() {
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let evaluator = Evaluator::new(MapDirectory::with(tenant_id, user_id, RoleName::Member));

        let filtered = filter_nav(&evaluator, &sidebar(), user_id, Some(tenant_id)).unwrap();

        let labels: Vec<&str> = filtered.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Dashboard", "Items"]);
    }

    #[test]
    fn admin_keeps_group_with_surviving_children() {
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let evaluator = Evaluator::new(MapDirectory::with(tenant_id, user_id, RoleName::Admin));

        let filtered = filter_nav(&evaluator, &sidebar(), user_id, Some(tenant_id)).unwrap();

        let group = filtered.iter().find(|i| i.label == "Administration").unwrap();
        let children: Vec<&str> = group.children.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(children, vec!["Members", "Settings"]);
    }

    #[test]
    fn unrestricted_leaf_survives_any_role() {
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let evaluator = Evaluator::new(MapDirectory::with(tenant_id, user_id, RoleName::Member));

        let items = vec![NavItem::leaf("Help", None)];
        let filtered = filter_nav(&evaluator, &items, user_id, Some(tenant_id)).unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn malformed_item_permission_raises() {
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let evaluator = Evaluator::new(MapDirectory::with(tenant_id, user_id, RoleName::Owner));

        let items = vec![NavItem::leaf("Broken", perm(Resource::Dashboard, Action::Delete))];
        assert!(filter_nav(&evaluator, &items, user_id, Some(tenant_id)).is_err());
    }
}
