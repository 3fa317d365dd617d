//! End-to-end flow: permission check, audited mutation, audit queries.
//!
//! Exercises the full path a server action takes: resolve the request
//! context, ask the evaluator, perform the mutation through the audited
//! repository, and read the trail back through queries and stats.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use ledgerdesk_audit::{
    AuditAction, AuditEntity, AuditLogFilter, AuditTrail, InMemoryAuditStore, PageRequest,
};
use ledgerdesk_authz::{
    Action, Evaluator, Membership, NavItem, PermissionSet, Resource, RoleName, filter_nav,
};
use ledgerdesk_core::{RequestContext, TenantId, UserId, resolve_client_ip};
use ledgerdesk_infra::{
    Audited, EntityRecord, InMemoryCollection, InMemoryMembershipStore, MembershipAdmin,
    MembershipStore,
};

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: String,
    name: String,
    price: i64,
}

impl EntityRecord for Item {
    const ENTITY: AuditEntity = AuditEntity::Item;

    fn record_id(&self) -> String {
        self.id.clone()
    }

    fn display_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

struct World {
    evaluator: Evaluator<Arc<InMemoryMembershipStore>>,
    members: Arc<InMemoryMembershipStore>,
    audit: Arc<AuditTrail<InMemoryAuditStore>>,
    items: Audited<InMemoryCollection<Item>, InMemoryAuditStore>,
    tenant_id: TenantId,
    owner: UserId,
    member: UserId,
}

fn world() -> World {
    ledgerdesk_observability::init();

    let members = Arc::new(InMemoryMembershipStore::new());
    let audit = Arc::new(AuditTrail::new(InMemoryAuditStore::new()));
    let tenant_id = TenantId::new();
    let owner = UserId::new();
    let member = UserId::new();

    for (user_id, role) in [(owner, RoleName::Owner), (member, RoleName::Member)] {
        members.upsert(Membership {
            user_id,
            tenant_id,
            role,
            created_at: chrono::Utc::now(),
        });
    }

    World {
        evaluator: Evaluator::new(Arc::clone(&members)),
        members,
        items: Audited::new(InMemoryCollection::new(), Arc::clone(&audit)),
        audit,
        tenant_id,
        owner,
        member,
    }
}

fn perm(resource: Resource, actions: impl IntoIterator<Item = Action>) -> PermissionSet {
    PermissionSet::new().grant(resource, actions)
}

#[test]
fn guarded_mutation_lands_in_the_audit_trail() {
    let w = world();

    let ip = resolve_client_ip(Some("203.0.113.9, 10.0.0.8"), None, None);
    let ctx = RequestContext::authenticated(w.owner, w.tenant_id)
        .with_client(ip, Some("ledgerdesk-web/3.1".to_string()));

    // The server action checks before mutating.
    let can_write = w
        .evaluator
        .evaluate(w.owner, Some(w.tenant_id), &perm(Resource::Items, [Action::Create, Action::Update]))
        .unwrap();
    assert!(can_write);

    w.items
        .create(
            &ctx,
            Item {
                id: "42".to_string(),
                name: "Widget".to_string(),
                price: 50,
            },
        )
        .unwrap();
    w.items.update(&ctx, "42", &|item| item.price = 99).unwrap();

    let page = w
        .audit
        .get_audit_logs(w.tenant_id, &AuditLogFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.pagination.total, 2);

    let update = page
        .logs
        .iter()
        .find(|e| e.action == AuditAction::Update)
        .unwrap();
    let changes = update.changes.as_ref().unwrap();
    assert_eq!(changes["price"].from, json!(50));
    assert_eq!(changes["price"].to, json!(99));
    assert_eq!(update.metadata["ip"], json!("203.0.113.9"));
    assert_eq!(update.description, "Updated item: Widget");
}

#[test]
fn denied_member_never_reaches_the_repository() {
    let w = world();

    let allowed = w
        .evaluator
        .evaluate(w.member, Some(w.tenant_id), &perm(Resource::Items, [Action::Delete]))
        .unwrap();
    assert!(!allowed);

    // The caller stops on denial; nothing was mutated, nothing was logged.
    let page = w
        .audit
        .get_audit_logs(w.tenant_id, &AuditLogFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.pagination.total, 0);
}

#[test]
fn role_promotion_shows_up_in_stats_as_sensitive() {
    let w = world();
    let ctx = RequestContext::authenticated(w.owner, w.tenant_id);

    let admin = MembershipAdmin::new(Arc::clone(&w.members), Arc::clone(&w.audit));
    admin.change_role(&ctx, w.member, RoleName::Admin).unwrap();

    // The promoted member can now create items.
    assert!(
        w.evaluator
            .evaluate(w.member, Some(w.tenant_id), &perm(Resource::Items, [Action::Create]))
            .unwrap()
    );

    let stats = w.audit.get_audit_stats(w.tenant_id, 30).unwrap();
    assert_eq!(stats.total_actions, 1);
    assert_eq!(stats.by_action[&AuditAction::RoleChange], 1);
    assert_eq!(stats.sensitive_actions, 1);
    assert_eq!(stats.top_actors[0].user_id, w.owner);
}

#[test]
fn sidebar_reflects_the_member_role() {
    let w = world();

    let sidebar = vec![
        NavItem::leaf("Dashboard", Some(perm(Resource::Dashboard, [Action::Read]))),
        NavItem::group(
            "Sales",
            vec![
                NavItem::leaf("Invoices", Some(perm(Resource::Invoices, [Action::Read]))),
                NavItem::leaf(
                    "New invoice",
                    Some(perm(Resource::Invoices, [Action::Create])),
                ),
            ],
        ),
        NavItem::group(
            "Administration",
            vec![NavItem::leaf(
                "Settings",
                Some(perm(Resource::Settings, [Action::Update])),
            )],
        ),
    ];

    let filtered = filter_nav(&w.evaluator, &sidebar, w.member, Some(w.tenant_id)).unwrap();
    let labels: Vec<&str> = filtered.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["Dashboard", "Sales"]);
    assert_eq!(filtered[1].children.len(), 1);

    let filtered = filter_nav(&w.evaluator, &sidebar, w.owner, Some(w.tenant_id)).unwrap();
    assert_eq!(filtered.len(), 3);
}

#[test]
fn bulk_cleanup_is_one_ledger_row() {
    let w = world();
    let ctx = RequestContext::authenticated(w.owner, w.tenant_id);

    for i in 0..7 {
        w.items
            .create(
                &ctx,
                Item {
                    id: format!("stale-{i}"),
                    name: "Stale".to_string(),
                    price: 0,
                },
            )
            .unwrap();
    }

    let removed = w
        .items
        .delete_many(&ctx, &|item| item.price == 0, Some("stocktake".to_string()))
        .unwrap();
    assert_eq!(removed, 7);

    let filter = AuditLogFilter {
        action: Some(AuditAction::BulkOperation),
        ..Default::default()
    };
    let page = w
        .audit
        .get_audit_logs(w.tenant_id, &filter, PageRequest::default())
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.logs[0].metadata["count"], json!(7));
}
