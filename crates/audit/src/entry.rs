//! Audit log entry model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ledgerdesk_core::{AuditLogId, TenantId, UserId};

/// What happened.
///
/// Closed enum; extending it means redeploying the service.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Read,
    Login,
    Logout,
    PermissionChange,
    RoleChange,
    BulkOperation,
}

impl AuditAction {
    pub const ALL: [AuditAction; 9] = [
        AuditAction::Create,
        AuditAction::Update,
        AuditAction::Delete,
        AuditAction::Read,
        AuditAction::Login,
        AuditAction::Logout,
        AuditAction::PermissionChange,
        AuditAction::RoleChange,
        AuditAction::BulkOperation,
    ];

    /// Wire/storage name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Read => "READ",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::PermissionChange => "PERMISSION_CHANGE",
            AuditAction::RoleChange => "ROLE_CHANGE",
            AuditAction::BulkOperation => "BULK_OPERATION",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of entity was affected.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntity {
    User,
    Role,
    Customer,
    Supplier,
    Item,
    Invoice,
    Payment,
    Organization,
    Settings,
}

impl AuditEntity {
    pub const ALL: [AuditEntity; 9] = [
        AuditEntity::User,
        AuditEntity::Role,
        AuditEntity::Customer,
        AuditEntity::Supplier,
        AuditEntity::Item,
        AuditEntity::Invoice,
        AuditEntity::Payment,
        AuditEntity::Organization,
        AuditEntity::Settings,
    ];

    /// Wire/storage name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntity::User => "USER",
            AuditEntity::Role => "ROLE",
            AuditEntity::Customer => "CUSTOMER",
            AuditEntity::Supplier => "SUPPLIER",
            AuditEntity::Item => "ITEM",
            AuditEntity::Invoice => "INVOICE",
            AuditEntity::Payment => "PAYMENT",
            AuditEntity::Organization => "ORGANIZATION",
            AuditEntity::Settings => "SETTINGS",
        }
    }

    /// Human-readable label for generated descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            AuditEntity::User => "user",
            AuditEntity::Role => "role",
            AuditEntity::Customer => "customer",
            AuditEntity::Supplier => "supplier",
            AuditEntity::Item => "item",
            AuditEntity::Invoice => "invoice",
            AuditEntity::Payment => "payment",
            AuditEntity::Organization => "organization",
            AuditEntity::Settings => "settings",
        }
    }
}

impl core::fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Before/after values of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// One immutable row in the audit ledger.
///
/// There is no update path; the retention purge is the only sanctioned
/// deletion. `entity_id` is a weak reference — the entity it names may be
/// deleted later, and the audit history must outlive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub entity_id: String,
    /// Minimal field-level diff; `None` when no both-sides snapshot pair was
    /// supplied or nothing (non-redacted) changed.
    pub changes: Option<BTreeMap<String, FieldChange>>,
    pub description: String,
    pub metadata: serde_json::Map<String, Value>,
    pub created_at: DateTime<Utc>,
}
