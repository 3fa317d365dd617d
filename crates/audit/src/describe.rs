//! Generated descriptions and sensitivity flagging.

use crate::entry::{AuditAction, AuditEntity};

/// Render a human-readable description for an event.
///
/// Fixed template per action, with the entity's display name appended when
/// the caller supplied one; unmapped combinations fall back to the generic
/// `"{ACTION} {entity}"` form.
pub fn describe(action: AuditAction, entity: AuditEntity, name: Option<&str>) -> String {
    let with_name = |verb: &str| match name {
        Some(name) => format!("{verb} {entity}: {name}"),
        None => format!("{verb} {entity}"),
    };

    match action {
        AuditAction::Create => with_name("Created"),
        AuditAction::Update => with_name("Updated"),
        AuditAction::Delete => with_name("Deleted"),
        AuditAction::Login => "User logged in".to_string(),
        AuditAction::Logout => "User logged out".to_string(),
        AuditAction::PermissionChange => with_name("Changed permissions on"),
        AuditAction::RoleChange => with_name("Changed role on"),
        AuditAction::BulkOperation => format!("Bulk operation on {entity} records"),
        AuditAction::Read => format!("{} {entity}", action.as_str()),
    }
}

/// Should this event also be surfaced on the elevated operational stream?
///
/// Deletions, permission changes, role changes, and any action against the
/// security-relevant entities are flagged.
pub fn is_sensitive(action: AuditAction, entity: AuditEntity) -> bool {
    matches!(
        action,
        AuditAction::Delete | AuditAction::PermissionChange | AuditAction::RoleChange
    ) || matches!(
        entity,
        AuditEntity::User | AuditEntity::Role | AuditEntity::Organization | AuditEntity::Settings
    )
}
