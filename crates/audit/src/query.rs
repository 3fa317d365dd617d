//! Query and aggregation types for the audit trail.
//!
//! All queries are tenant-scoped and paginated by default; page and limit
//! are clamped rather than rejected so a sloppy caller degrades gracefully.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerdesk_core::UserId;

use crate::entry::{AuditAction, AuditEntity, AuditLogEntry};

/// Hard cap on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Pagination parameters (1-based page).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }.clamped()
    }

    /// Clamp page to ≥ 1 and limit to `[1, MAX_PAGE_SIZE]`.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page.max(1) - 1) as usize) * (self.limit as usize)
    }
}

/// Filter criteria for log queries; all fields optional, ANDed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    pub user_id: Option<UserId>,
    pub entity: Option<AuditEntity>,
    pub action: Option<AuditAction>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditLogFilter {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if self.user_id.is_some_and(|user_id| entry.user_id != user_id) {
            return false;
        }
        if self.entity.is_some_and(|entity| entry.entity != entity) {
            return false;
        }
        if self.action.is_some_and(|action| entry.action != action) {
            return false;
        }
        if self.start_date.is_some_and(|start| entry.created_at < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| entry.created_at > end) {
            return false;
        }
        true
    }
}

/// Pagination metadata returned with every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_more: bool,
}

/// One page of audit log entries, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogPage {
    pub logs: Vec<AuditLogEntry>,
    pub pagination: PageInfo,
}

/// Action count for one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorActivity {
    pub user_id: UserId,
    pub count: u64,
}

/// Aggregate statistics over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_actions: u64,
    pub by_action: BTreeMap<AuditAction, u64>,
    /// Up to ten most active actors, by descending action count.
    pub top_actors: Vec<ActorActivity>,
    pub sensitive_actions: u64,
    /// Up to ten most recent entries in the window.
    pub recent: Vec<AuditLogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_both_bounds() {
        let page = PageRequest::new(0, 1000);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);

        let page = PageRequest::new(3, 0);
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn offset_is_zero_based_from_page_one() {
        assert_eq!(PageRequest::new(1, 25).offset(), 0);
        assert_eq!(PageRequest::new(4, 25).offset(), 75);
    }
}
