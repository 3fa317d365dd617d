//! Audit log persistence contract and the in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use ledgerdesk_core::TenantId;

use crate::entry::AuditLogEntry;
use crate::query::AuditLogFilter;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditStoreError {
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Append-only, tenant-scoped persistence for audit log entries.
///
/// `delete_older_than` exists solely for the retention purge; nothing else
/// mutates an entry once appended.
pub trait AuditStore: Send + Sync {
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError>;

    /// Return one page of matching entries (newest first) plus the total
    /// match count across all pages.
    fn query(
        &self,
        tenant_id: TenantId,
        filter: &AuditLogFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditStoreError>;

    /// All entries with `from <= created_at <= to`, unordered.
    fn window(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError>;

    /// Hard-delete entries older than `cutoff`; returns the count removed.
    fn delete_older_than(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AuditStoreError>;
}

impl<S> AuditStore for std::sync::Arc<S>
where
    S: AuditStore + ?Sized,
{
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        (**self).append(entry)
    }

    fn query(
        &self,
        tenant_id: TenantId,
        filter: &AuditLogFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditStoreError> {
        (**self).query(tenant_id, filter, offset, limit)
    }

    fn window(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        (**self).window(tenant_id, from, to)
    }

    fn delete_older_than(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AuditStoreError> {
        (**self).delete_older_than(tenant_id, cutoff)
    }
}

/// In-memory, tenant-partitioned audit store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<HashMap<TenantId, Vec<AuditLogEntry>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditStoreError::Storage("lock poisoned".to_string()))?;

        entries.entry(entry.tenant_id).or_default().push(entry);
        Ok(())
    }

    fn query(
        &self,
        tenant_id: TenantId,
        filter: &AuditLogFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditStoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditStoreError::Storage("lock poisoned".to_string()))?;

        let mut matches: Vec<&AuditLogEntry> = entries
            .get(&tenant_id)
            .map(|rows| rows.iter().filter(|e| filter.matches(e)).collect())
            .unwrap_or_default();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.as_uuid().cmp(a.id.as_uuid())));

        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    fn window(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditStoreError::Storage("lock poisoned".to_string()))?;

        Ok(entries
            .get(&tenant_id)
            .map(|rows| {
                rows.iter()
                    .filter(|e| e.created_at >= from && e.created_at <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete_older_than(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AuditStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditStoreError::Storage("lock poisoned".to_string()))?;

        let Some(rows) = entries.get_mut(&tenant_id) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|e| e.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}
