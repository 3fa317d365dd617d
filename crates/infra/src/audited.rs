//! Auditable repository decorator.
//!
//! Wraps a [`Collection`] so that every mutation emits a proportionate audit
//! event after it resolves. The mutation result (or error) is returned to
//! the caller unchanged; the audit call runs strictly afterwards and can
//! never block or reverse it. Reads pass through unaudited.

use std::sync::Arc;

use serde_json::{Value, json};

use ledgerdesk_audit::{AuditAction, AuditStore, AuditTrail, EventDetails};
use ledgerdesk_core::{DomainResult, RequestContext};

use crate::collection::{Collection, EntityRecord};

/// A collection decorated with audit logging.
pub struct Audited<C, S> {
    inner: C,
    audit: Arc<AuditTrail<S>>,
}

impl<C, S> Audited<C, S> {
    pub fn new(inner: C, audit: Arc<AuditTrail<S>>) -> Self {
        Self { inner, audit }
    }

    /// The undecorated collection.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

fn snapshot<T: EntityRecord>(record: &T) -> Option<Value> {
    serde_json::to_value(record).ok()
}

fn name_metadata<T: EntityRecord>(record: &T) -> Option<Value> {
    record.display_name().map(|name| json!({ "name": name }))
}

impl<C: Collection, S: AuditStore> Audited<C, S> {
    // Only mutations and authentication events enter the ledger; reads
    // pass through untouched.

    pub fn find_unique(&self, id: &str) -> Option<C::Record> {
        self.inner.find_unique(id)
    }

    pub fn find_first(&self, predicate: &dyn Fn(&C::Record) -> bool) -> Option<C::Record> {
        self.inner.find_first(predicate)
    }

    pub fn find_many(&self, predicate: &dyn Fn(&C::Record) -> bool) -> Vec<C::Record> {
        self.inner.find_many(predicate)
    }

    /// Insert, then log `CREATE` with the created record as `new_values`.
    pub fn create(&self, ctx: &RequestContext, record: C::Record) -> DomainResult<C::Record> {
        let created = self.inner.insert(record)?;

        self.audit.log_event(
            ctx,
            AuditAction::Create,
            C::Record::ENTITY,
            &created.record_id(),
            EventDetails {
                new_values: snapshot(&created),
                metadata: name_metadata(&created),
                ..Default::default()
            },
        );

        Ok(created)
    }

    /// Update, then log `UPDATE` with before/after snapshots.
    ///
    /// The pre-image read is best-effort: if the record cannot be found
    /// beforehand, `old_values` is omitted rather than failing the update.
    pub fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        apply: &dyn Fn(&mut C::Record),
    ) -> DomainResult<C::Record> {
        let before = self.inner.find_unique(id);
        let updated = self.inner.update(id, apply)?;

        self.audit.log_event(
            ctx,
            AuditAction::Update,
            C::Record::ENTITY,
            id,
            EventDetails {
                old_values: before.as_ref().and_then(snapshot),
                new_values: snapshot(&updated),
                metadata: name_metadata(&updated),
                ..Default::default()
            },
        );

        Ok(updated)
    }

    /// Delete, then log `DELETE` with the pre-image as `old_values`.
    pub fn delete(&self, ctx: &RequestContext, id: &str) -> DomainResult<C::Record> {
        let removed = self.inner.remove(id)?;

        self.audit.log_event(
            ctx,
            AuditAction::Delete,
            C::Record::ENTITY,
            id,
            EventDetails {
                old_values: snapshot(&removed),
                metadata: name_metadata(&removed),
                ..Default::default()
            },
        );

        Ok(removed)
    }

    /// Bulk update: one `BULK_OPERATION` entry carrying only the affected
    /// count and an optional reason, never per-row detail.
    pub fn update_many(
        &self,
        ctx: &RequestContext,
        predicate: &dyn Fn(&C::Record) -> bool,
        apply: &dyn Fn(&mut C::Record),
        reason: Option<String>,
    ) -> DomainResult<u64> {
        let affected = self.inner.update_many(predicate, apply)?;
        self.log_bulk(ctx, affected, reason);
        Ok(affected)
    }

    /// Bulk delete: one `BULK_OPERATION` entry, as for `update_many`.
    pub fn delete_many(
        &self,
        ctx: &RequestContext,
        predicate: &dyn Fn(&C::Record) -> bool,
        reason: Option<String>,
    ) -> DomainResult<u64> {
        let affected = self.inner.remove_many(predicate)?;
        self.log_bulk(ctx, affected, reason);
        Ok(affected)
    }

    fn log_bulk(&self, ctx: &RequestContext, affected: u64, reason: Option<String>) {
        self.audit.log_event(
            ctx,
            AuditAction::BulkOperation,
            C::Record::ENTITY,
            "*",
            EventDetails {
                metadata: Some(json!({ "count": affected })),
                reason,
                ..Default::default()
            },
        );
    }
}
