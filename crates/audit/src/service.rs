//! The audit trail service.
//!
//! `log_event` is best-effort and infallible to its caller: the business
//! mutation it observes has already completed by the time logging runs, and
//! no failure here may reverse or block it. Query and aggregation methods
//! are ordinary fallible reads.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use ledgerdesk_core::{AuditLogId, RequestContext, TenantId};

use crate::describe::{describe, is_sensitive};
use crate::diff::change_summary;
use crate::entry::{AuditAction, AuditEntity, AuditLogEntry};
use crate::query::{
    ActorActivity, AuditLogFilter, AuditLogPage, AuditStats, PageInfo, PageRequest,
};
use crate::store::{AuditStore, AuditStoreError};

/// Retention window used when the scheduler passes no override.
pub const DEFAULT_RETENTION_DAYS: i64 = 365;

/// Largest trailing window served by the stats endpoint.
pub const MAX_STATS_WINDOW_DAYS: i64 = 365;

/// Optional detail accompanying a logged event.
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
    /// Entity snapshot before the mutation.
    pub old_values: Option<Value>,
    /// Entity snapshot after the mutation.
    pub new_values: Option<Value>,
    /// Caller-supplied metadata, merged with environment-derived fields.
    pub metadata: Option<Value>,
    pub reason: Option<String>,
}

/// Organization-scoped audit trail over a persistence store.
#[derive(Debug)]
pub struct AuditTrail<S> {
    store: S,
}

impl<S: AuditStore> AuditTrail<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record one event, best-effort.
    ///
    /// Never panics and never returns an error: failures are reported on the
    /// `audit` operational target and swallowed. A context without an
    /// authenticated user (or active organization) is a warned no-op —
    /// audit logging must never become a write path of its own.
    pub fn log_event(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        entity: AuditEntity,
        entity_id: &str,
        details: EventDetails,
    ) {
        if let Err(err) = self.try_log(ctx, action, entity, entity_id, details, Utc::now()) {
            tracing::error!(
                target: "audit",
                %action,
                %entity,
                entity_id,
                error = %err,
                "audit logging failed; business operation unaffected"
            );
        }
    }

    /// Convenience: record an authentication event for the context's user.
    pub fn log_login(&self, ctx: &RequestContext) {
        let subject = ctx.user_id.map(|u| u.to_string()).unwrap_or_default();
        self.log_event(ctx, AuditAction::Login, AuditEntity::User, &subject, EventDetails::default());
    }

    pub fn log_logout(&self, ctx: &RequestContext) {
        let subject = ctx.user_id.map(|u| u.to_string()).unwrap_or_default();
        self.log_event(ctx, AuditAction::Logout, AuditEntity::User, &subject, EventDetails::default());
    }

    fn try_log(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        entity: AuditEntity,
        entity_id: &str,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> Result<(), AuditStoreError> {
        let (Some(user_id), Some(tenant_id)) = (ctx.user_id, ctx.tenant_id) else {
            tracing::warn!(
                target: "audit",
                %action,
                %entity,
                entity_id,
                "audit event skipped: no authenticated actor/organization in context"
            );
            return Ok(());
        };

        let mut metadata = match details.metadata {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("details".to_string(), other);
                map
            }
            None => Map::new(),
        };
        metadata.insert("ip".to_string(), Value::String(ctx.client_ip.clone()));
        if let Some(agent) = &ctx.user_agent {
            metadata.insert("user_agent".to_string(), Value::String(agent.clone()));
        }
        metadata.insert("timestamp".to_string(), Value::String(now.to_rfc3339()));
        if let Some(reason) = details.reason {
            metadata.insert("reason".to_string(), Value::String(reason));
        }

        let changes = match (&details.old_values, &details.new_values) {
            (Some(old_values), Some(new_values)) => {
                let summary = change_summary(old_values, new_values);
                (!summary.is_empty()).then_some(summary)
            }
            _ => None,
        };

        let name = metadata.get("name").and_then(Value::as_str).map(str::to_owned);
        let description = describe(action, entity, name.as_deref());

        if is_sensitive(action, entity) {
            tracing::warn!(
                target: "security",
                %action,
                %entity,
                entity_id,
                %tenant_id,
                %user_id,
                "sensitive action recorded"
            );
        }

        self.store.append(AuditLogEntry {
            id: AuditLogId::new(),
            tenant_id,
            user_id,
            action,
            entity,
            entity_id: entity_id.to_string(),
            changes,
            description,
            metadata,
            created_at: now,
        })
    }

    /// Paginated, filtered log query (newest first).
    ///
    /// Page is clamped to ≥ 1 and limit to `[1, 100]` before hitting the
    /// store.
    pub fn get_audit_logs(
        &self,
        tenant_id: TenantId,
        filter: &AuditLogFilter,
        page: PageRequest,
    ) -> Result<AuditLogPage, AuditStoreError> {
        let page = page.clamped();
        let (logs, total) = self
            .store
            .query(tenant_id, filter, page.offset(), page.limit as usize)?;

        let total_pages = total.div_ceil(page.limit as u64) as u32;
        let has_more = (page.offset() as u64) + (logs.len() as u64) < total;

        Ok(AuditLogPage {
            logs,
            pagination: PageInfo {
                page: page.page,
                limit: page.limit,
                total,
                total_pages,
                has_more,
            },
        })
    }

    /// Aggregate statistics over the trailing `days` window ending now.
    pub fn get_audit_stats(
        &self,
        tenant_id: TenantId,
        days: i64,
    ) -> Result<AuditStats, AuditStoreError> {
        self.stats_at(tenant_id, days, Utc::now())
    }

    /// Deterministic variant of [`get_audit_stats`](Self::get_audit_stats)
    /// with an explicit window end.
    pub fn stats_at(
        &self,
        tenant_id: TenantId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<AuditStats, AuditStoreError> {
        let days = days.clamp(1, MAX_STATS_WINDOW_DAYS);
        let mut window = self.store.window(tenant_id, now - Duration::days(days), now)?;
        window.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_actions = window.len() as u64;

        let mut by_action: BTreeMap<AuditAction, u64> = BTreeMap::new();
        let mut per_actor: HashMap<_, u64> = HashMap::new();
        let mut sensitive_actions = 0u64;
        for entry in &window {
            *by_action.entry(entry.action).or_insert(0) += 1;
            *per_actor.entry(entry.user_id).or_insert(0) += 1;
            if is_sensitive(entry.action, entry.entity) {
                sensitive_actions += 1;
            }
        }

        let mut top_actors: Vec<ActorActivity> = per_actor
            .into_iter()
            .map(|(user_id, count)| ActorActivity { user_id, count })
            .collect();
        top_actors.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.user_id.as_uuid().cmp(b.user_id.as_uuid()))
        });
        top_actors.truncate(10);

        let recent = window.iter().take(10).cloned().collect();

        Ok(AuditStats {
            total_actions,
            by_action,
            top_actors,
            sensitive_actions,
            recent,
        })
    }

    /// Retention purge: hard-delete entries older than `older_than_days`.
    ///
    /// The only sanctioned deletion path; invoked by an external scheduler,
    /// never from request handling.
    pub fn delete_old_logs(
        &self,
        tenant_id: TenantId,
        older_than_days: i64,
    ) -> Result<u64, AuditStoreError> {
        self.purge_at(tenant_id, older_than_days, Utc::now())
    }

    /// Deterministic variant of [`delete_old_logs`](Self::delete_old_logs).
    pub fn purge_at(
        &self,
        tenant_id: TenantId,
        older_than_days: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, AuditStoreError> {
        let cutoff = now - Duration::days(older_than_days.max(1));
        self.store.delete_older_than(tenant_id, cutoff)
    }
}
