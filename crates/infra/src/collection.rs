//! Generic data-access layer.
//!
//! Each entity type gets one `Collection`: a thin, storage-agnostic surface
//! of lookups and mutations keyed by the record id. The in-memory
//! implementation backs tests and development; a database-backed collection
//! implements the same contract.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

use ledgerdesk_audit::AuditEntity;
use ledgerdesk_core::{DomainError, DomainResult};

/// A record stored in a collection.
pub trait EntityRecord: Clone + Serialize + Send + Sync + 'static {
    /// Which audit entity this record maps to.
    const ENTITY: AuditEntity;

    /// Stable identifier of the record within its collection.
    fn record_id(&self) -> String;

    /// Display name used in generated audit descriptions, when there is one.
    fn display_name(&self) -> Option<String> {
        None
    }
}

/// Storage-agnostic access to one entity collection.
pub trait Collection: Send + Sync {
    type Record: EntityRecord;

    fn find_unique(&self, id: &str) -> Option<Self::Record>;
    fn find_first(&self, predicate: &dyn Fn(&Self::Record) -> bool) -> Option<Self::Record>;
    fn find_many(&self, predicate: &dyn Fn(&Self::Record) -> bool) -> Vec<Self::Record>;

    /// Insert a new record; `Conflict` if the id is already taken.
    fn insert(&self, record: Self::Record) -> DomainResult<Self::Record>;

    /// Apply `apply` to the record with `id`; returns the updated record.
    fn update(
        &self,
        id: &str,
        apply: &dyn Fn(&mut Self::Record),
    ) -> DomainResult<Self::Record>;

    /// Remove and return the record with `id`.
    fn remove(&self, id: &str) -> DomainResult<Self::Record>;

    /// Apply `apply` to every matching record; returns the affected count.
    fn update_many(
        &self,
        predicate: &dyn Fn(&Self::Record) -> bool,
        apply: &dyn Fn(&mut Self::Record),
    ) -> DomainResult<u64>;

    /// Remove every matching record; returns the affected count.
    fn remove_many(&self, predicate: &dyn Fn(&Self::Record) -> bool) -> DomainResult<u64>;
}

/// In-memory collection for tests/dev.
#[derive(Debug)]
pub struct InMemoryCollection<T> {
    inner: RwLock<HashMap<String, T>>,
}

impl<T> InMemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    DomainError::conflict("collection lock poisoned")
}

impl<T: EntityRecord> Collection for InMemoryCollection<T> {
    type Record = T;

    fn find_unique(&self, id: &str) -> Option<T> {
        self.inner.read().ok()?.get(id).cloned()
    }

    fn find_first(&self, predicate: &dyn Fn(&T) -> bool) -> Option<T> {
        let mut matches = self.find_many(predicate);
        if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        }
    }

    fn find_many(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T> {
        let map = match self.inner.read() {
            Ok(map) => map,
            Err(_) => return Vec::new(),
        };

        let mut matches: Vec<T> = map.values().filter(|r| predicate(r)).cloned().collect();
        matches.sort_by_key(|r| r.record_id());
        matches
    }

    fn insert(&self, record: T) -> DomainResult<T> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = record.record_id();
        if map.contains_key(&id) {
            return Err(DomainError::conflict(format!("duplicate id: {id}")));
        }
        map.insert(id, record.clone());
        Ok(record)
    }

    fn update(&self, id: &str, apply: &dyn Fn(&mut T)) -> DomainResult<T> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let record = map.get_mut(id).ok_or(DomainError::NotFound)?;
        apply(record);
        Ok(record.clone())
    }

    fn remove(&self, id: &str) -> DomainResult<T> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(id).ok_or(DomainError::NotFound)
    }

    fn update_many(
        &self,
        predicate: &dyn Fn(&T) -> bool,
        apply: &dyn Fn(&mut T),
    ) -> DomainResult<u64> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let mut affected = 0u64;
        for record in map.values_mut() {
            if predicate(record) {
                apply(record);
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn remove_many(&self, predicate: &dyn Fn(&T) -> bool) -> DomainResult<u64> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let before = map.len();
        map.retain(|_, record| !predicate(record));
        Ok((before - map.len()) as u64)
    }
}
