//! Bounded registry of live batches.
//!
//! Owns batch existence; the engine owns each batch's run-time fields while
//! a loop is active. Capacity is fixed (default 10) and an add past the
//! limit is rejected without touching existing batches.

use crate::error::{BatchError, Result};
use crate::logging::log_registry_operation;
use crate::models::{Batch, BatchSnapshot};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to one batch's mutable state.
pub type BatchHandle = Arc<RwLock<Batch>>;

/// Registry statistics for reporting surfaces.
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_batches: usize,
    pub running: usize,
    pub completed: usize,
    pub capacity: usize,
}

/// Bounded collection of batch states keyed by identifier.
pub struct BatchRegistry {
    batches: DashMap<Uuid, BatchHandle>,
    capacity: usize,
    // Serializes capacity check + insert so a racing pair of adds cannot
    // exceed the bound.
    add_lock: Mutex<()>,
}

impl BatchRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            batches: DashMap::new(),
            capacity,
            add_lock: Mutex::new(()),
        }
    }

    /// Register a new empty batch, returning its id.
    pub fn add(&self) -> Result<Uuid> {
        let _guard = self.add_lock.lock();
        if self.batches.len() >= self.capacity {
            log_registry_operation("add", None, "rejected_capacity");
            return Err(BatchError::Capacity {
                limit: self.capacity,
            });
        }

        let batch = Batch::new();
        let id = batch.id;
        self.batches.insert(id, Arc::new(RwLock::new(batch)));
        log_registry_operation("add", Some(id), "success");
        Ok(id)
    }

    /// Look up a live batch by id.
    pub fn get(&self, id: &Uuid) -> Result<BatchHandle> {
        self.batches
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(BatchError::NotFound(*id))
    }

    /// Remove a batch, returning its handle for final cleanup.
    pub fn remove(&self, id: &Uuid) -> Result<BatchHandle> {
        let (_, handle) = self
            .batches
            .remove(id)
            .ok_or(BatchError::NotFound(*id))?;
        log_registry_operation("remove", Some(*id), "success");
        Ok(handle)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.batches.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Snapshots of every live batch, for listing surfaces.
    pub fn list(&self) -> Vec<BatchSnapshot> {
        self.batches
            .iter()
            .map(|entry| entry.value().read().snapshot())
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let snapshots = self.list();
        RegistryStats {
            total_batches: snapshots.len(),
            running: snapshots.iter().filter(|s| s.running).count(),
            completed: snapshots
                .iter()
                .filter(|s| s.state.is_terminal())
                .count(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let registry = BatchRegistry::new(10);
        let id = registry.add().unwrap();
        assert!(registry.contains(&id));
        assert_eq!(registry.get(&id).unwrap().read().display_label(), "none");
    }

    #[test]
    fn test_capacity_rejects_eleventh_batch() {
        let registry = BatchRegistry::new(10);
        let ids: Vec<Uuid> = (0..10).map(|_| registry.add().unwrap()).collect();

        let rejected = registry.add();
        assert!(matches!(rejected, Err(BatchError::Capacity { limit: 10 })));

        // The existing ten are untouched.
        assert_eq!(registry.len(), 10);
        for id in &ids {
            assert!(registry.contains(id));
        }
    }

    #[test]
    fn test_remove_frees_capacity() {
        let registry = BatchRegistry::new(2);
        let first = registry.add().unwrap();
        registry.add().unwrap();
        assert!(registry.add().is_err());

        registry.remove(&first).unwrap();
        assert!(registry.add().is_ok());
    }

    #[test]
    fn test_get_unknown_id_is_not_found() {
        let registry = BatchRegistry::new(10);
        let ghost = Uuid::new_v4();
        assert!(matches!(registry.get(&ghost), Err(BatchError::NotFound(id)) if id == ghost));
        assert!(registry.remove(&ghost).is_err());
    }

    #[test]
    fn test_stats() {
        let registry = BatchRegistry::new(10);
        registry.add().unwrap();
        registry.add().unwrap();
        let stats = registry.stats();
        assert_eq!(stats.total_batches, 2);
        assert_eq!(stats.running, 0);
        assert_eq!(stats.capacity, 10);
    }
}
