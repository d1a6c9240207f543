//! Per-plant critical sections.
//!
//! Every recompute trigger is a read-compute-write sequence: load the
//! full event history, replay it, persist the derived fields. Two such
//! sequences for the same plant must not interleave, or a stale replay
//! could overwrite a newer one. This registry hands out one mutex per
//! plant id; distinct plants proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Registry of per-plant mutexes.
#[derive(Debug, Default)]
pub struct PlantLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl PlantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, plant_id: Uuid) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(plant_id).or_default().clone()
    }

    /// Run `f` while holding the plant's lock.
    pub fn with<T>(&self, plant_id: Uuid, f: impl FnOnce() -> T) -> T {
        let lock = self.entry(plant_id);
        let _guard = lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}
