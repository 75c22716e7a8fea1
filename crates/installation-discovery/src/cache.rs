use dashmap::DashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-key slot; `None` until a computation succeeds.
type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Read-through cache that computes each key's value at most once.
///
/// The map lock is held only long enough to fetch the key's slot. Callers for
/// the same key then serialize on that slot while callers for other keys
/// proceed independently. A failed computation leaves the slot empty, so the
/// next caller retries.
pub struct ComputeOnceCache<K, V> {
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> Default for ComputeOnceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ComputeOnceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Cached value for `key`, running `compute` on a miss and storing its
    /// result only when it succeeds.
    pub fn get_or_try_compute<E, F>(&self, key: &K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = Arc::clone(self.slots.entry(key.clone()).or_default().value());
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(value) = guard.as_ref() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(compute()?);
        *guard = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Cached value for `key` without computing.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = self.slots.get(key).map(|entry| Arc::clone(entry.value()))?;
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Number of keys holding a computed value
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .lock()
                    .map(|guard| guard.is_some())
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}
