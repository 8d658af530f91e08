/// Client-side cache of the most recently fetched interaction logs.
///
/// A [`LogStore`] is a cheap-to-clone handle around shared state. It is the
/// only place log records live on the client and it changes through exactly
/// two operations:
///
/// - [`replace_all`](LogStore::replace_all): install a freshly polled sequence,
///   discarding the previous one wholesale (no merge, no dedup).
/// - [`patch_feedback`](LogStore::patch_feedback): optimistic feedback update
///   of a single record.
///
/// Each mutation runs to completion under the lock, so readers never observe a
/// half-applied update.
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};

use super::record::{Feedback, InteractionLog};

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<InteractionLog>,
    /// Bumped on every mutation so renderers can tell whether anything changed.
    generation: u64,
    last_refresh: Option<DateTime<Local>>,
}

/// Shared handle to the log cache. Clones observe the same records.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    inner: Arc<Mutex<StoreState>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached sequence with `records`, preserving server order.
    pub fn replace_all(&self, records: Vec<InteractionLog>) {
        let mut state = self.lock();
        state.records = records;
        state.generation += 1;
        state.last_refresh = Some(Local::now());
    }

    /// Set `feedback` on every record with the given id.
    ///
    /// Returns `false` (and leaves the store untouched) when no record has
    /// that id. Other records and fields are never modified.
    pub fn patch_feedback(&self, id: &str, value: Feedback) -> bool {
        let mut state = self.lock();
        let mut patched = false;
        for record in state.records.iter_mut().filter(|r| r.id == id) {
            record.feedback = Some(value);
            patched = true;
        }
        if patched {
            state.generation += 1;
        }
        patched
    }

    /// Copy of the current records, in store order.
    pub fn snapshot(&self) -> Vec<InteractionLog> {
        self.lock().records.clone()
    }

    /// Run `f` against the current records without cloning them.
    pub fn with_records<R>(&self, f: impl FnOnce(&[InteractionLog]) -> R) -> R {
        f(&self.lock().records)
    }

    /// Look up a single record by id.
    pub fn get(&self, id: &str) -> Option<InteractionLog> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Wall-clock time of the last successful [`replace_all`](Self::replace_all).
    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.lock().last_refresh
    }

    // A panic while holding the lock cannot leave the records half-written
    // (every mutation is a single assignment), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
