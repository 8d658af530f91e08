//! Optimistic feedback updates.
//!
//! [`FeedbackUpdater::send`] dispatches the write request on a worker thread
//! and patches the Log Store right away, without waiting for the server. A
//! failed write is recorded in diagnostics and the local patch is **not**
//! rolled back: the next successful poll overwrites the store with the
//! server's view, which restores consistency.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};

use crate::api::LogApi;
use crate::diagnostics::Diagnostics;
use crate::logs::{Feedback, LogStore};

/// Sends feedback writes and applies the matching local patch.
#[derive(Clone)]
pub struct FeedbackUpdater {
    api: Arc<dyn LogApi>,
    store: LogStore,
    diagnostics: Diagnostics,
}

impl FeedbackUpdater {
    pub fn new(api: Arc<dyn LogApi>, store: LogStore, diagnostics: Diagnostics) -> Self {
        Self {
            api,
            store,
            diagnostics,
        }
    }

    /// Dispatch `PUT /api/logs/{id}/feedback` and patch the store.
    ///
    /// When this returns, the store already shows `value` for `id` (if the
    /// record is present), whatever the network outcome turns out to be.
    pub fn send(&self, id: &str, value: Feedback) -> FeedbackDispatch {
        let worker = {
            let api = Arc::clone(&self.api);
            let diagnostics = self.diagnostics.clone();
            let id = id.to_string();
            thread::spawn(move || {
                let result = api.send_feedback(&id, value);
                match &result {
                    Ok(()) => diagnostics.feedback_sent(&id, value.as_str()),
                    Err(e) => diagnostics.feedback_failure(&id, e),
                }
                result
            })
        };

        let patched = self.store.patch_feedback(id, value);

        FeedbackDispatch { patched, worker }
    }
}

/// Handle to an in-flight feedback write.
///
/// Dropping it detaches the write; the dashboard surfaces do exactly that.
pub struct FeedbackDispatch {
    patched: bool,
    worker: JoinHandle<Result<()>>,
}

impl FeedbackDispatch {
    /// Whether a local record was patched (false when the id is not in the
    /// store).
    pub fn patched(&self) -> bool {
        self.patched
    }

    /// Block until the server answers and return the write outcome.
    pub fn wait(self) -> Result<()> {
        self.worker
            .join()
            .map_err(|_| anyhow!("feedback worker panicked"))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
