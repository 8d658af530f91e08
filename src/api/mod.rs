//! Access to the remote interaction log API.
//!
//! The poller and the feedback updater only see the [`LogApi`] trait, so
//! they can be driven by the real HTTP client ([`client::HttpLogApi`]) or by
//! an in-memory fake in tests.

pub mod client;

use anyhow::Result;

use crate::logs::{Feedback, InteractionLog};

pub use client::HttpLogApi;

/// The two endpoints the dashboard talks to.
///
/// Implementations must be shareable across the poller thread and feedback
/// workers.
pub trait LogApi: Send + Sync {
    /// `GET /api/logs`: the complete current collection, in server order.
    fn fetch_logs(&self) -> Result<Vec<InteractionLog>>;

    /// `PUT /api/logs/{id}/feedback`: persist one record's feedback.
    fn send_feedback(&self, id: &str, feedback: Feedback) -> Result<()>;
}
