//! Interaction log records and the client-side Log Store.

pub mod record;
pub mod store;

pub use record::{Feedback, FeedbackRequest, InteractionLog, LogsResponse};
pub use store::LogStore;
