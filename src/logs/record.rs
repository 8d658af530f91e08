/// Wire types for the interaction log API.
///
/// Mirrors the JSON shape served by `GET /api/logs` and accepted by
/// `PUT /api/logs/{id}/feedback`. Unknown fields (for example the server's
/// `total` counter) are ignored on read.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Operator verdict attached to a single interaction.
///
/// Absence is modelled as `Option<Feedback>::None` on the record; there is no
/// variant for clearing feedback because this client never does it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Up,
    Down,
}

impl Feedback {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feedback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "+" | "+1" => Ok(Self::Up),
            "down" | "-" | "-1" => Ok(Self::Down),
            other => anyhow::bail!("invalid feedback '{other}' (expected 'up' or 'down')"),
        }
    }
}

// ---------------------------------------------------------------------------
// Interaction log record
// ---------------------------------------------------------------------------

/// One question/answer exchange recorded by the agent backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionLog {
    pub id: String,
    /// Display timestamp, `"YYYY-MM-DD HH:MM:SS"` as produced by the backend.
    pub timestamp: String,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    /// Response latency in milliseconds.
    pub duration: u64,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

impl InteractionLog {
    /// The time segment of the timestamp (everything after the first space,
    /// up to the next one). Empty when the timestamp has no time part.
    pub fn time_segment(&self) -> &str {
        self.timestamp.split(' ').nth(1).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Response body of `GET /api/logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<InteractionLog>,
}

/// Request body of `PUT /api/logs/{id}/feedback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: Feedback,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
