//! Diagnostic side channel: structured JSONL events for failures the
//! dashboard deliberately does not show to the operator.
//!
//! Poll failures, skipped poll ticks and feedback-write failures are appended
//! to `~/.agentmon/diagnostics.jsonl` (configurable). Writing is best-effort:
//! a broken diagnostics file never affects the dashboard.
//!
//! Read back with `agentmon diagnostics`.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::DiagnosticsConfig;
use crate::config::expand_path;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// Kind of diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `GET /api/logs` failed; the store kept its previous contents.
    PollFailure,
    /// A scheduled poll was skipped because the previous one was still running.
    PollSkipped,
    /// `PUT /api/logs/{id}/feedback` failed; the optimistic patch stays.
    FeedbackFailure,
    /// A feedback write was accepted by the server.
    FeedbackSent,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PollFailure => "poll_failure",
            Self::PollSkipped => "poll_skipped",
            Self::FeedbackFailure => "feedback_failure",
            Self::FeedbackSent => "feedback_sent",
        }
    }
}

/// One line of the diagnostics log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: String,
    pub kind: EventKind,
    pub message: String,
    /// Log record the event concerns (feedback events only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub log_id: Option<String>,
}

impl DiagnosticEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            message: message.into(),
            log_id: None,
        }
    }

    pub fn with_log_id(mut self, id: impl Into<String>) -> Self {
        self.log_id = Some(id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Where diagnostic events go. Cheap to clone; shared by the poller and the
/// feedback updater.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    path: Option<PathBuf>,
    echo_stderr: bool,
}

impl Diagnostics {
    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self {
            path: config.enabled.then(|| expand_path(&config.path)),
            echo_stderr: config.echo_stderr,
        }
    }

    /// A sink that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A sink writing to an explicit file (used by tests).
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            echo_stderr: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an event. Failures to write are ignored.
    pub fn record(&self, event: &DiagnosticEvent) {
        if self.echo_stderr {
            eprintln!("[agentmon] {}: {}", event.kind.as_str(), event.message);
        }
        if let Some(path) = &self.path {
            let _ = append_event(path, event);
        }
    }

    pub fn poll_failure(&self, error: &anyhow::Error) {
        self.record(&DiagnosticEvent::new(
            EventKind::PollFailure,
            format!("{error:#}"),
        ));
    }

    pub fn poll_skipped(&self, missed: u32) {
        self.record(&DiagnosticEvent::new(
            EventKind::PollSkipped,
            format!("previous poll still in flight, skipped {missed} tick(s)"),
        ));
    }

    pub fn feedback_failure(&self, id: &str, error: &anyhow::Error) {
        self.record(
            &DiagnosticEvent::new(EventKind::FeedbackFailure, format!("{error:#}")).with_log_id(id),
        );
    }

    pub fn feedback_sent(&self, id: &str, value: &str) {
        self.record(
            &DiagnosticEvent::new(EventKind::FeedbackSent, format!("feedback '{value}' stored"))
                .with_log_id(id),
        );
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_event(path: &Path, event: &DiagnosticEvent) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Read every event from a diagnostics file, skipping malformed lines.
///
/// Returns an empty vec if the file does not exist or cannot be read.
pub fn read_events(path: &Path) -> Vec<DiagnosticEvent> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<DiagnosticEvent>(&line).ok())
        .collect()
}

/// The last `limit` events, oldest first.
pub fn read_recent(path: &Path, limit: usize) -> Vec<DiagnosticEvent> {
    let mut events = read_events(path);
    let skip = events.len().saturating_sub(limit);
    events.drain(..skip);
    events
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
