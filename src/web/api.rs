//! JSON API handlers for the local web dashboard.
//!
//! Handlers return an [`ApiReply`]; the server module turns it into a
//! `tiny_http` response. All reads come from the Log Store owned by the
//! server, never from the remote API directly.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::schema::ViewConfig;
use crate::feedback::FeedbackUpdater;
use crate::logs::{Feedback, InteractionLog, LogStore};
use crate::view::DashboardView;

/// State shared by all request handlers.
pub struct WebState {
    pub store: LogStore,
    pub updater: FeedbackUpdater,
    pub view: ViewConfig,
}

/// A handler's answer: status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    fn json<T: Serialize>(status: u16, data: &T) -> anyhow::Result<Self> {
        let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
        Ok(Self { status, body })
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON bodies
// ---------------------------------------------------------------------------

/// `GET /api/logs` response: same shape as the upstream API.
#[derive(Serialize)]
struct LogsReply {
    logs: Vec<InteractionLog>,
    total: usize,
}

/// `GET /api/view` response.
#[derive(Serialize)]
struct ViewReply {
    #[serde(flatten)]
    view: DashboardView,
    last_refresh: Option<String>,
}

/// `PUT /api/logs/{id}/feedback` request body.
#[derive(Deserialize)]
struct FeedbackBody {
    feedback: Feedback,
}

#[derive(Serialize)]
struct FeedbackReply<'a> {
    status: &'static str,
    log_id: &'a str,
    feedback: Feedback,
    patched: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the `?q=...` query parameter from a URL, form-decoded.
pub fn parse_search_param(url: &str) -> Option<String> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == "q").then(|| percent_decode(&v.replace('+', " ")))
    })
}

/// Extract `{id}` from `/api/logs/{id}/feedback`.
pub fn feedback_route_id(path: &str) -> Option<String> {
    let id = path.strip_prefix("/api/logs/")?.strip_suffix("/feedback")?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(percent_decode(id))
}

/// Decode `%XX` escapes. Invalid escapes are kept as-is; invalid UTF-8 is
/// replaced rather than rejected.
fn percent_decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
    }
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/view?q=TERM`: derived view over the current store.
pub fn get_view(state: &WebState, url: &str) -> anyhow::Result<ApiReply> {
    let search = parse_search_param(url).unwrap_or_default();
    let view = state.store.with_records(|records| {
        DashboardView::compute(
            records,
            &search,
            state.view.chart_window,
            state.view.slow_latency_ms,
        )
    });
    let reply = ViewReply {
        view,
        last_refresh: state.store.last_refresh().map(|t| t.to_rfc3339()),
    };
    ApiReply::json(200, &reply)
}

/// `GET /api/logs`: raw store contents.
pub fn get_logs(state: &WebState) -> anyhow::Result<ApiReply> {
    let logs = state.store.snapshot();
    let total = logs.len();
    ApiReply::json(200, &LogsReply { logs, total })
}

/// `PUT /api/logs/{id}/feedback`: optimistic feedback through the updater.
///
/// Answers 202 as soon as the write is dispatched; the remote outcome only
/// reaches diagnostics.
pub fn put_feedback(state: &WebState, id: &str, body: &str) -> anyhow::Result<ApiReply> {
    let Ok(parsed) = serde_json::from_str::<FeedbackBody>(body) else {
        return Ok(ApiReply::error(400, "expected {\"feedback\": \"up\" | \"down\"}"));
    };

    let dispatch = state.updater.send(id, parsed.feedback);

    ApiReply::json(
        202,
        &FeedbackReply {
            status: "accepted",
            log_id: id,
            feedback: parsed.feedback,
            patched: dispatch.patched(),
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
