//! Local web dashboard for agentmon.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that owns a
//! Log Store and a Poller for as long as it runs, and serves:
//! - A single-page dashboard that refreshes from `/api/view` every 2 s
//! - JSON endpoints for the derived view, the raw store and feedback
//!
//! Launched via `agentmon web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::{HttpLogApi, LogApi};
use crate::config::MonitorConfig;
use crate::diagnostics::Diagnostics;
use crate::feedback::FeedbackUpdater;
use crate::logs::LogStore;
use crate::poller::{Poller, PollerSetup};

pub use api::{ApiReply, WebState};

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard on `addr`.
///
/// Blocks the current thread. Requests are handled sequentially, which is
/// plenty for a local single-operator dashboard. The poller lives exactly as
/// long as this function.
pub fn serve(config: &MonitorConfig, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let diagnostics = Diagnostics::from_config(&config.diagnostics);
    let remote: Arc<dyn LogApi> = Arc::new(HttpLogApi::from_config(&config.api));
    let store = LogStore::new();

    let poller = Poller::start(PollerSetup {
        api: Arc::clone(&remote),
        store: store.clone(),
        diagnostics: diagnostics.clone(),
        interval: config.poller.interval(),
        notify: None,
    });

    let state = WebState {
        updater: FeedbackUpdater::new(remote, store.clone(), diagnostics),
        store,
        view: config.view.clone(),
    };

    println!("agentmon dashboard running at http://{addr}");
    println!("Watching {}", config.api.base_url);
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let response = match dispatch(&state, &method, &url, body.as_deref()) {
            Ok(resp) => resp,
            Err(e) => json_response(ApiReply::error(500, &format!("{e:#}"))),
        };
        let _ = request.respond(response);
    }

    poller.stop();
    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(
    state: &WebState,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let path = url.split('?').next().unwrap_or(url);

    let reply = match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => return Ok(serve_frontend()),

        (&Method::Get, "/api/view") => api::get_view(state, url)?,
        (&Method::Get, "/api/logs") => api::get_logs(state)?,
        (&Method::Put, _) => match api::feedback_route_id(path) {
            Some(id) => api::put_feedback(state, &id, body.unwrap_or(""))?,
            None => ApiReply::error(404, "not found"),
        },

        _ => ApiReply::error(404, "not found"),
    };

    Ok(json_response(reply))
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn json_response(reply: ApiReply) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(reply.body.into_bytes())
        .with_header(content_type("application/json; charset=utf-8"))
        .with_status_code(StatusCode(reply.status))
}

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(content_type("text/html; charset=utf-8"))
        .with_status_code(StatusCode(200))
}

fn content_type(value: &'static str) -> Header {
    Header::from_bytes("Content-Type", value).unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
