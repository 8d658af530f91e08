//! `agentmon watch`: live terminal dashboard.
//!
//! The watch loop owns the Log Store, the Poller and the Feedback Updater
//! for its lifetime. Poll notifications and stdin lines arrive on one
//! channel and are handled one at a time; every event triggers a full
//! re-render from the current store.
//!
//! Stdin commands:
//!
//! | Input        | Effect                                  |
//! |--------------|-----------------------------------------|
//! | `/term`      | search for `term` (`/` alone clears it) |
//! | `+ <id>`     | thumbs up (id or unique id prefix)      |
//! | `- <id>`     | thumbs down                             |
//! | `q`          | quit                                    |

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::Result;
use colored::Colorize;

use super::render;
use crate::api::{HttpLogApi, LogApi};
use crate::config::MonitorConfig;
use crate::diagnostics::Diagnostics;
use crate::feedback::FeedbackUpdater;
use crate::logs::{Feedback, LogStore};
use crate::poller::{PollEvent, Poller, PollerSetup};
use crate::view::DashboardView;

/// Operator input, parsed from one stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Search(String),
    Feedback(String, Feedback),
    Quit,
}

/// Parse a stdin line. Returns `None` for blank or unrecognised input.
pub fn parse_command(line: &str) -> Option<WatchCommand> {
    let line = line.trim();
    if let Some(term) = line.strip_prefix('/') {
        return Some(WatchCommand::Search(term.trim().to_string()));
    }
    if matches!(line, "q" | "quit" | "exit") {
        return Some(WatchCommand::Quit);
    }

    let (verb, id) = line.split_once(char::is_whitespace)?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    let value = verb.parse::<Feedback>().ok()?;
    Some(WatchCommand::Feedback(id.to_string(), value))
}

/// Resolve an id typed by the operator: exact match first, then a unique
/// prefix of a stored id.
pub fn resolve_id(store: &LogStore, typed: &str) -> Option<String> {
    store.with_records(|records| {
        if records.iter().any(|r| r.id == typed) {
            return Some(typed.to_string());
        }
        let mut matches = records.iter().filter(|r| r.id.starts_with(typed));
        let first = matches.next()?;
        if matches.any(|r| r.id != first.id) {
            None
        } else {
            Some(first.id.clone())
        }
    })
}

enum WatchEvent {
    Poll(PollEvent),
    Input(String),
}

/// Run the live dashboard until the operator quits.
pub fn run(config: &MonitorConfig, search: Option<String>) -> Result<()> {
    let diagnostics = Diagnostics::from_config(&config.diagnostics);
    let api: Arc<dyn LogApi> = Arc::new(HttpLogApi::from_config(&config.api));
    let store = LogStore::new();
    let updater = FeedbackUpdater::new(Arc::clone(&api), store.clone(), diagnostics.clone());

    let (tx, rx) = mpsc::channel::<WatchEvent>();

    let poll_tx = tx.clone();
    let poller = Poller::start(PollerSetup {
        api,
        store: store.clone(),
        diagnostics,
        interval: config.poller.interval(),
        notify: Some(Box::new(move |event: PollEvent| {
            let _ = poll_tx.send(WatchEvent::Poll(event));
        })),
    });
    spawn_stdin_reader(tx);

    let mut search = search.unwrap_or_default();
    let mut status = String::new();
    redraw(config, &store, &search, &status);

    while let Ok(event) = rx.recv() {
        match event {
            WatchEvent::Poll(PollEvent::Polled(_)) => {}
            WatchEvent::Input(line) => match parse_command(&line) {
                Some(WatchCommand::Quit) => break,
                Some(WatchCommand::Search(term)) => {
                    search = term;
                    status.clear();
                }
                Some(WatchCommand::Feedback(typed, value)) => match resolve_id(&store, &typed) {
                    Some(id) => {
                        // Detached: failures go to diagnostics.
                        updater.send(&id, value);
                        status = format!("feedback '{value}' sent for {id}");
                    }
                    None => status = format!("no unique record matches '{typed}'"),
                },
                None if line.trim().is_empty() => {}
                None => status = format!("unknown command: {}", line.trim()),
            },
        }
        redraw(config, &store, &search, &status);
    }

    poller.stop();
    Ok(())
}

fn redraw(config: &MonitorConfig, store: &LogStore, search: &str, status: &str) {
    let view = store.with_records(|records| {
        DashboardView::compute(
            records,
            search,
            config.view.chart_window,
            config.view.slow_latency_ms,
        )
    });
    let text = render::dashboard(&view, store.last_refresh(), config.view.max_rows);

    let mut stdout = io::stdout().lock();
    // Clear screen, cursor home.
    let _ = write!(stdout, "\x1b[2J\x1b[H{text}");
    if !status.is_empty() {
        let _ = writeln!(stdout, "\n  {}", status.yellow());
    }
    let _ = writeln!(
        stdout,
        "\n  {}",
        "/term search · + <id> up · - <id> down · q quit".dimmed()
    );
    let _ = stdout.flush();
}

fn spawn_stdin_reader(tx: Sender<WatchEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            if tx.send(WatchEvent::Input(line)).is_err() {
                break;
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
