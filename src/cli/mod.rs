//! CLI command implementations for agentmon.
//!
//! Provides subcommand handlers for:
//! - `agentmon watch`: live terminal dashboard
//! - `agentmon snapshot`: one poll, one render (table, json or csv)
//! - `agentmon feedback <id> <up|down>`: one-shot feedback write
//! - `agentmon health`: API reachability and local file checks
//! - `agentmon diagnostics`: recent diagnostic events
//! - `agentmon config show|init|set|reset`: configuration management

pub mod render;
pub mod watch;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use colored::Colorize;

use crate::api::{HttpLogApi, LogApi};
use crate::config;
use crate::diagnostics::{self, Diagnostics};
use crate::feedback::FeedbackUpdater;
use crate::logs::{Feedback, LogStore};
use crate::poller::{self, PollOutcome};
use crate::view::DashboardView;

/// Output format for `agentmon snapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// agentmon watch
// ---------------------------------------------------------------------------

/// Start the live terminal dashboard.
pub fn run_watch(search: Option<String>) -> Result<()> {
    let config = config::load();
    watch::run(&config, search)
}

// ---------------------------------------------------------------------------
// agentmon snapshot
// ---------------------------------------------------------------------------

/// Poll once and print the dashboard.
pub fn run_snapshot(format: OutputFormat, search: Option<String>) -> Result<()> {
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config.diagnostics);
    let api = HttpLogApi::from_config(&config.api);
    let store = LogStore::new();

    if poller::poll_once(&api, &store, &diagnostics) == PollOutcome::Failed {
        println!(
            "{}",
            format!(
                "Could not load logs from {} (run `agentmon diagnostics` for details).",
                api.base_url()
            )
            .yellow()
        );
        return Ok(());
    }

    let search = search.unwrap_or_default();
    let view = store.with_records(|records| {
        DashboardView::compute(
            records,
            &search,
            config.view.chart_window,
            config.view.slow_latency_ms,
        )
    });

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Csv => print_rows_csv(&view),
        OutputFormat::Table => print!(
            "{}",
            render::dashboard(&view, store.last_refresh(), config.view.max_rows)
        ),
    }

    Ok(())
}

fn print_rows_csv(view: &DashboardView) {
    println!("id,timestamp,user_id,duration_ms,feedback,question");
    for row in &view.rows {
        let log = &row.log;
        println!(
            "{},{},{},{},{},{}",
            csv_field(&log.id),
            csv_field(&log.timestamp),
            csv_field(&log.user_id),
            log.duration,
            log.feedback.map(Feedback::as_str).unwrap_or(""),
            csv_field(&log.question),
        );
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// agentmon feedback
// ---------------------------------------------------------------------------

/// Send one feedback value and report the server's answer.
pub fn run_feedback(id: &str, value: &str) -> Result<()> {
    let value: Feedback = value.parse()?;
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config.diagnostics);
    let api: Arc<dyn LogApi> = Arc::new(HttpLogApi::from_config(&config.api));

    let updater = FeedbackUpdater::new(api, LogStore::new(), diagnostics);
    updater.send(id, value).wait()?;

    println!("{} feedback '{}' stored for {}", "✓".green(), value, id);
    Ok(())
}

// ---------------------------------------------------------------------------
// agentmon health
// ---------------------------------------------------------------------------

/// Check that the log API answers and report local file state.
pub fn run_health() -> Result<()> {
    let config = config::load();
    println!("{}", "agentmon Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    let api = HttpLogApi::from_config(&config.api);
    let started = Instant::now();
    match api.fetch_logs() {
        Ok(records) => println!(
            "  {} {} ({} logs, {}ms)",
            "API:          ".bold(),
            "reachable".green(),
            records.len(),
            started.elapsed().as_millis()
        ),
        Err(e) => println!(
            "  {} {} ({e:#})",
            "API:          ".bold(),
            "unreachable".red()
        ),
    }
    println!("  {} {}", "Base URL:     ".bold(), api.base_url());
    println!(
        "  {} {}ms",
        "Poll interval:".bold(),
        config.poller.interval().as_millis()
    );

    print_file_status("Global config:", config::global_config_file());
    print_file_status("Project config:", config::project_config_file());

    let diag_path = Diagnostics::from_config(&config.diagnostics)
        .path()
        .map(|p| p.to_path_buf());
    match diag_path {
        Some(path) => print_file_status("Diagnostics:", Some(path)),
        None => println!("  {:<15} {}", "Diagnostics:".bold(), "disabled".dimmed()),
    }

    Ok(())
}

fn print_file_status(label: &str, path: Option<std::path::PathBuf>) {
    match path {
        Some(p) if p.exists() => {
            println!("  {:<15} {} {}", label.bold(), "found".green(), p.display())
        }
        Some(p) => println!(
            "  {:<15} {} {}",
            label.bold(),
            "missing".dimmed(),
            p.display()
        ),
        None => println!("  {:<15} {}", label.bold(), "unknown".dimmed()),
    }
}

// ---------------------------------------------------------------------------
// agentmon diagnostics
// ---------------------------------------------------------------------------

/// Print the most recent diagnostic events.
pub fn run_diagnostics(limit: usize) -> Result<()> {
    let config = config::load();
    let sink = Diagnostics::from_config(&config.diagnostics);
    let Some(path) = sink.path() else {
        println!("{}", "Diagnostics are disabled ([diagnostics] enabled = false).".yellow());
        return Ok(());
    };

    let events = diagnostics::read_recent(path, limit);
    if events.is_empty() {
        println!("{}", "No diagnostic events recorded.".green());
        return Ok(());
    }

    println!("{}", "Recent Diagnostic Events".bold().cyan());
    println!("{}", "=".repeat(60));
    for event in events {
        let kind = event.kind.as_str();
        let kind = match event.kind {
            diagnostics::EventKind::FeedbackSent => kind.green(),
            diagnostics::EventKind::PollSkipped => kind.yellow(),
            _ => kind.red(),
        };
        let id = event
            .log_id
            .map(|id| format!(" [{id}]"))
            .unwrap_or_default();
        println!("  {} {:<17}{} {}", event.timestamp.dimmed(), kind, id, event.message);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// agentmon config
// ---------------------------------------------------------------------------

/// Config subcommand actions.
#[derive(Debug, Clone)]
pub enum ConfigAction {
    Show,
    Init { force: bool },
    Set { key: String, value: String },
    Reset,
}

pub fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config::show_effective_config()?);
        }
        ConfigAction::Init { force } => {
            let path = config::init_config(force)?;
            println!("{} wrote {}", "✓".green(), path.display());
        }
        ConfigAction::Set { key, value } => {
            config::set_config_value(&key, &value)?;
            println!("{} {} = {}", "✓".green(), key, value);
        }
        ConfigAction::Reset => {
            let path = config::reset_config()?;
            println!("{} reset {}", "✓".green(), path.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
