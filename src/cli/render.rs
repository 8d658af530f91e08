//! Terminal rendering of a [`DashboardView`].
//!
//! Produces plain strings so the watch loop, `agentmon snapshot` and tests
//! share one code path.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::logs::Feedback;
use crate::view::{ChartPoint, DashboardView, LatencyBand};

/// Width of the latency bars in characters.
const BAR_WIDTH: usize = 40;

/// Render the whole dashboard.
pub fn dashboard(
    view: &DashboardView,
    last_refresh: Option<DateTime<Local>>,
    max_rows: usize,
) -> String {
    let mut out = String::new();

    let refreshed = last_refresh
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let _ = writeln!(
        out,
        "{}  {}",
        "Agent Monitor".bold().cyan(),
        format!("refreshed {refreshed}").dimmed()
    );
    let _ = writeln!(out, "{}", "=".repeat(72));

    let _ = writeln!(
        out,
        "  {} {:<8} {} {:<8} {} {:<6} {} {}",
        "Interactions:".bold(),
        view.total_interactions,
        "Avg latency:".bold(),
        format!("{}ms", view.average_latency_ms),
        "Positive:".bold(),
        format!("{}%", view.positive_rate_pct),
        "Users:".bold(),
        view.unique_users,
    );
    let _ = writeln!(out);

    out.push_str(&chart(&view.chart));
    let _ = writeln!(out);

    out.push_str(&table(view, max_rows));
    out
}

/// Horizontal bar chart of the latency series.
pub fn chart(points: &[ChartPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Response Latency (ms)".bold().cyan());

    if points.is_empty() {
        let _ = writeln!(out, "  {}", "no data".dimmed());
        return out;
    }

    let max = points.iter().map(|p| p.latency).max().unwrap_or(0).max(1);
    for point in points {
        let len = bar_len(point.latency, max);
        let _ = writeln!(
            out,
            "  {:>8} {:<width$} {}",
            point.time,
            "█".repeat(len),
            point.latency,
            width = BAR_WIDTH
        );
    }
    out
}

fn bar_len(latency: u64, max: u64) -> usize {
    ((latency as u128 * BAR_WIDTH as u128).div_ceil(max as u128)) as usize
}

/// The interaction table, filtered rows only.
pub fn table(view: &DashboardView, max_rows: usize) -> String {
    let mut out = String::new();

    let title = if view.search.is_empty() {
        "Interactions".to_string()
    } else {
        format!(
            "Interactions matching \"{}\" ({}/{})",
            view.search,
            view.rows.len(),
            view.total_interactions
        )
    };
    let _ = writeln!(out, "{}", title.bold().cyan());
    let _ = writeln!(
        out,
        "  {:<8} {:<8} {:<12} {:>8}  {:<2}  Message",
        "Id", "Time", "User", "Latency", "Fb"
    );
    let _ = writeln!(out, "  {}", "-".repeat(70));

    for (i, row) in view.rows.iter().take(max_rows).enumerate() {
        let log = &row.log;
        let latency = format!("{}ms", log.duration);
        let latency = match row.band {
            LatencyBand::Fast => latency.green(),
            LatencyBand::Slow => latency.yellow(),
        };
        let marker = match log.feedback {
            Some(Feedback::Up) => "+".green().bold(),
            Some(Feedback::Down) => "-".red().bold(),
            None => "·".dimmed(),
        };
        let head = format!(
            "  {:<8} {:<8} {:<12}",
            truncate(&log.id, 8),
            log.time_segment(),
            truncate(&log.user_id, 12),
        );
        let head = if i % 2 == 0 { head.normal() } else { head.dimmed() };

        let _ = writeln!(
            out,
            "{} {:>8}  {:<2}  {} {}",
            head,
            latency,
            marker,
            "Q:".bold(),
            truncate(&log.question, 40)
        );
        let _ = writeln!(
            out,
            "  {:<42} {} {}",
            "",
            "A:".bold().blue(),
            truncate(&log.answer, 40)
        );
    }

    if view.rows.len() > max_rows {
        let _ = writeln!(
            out,
            "  {}",
            format!("... {} more", view.rows.len() - max_rows).dimmed()
        );
    }
    out
}

/// Truncate to `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    let flat: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::InteractionLog;

    fn plain() {
        colored::control::set_override(false);
    }

    fn log(id: &str, duration: u64, feedback: Option<Feedback>) -> InteractionLog {
        InteractionLog {
            id: id.to_string(),
            timestamp: "2026-10-17 14:05:09".to_string(),
            user_id: "alice".to_string(),
            question: "Where is order A101?".to_string(),
            answer: "It was delivered.".to_string(),
            duration,
            feedback,
        }
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("line\nbreak", 20), "line break");
    }

    #[test]
    fn bar_len_scales_to_max() {
        assert_eq!(bar_len(100, 100), BAR_WIDTH);
        assert_eq!(bar_len(50, 100), BAR_WIDTH / 2);
        assert_eq!(bar_len(0, 100), 0);
    }

    #[test]
    fn empty_chart_says_so() {
        plain();
        assert!(chart(&[]).contains("no data"));
    }

    #[test]
    fn dashboard_shows_stats_and_rows() {
        plain();
        let records = vec![log("1", 500, None), log("2", 1500, Some(Feedback::Up))];
        let view = DashboardView::compute(&records, "", 20, 1000);
        let text = dashboard(&view, None, 50);

        assert!(text.contains("Interactions: 2"));
        assert!(text.contains("1000ms"));
        assert!(text.contains("50%"));
        assert!(text.contains("refreshed never"));
        assert!(text.contains("Where is order A101?"));
        assert!(text.contains("14:05:09"));
    }

    #[test]
    fn table_caps_rows() {
        plain();
        let records: Vec<_> = (0..5).map(|i| log(&i.to_string(), 10, None)).collect();
        let view = DashboardView::compute(&records, "", 20, 1000);
        let text = table(&view, 2);
        assert!(text.contains("... 3 more"));
    }

    #[test]
    fn table_title_reports_search() {
        plain();
        let records = vec![log("1", 10, None)];
        let view = DashboardView::compute(&records, "order", 20, 1000);
        assert!(table(&view, 10).contains("matching \"order\" (1/1)"));
    }
}
