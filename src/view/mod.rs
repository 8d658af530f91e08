//! Derived view: aggregates, chart projection and search over the Log Store.
//!
//! Everything here is a pure function of a record slice. Nothing is cached
//! between render passes: each pass recomputes from the current store, which
//! is fine at dashboard scale.

use std::collections::HashSet;

use serde::Serialize;

use crate::logs::{Feedback, InteractionLog};

/// Default number of points in the latency chart.
pub const DEFAULT_CHART_WINDOW: usize = 20;

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Mean `duration` rounded to the nearest millisecond (halves round up).
/// `0` for an empty slice.
pub fn average_latency(records: &[InteractionLog]) -> u64 {
    if records.is_empty() {
        return 0;
    }
    let total: u128 = records.iter().map(|r| u128::from(r.duration)).sum();
    let n = records.len() as u128;
    // round(total / n) == floor((2 * total + n) / (2 * n)) for non-negatives
    ((2 * total + n) / (2 * n)) as u64
}

/// Share of records with `up` feedback, as a rounded percentage.
/// `0` for an empty slice.
pub fn positive_rate(records: &[InteractionLog]) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let up = records
        .iter()
        .filter(|r| r.feedback == Some(Feedback::Up))
        .count() as u64;
    let n = records.len() as u64;
    ((200 * up + n) / (2 * n)) as u32
}

/// Number of distinct `user_id` values.
pub fn unique_users(records: &[InteractionLog]) -> usize {
    records
        .iter()
        .map(|r| r.user_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

/// One point of the latency chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    /// Time segment of the record's timestamp.
    pub time: String,
    /// Latency in milliseconds.
    pub latency: u64,
}

/// Reverse the store order, keep the last `window` entries of the reversed
/// sequence and project them to chart points.
///
/// With a newest-first store this yields the `window` oldest records, oldest
/// first. The ordering is kept exactly as the dashboard has always drawn it.
pub fn chart_series(records: &[InteractionLog], window: usize) -> Vec<ChartPoint> {
    let skip = records.len().saturating_sub(window);
    records
        .iter()
        .rev()
        .skip(skip)
        .map(|r| ChartPoint {
            time: r.time_segment().to_string(),
            latency: r.duration,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Records whose question, answer or user id contains `term`, ignoring case.
///
/// An empty term matches everything. Order is preserved.
pub fn filter<'a>(records: &'a [InteractionLog], term: &str) -> Vec<&'a InteractionLog> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| {
            [&r.question, &r.answer, &r.user_id]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Latency bands
// ---------------------------------------------------------------------------

/// Latency badge shown next to each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyBand {
    Fast,
    Slow,
}

impl LatencyBand {
    pub fn classify(duration: u64, slow_threshold_ms: u64) -> Self {
        if duration < slow_threshold_ms {
            Self::Fast
        } else {
            Self::Slow
        }
    }
}

// ---------------------------------------------------------------------------
// Full render pass
// ---------------------------------------------------------------------------

/// Everything a surface needs for one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub total_interactions: usize,
    pub average_latency_ms: u64,
    pub positive_rate_pct: u32,
    pub unique_users: usize,
    pub chart: Vec<ChartPoint>,
    pub search: String,
    pub rows: Vec<ViewRow>,
}

/// A table row: the record plus its latency band.
#[derive(Debug, Clone, Serialize)]
pub struct ViewRow {
    #[serde(flatten)]
    pub log: InteractionLog,
    pub band: LatencyBand,
}

impl DashboardView {
    /// Compute all aggregates over `records` and the filtered rows for `search`.
    ///
    /// Aggregates always cover the whole store; only the rows are filtered.
    pub fn compute(
        records: &[InteractionLog],
        search: &str,
        chart_window: usize,
        slow_threshold_ms: u64,
    ) -> Self {
        Self {
            total_interactions: records.len(),
            average_latency_ms: average_latency(records),
            positive_rate_pct: positive_rate(records),
            unique_users: unique_users(records),
            chart: chart_series(records, chart_window),
            search: search.to_string(),
            rows: filter(records, search)
                .into_iter()
                .map(|log| ViewRow {
                    band: LatencyBand::classify(log.duration, slow_threshold_ms),
                    log: log.clone(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn log(id: &str, user: &str, duration: u64, feedback: Option<Feedback>) -> InteractionLog {
        InteractionLog {
            id: id.to_string(),
            timestamp: format!("2026-10-17 10:00:{id:0>2}"),
            user_id: user.to_string(),
            question: format!("question {id}"),
            answer: format!("answer {id}"),
            duration,
            feedback,
        }
    }

    #[test]
    fn average_rounds_half_up() {
        let records = vec![log("1", "a", 1, None), log("2", "a", 2, None)];
        assert_eq!(average_latency(&records), 2);
        let records = vec![log("1", "a", 1, None), log("2", "a", 1, None), log("3", "a", 2, None)];
        assert_eq!(average_latency(&records), 1);
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average_latency(&[]), 0);
    }

    #[test]
    fn positive_rate_rounds() {
        let records = vec![
            log("1", "a", 1, Some(Feedback::Up)),
            log("2", "a", 1, None),
            log("3", "a", 1, Some(Feedback::Down)),
        ];
        // 33.33 -> 33
        assert_eq!(positive_rate(&records), 33);

        let records = vec![
            log("1", "a", 1, Some(Feedback::Up)),
            log("2", "a", 1, Some(Feedback::Up)),
            log("3", "a", 1, None),
        ];
        // 66.67 -> 67
        assert_eq!(positive_rate(&records), 67);
    }

    #[test]
    fn positive_rate_of_empty_is_zero() {
        assert_eq!(positive_rate(&[]), 0);
    }

    #[test]
    fn unique_users_counts_distinct_ids() {
        let records = vec![log("1", "a", 1, None), log("2", "b", 1, None), log("3", "a", 1, None)];
        assert_eq!(unique_users(&records), 2);
        assert_eq!(unique_users(&[]), 0);
    }

    #[test]
    fn chart_reverses_and_keeps_tail_of_reversal() {
        let records: Vec<_> = (1..=25).map(|i| log(&i.to_string(), "u", i, None)).collect();
        let series = chart_series(&records, 20);

        assert_eq!(series.len(), 20);
        // reversed: 25, 24, ..., 1; last 20 of that: 20, 19, ..., 1
        let latencies: Vec<_> = series.iter().map(|p| p.latency).collect();
        let expected: Vec<u64> = (1..=20).rev().collect();
        assert_eq!(latencies, expected);
    }

    #[test]
    fn chart_shorter_than_window_is_plain_reversal() {
        let records = vec![log("1", "u", 10, None), log("2", "u", 20, None)];
        let series = chart_series(&records, 20);
        assert_eq!(
            series,
            vec![
                ChartPoint { time: "10:00:02".into(), latency: 20 },
                ChartPoint { time: "10:00:01".into(), latency: 10 },
            ]
        );
    }

    #[test]
    fn filter_matches_any_field_case_insensitively() {
        let mut refund = log("1", "Alice", 1, None);
        refund.question = "How do I get a REFUND?".into();
        let mut shipping = log("2", "bob", 1, None);
        shipping.answer = "Shipping takes 3 days".into();
        let records = vec![refund, shipping, log("3", "carol", 1, None)];

        let ids = |term: &str| -> Vec<String> {
            filter(&records, term).into_iter().map(|r| r.id.clone()).collect()
        };

        assert_eq!(ids("refund"), vec!["1"]);
        assert_eq!(ids("SHIPPING"), vec!["2"]);
        assert_eq!(ids("alice"), vec!["1"]);
        assert!(ids("nothing-matches").is_empty());
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let records = vec![log("2", "u", 1, None), log("1", "u", 1, None)];
        let ids: Vec<_> = filter(&records, "").into_iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn latency_band_threshold_is_exclusive() {
        assert_eq!(LatencyBand::classify(999, 1000), LatencyBand::Fast);
        assert_eq!(LatencyBand::classify(1000, 1000), LatencyBand::Slow);
    }

    #[test]
    fn dashboard_view_aggregates_whole_store_and_filters_rows() {
        let records = vec![
            log("1", "alice", 500, None),
            log("2", "bob", 1500, Some(Feedback::Up)),
        ];
        let view = DashboardView::compute(&records, "bob", DEFAULT_CHART_WINDOW, 1000);

        assert_eq!(view.total_interactions, 2);
        assert_eq!(view.average_latency_ms, 1000);
        assert_eq!(view.positive_rate_pct, 50);
        assert_eq!(view.unique_users, 2);
        assert_eq!(view.chart.len(), 2);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].band, LatencyBand::Slow);
    }

    #[test]
    fn view_row_serializes_flat() {
        let records = vec![log("1", "alice", 500, None)];
        let view = DashboardView::compute(&records, "", DEFAULT_CHART_WINDOW, 1000);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["rows"][0]["id"], "1");
        assert_eq!(json["rows"][0]["band"], "fast");
        assert_eq!(json["rows"][0]["feedback"], serde_json::Value::Null);
    }
}
