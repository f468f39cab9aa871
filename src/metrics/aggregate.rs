//! Null-safe aggregation over metrics snapshots.
//!
//! Averages only count samples that are strictly positive. A ticket whose
//! confidence or response time is missing (recorded as 0.0) still counts
//! toward `total` but never drags an average down.

use std::collections::BTreeMap;

use crate::types::{MetricsSnapshot, MetricsSummary};

/// Message attached to the summary of an empty store
pub const EMPTY_SUMMARY_MESSAGE: &str = "No metrics yet";

/// Bucket name for snapshots without a category or priority
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Mean of the strictly positive values, `None` when there are none
pub fn positive_mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn average_confidence(snapshots: &[MetricsSnapshot]) -> Option<f64> {
    positive_mean(snapshots.iter().map(|s| s.confidence))
}

pub fn average_response_time(snapshots: &[MetricsSnapshot]) -> Option<f64> {
    positive_mean(snapshots.iter().map(|s| s.response_time))
}

/// Build the formatted summary
pub fn summarize(snapshots: &[MetricsSnapshot]) -> MetricsSummary {
    let total = snapshots.len();
    let escalated = snapshots.iter().filter(|s| s.escalated).count();
    let escalation_rate = if total == 0 {
        0.0
    } else {
        escalated as f64 / total as f64 * 100.0
    };

    MetricsSummary {
        message: (total == 0).then(|| EMPTY_SUMMARY_MESSAGE.to_string()),
        total,
        escalated,
        auto_resolved: total - escalated,
        escalation_rate: format!("{escalation_rate:.1}%"),
        avg_response_time: format!("{:.2}s", average_response_time(snapshots).unwrap_or(0.0)),
        avg_confidence: format!("{:.2}", average_confidence(snapshots).unwrap_or(0.0)),
    }
}

/// Ticket counts per category, with `unknown` for unclassified tickets
pub fn category_breakdown(snapshots: &[MetricsSnapshot]) -> BTreeMap<String, usize> {
    count_by(snapshots, |s| s.category.map(|c| c.as_str()))
}

/// Ticket counts per priority, with `unknown` for unclassified tickets
pub fn priority_breakdown(snapshots: &[MetricsSnapshot]) -> BTreeMap<String, usize> {
    count_by(snapshots, |s| s.priority.map(|p| p.as_str()))
}

fn count_by<F>(snapshots: &[MetricsSnapshot], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&MetricsSnapshot) -> Option<&'static str>,
{
    let mut counts = BTreeMap::new();
    for snapshot in snapshots {
        let bucket = key(snapshot).unwrap_or(UNKNOWN_BUCKET);
        *counts.entry(bucket.to_string()).or_insert(0) += 1;
    }
    counts
}
