//! Analytics records: per-ticket snapshots and the aggregate summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Priority, TicketState};

/// Immutable outcome of one completed ticket, captured at the terminal stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub ticket_id: String,
    pub timestamp: DateTime<Utc>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    /// Seconds; 0.0 when the state carried no response time
    pub response_time: f64,
    /// 0.0 when the state carried no confidence
    pub confidence: f64,
    pub escalated: bool,
    pub escalation_reason: Option<String>,
}

impl MetricsSnapshot {
    /// Build a snapshot from whatever the state holds, defaulting absent values.
    pub fn from_state(state: &TicketState, timestamp: DateTime<Utc>) -> Self {
        Self {
            ticket_id: state.ticket_id().to_string(),
            timestamp,
            category: state.category(),
            priority: state.priority(),
            response_time: state.response_time().unwrap_or(0.0),
            confidence: state.confidence().unwrap_or(0.0),
            escalated: state.escalate().unwrap_or(false),
            escalation_reason: state.escalation_reason().map(str::to_string),
        }
    }
}

/// Aggregate view over all snapshots
///
/// Rates and averages are pre-formatted strings: `escalation_rate` as
/// `"12.5%"`, `avg_response_time` as `"1.23s"`, `avg_confidence` as `"0.85"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total: usize,
    pub escalated: usize,
    pub auto_resolved: usize,
    pub escalation_rate: String,
    pub avg_response_time: String,
    pub avg_confidence: String,
}
