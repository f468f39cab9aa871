//! Core domain types for the support pipeline
//!
//! - `ticket`: `TicketState`, the write-once record threaded through every stage
//! - `metrics`: `MetricsSnapshot` and `MetricsSummary` for analytics

mod metrics;
mod ticket;

pub use metrics::*;
pub use ticket::*;
