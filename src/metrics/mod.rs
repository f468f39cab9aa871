//! Ticket analytics
//!
//! [`MetricsStore`] is the only state shared between concurrent pipeline
//! runs. The aggregation functions in [`aggregate`] are pure and operate on
//! any snapshot slice.

pub mod aggregate;
mod store;

pub use store::MetricsStore;
