//! Application Configuration Module
//!
//! Loads `AppConfig` from TOML, then applies environment overrides.
//!
//! ## Loading Order
//!
//! 1. `TICKETFLOW_CONFIG` environment variable (path to TOML file)
//! 2. `ticketflow.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded value is passed explicitly to every component that needs it;
//! there is no process-wide config singleton.

mod app_config;
pub mod defaults;

pub use app_config::*;
