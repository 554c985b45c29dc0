//! Monitor Configuration Module
//!
//! Deployment settings loaded from TOML, passed explicitly to every
//! component at startup.
//!
//! ## Loading Order
//!
//! 1. `MONITOR_CONFIG` environment variable (path to TOML file)
//! 2. `monitor.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Then `MONITOR_SERVER_ADDR` / `MONITOR_DB_PATH`, then CLI flags.

mod monitor_config;
pub mod defaults;

pub use monitor_config::*;
