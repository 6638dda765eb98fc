//! Application configuration
//!
//! This module provides:
//! - Configuration types (`AppConfig`)
//! - YAML loading functionality (`load_config`)
//! - Logging setup (`logging::init_logging`)

pub mod logging;
mod loader;
mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::{AppConfig, DEFAULT_MARKET};
