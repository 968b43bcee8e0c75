//! Configuration system for the Flaunch dashboard
//!
//! Layers built-in defaults, an optional JSON or YAML file and
//! `FLAUNCH_DASH__*` environment variables into a [`DashboardConfig`].

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{DashboardConfig, NetworkConfig, DEFAULT_MANAGER};
