// ProtonTrace - Automated graphics API trace capture for Steam/Proton games
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the CLI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use config::SettingsManager;
pub use metrics::Metrics;
pub use models::{Bitness, CaptureSettings, SessionPhase, Settings};
pub use ports::{EnvironmentPort, PollingStrategy, ProcessPort};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
