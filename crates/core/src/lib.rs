//! androidtool core - shared types
//!
//! Errors, configuration, host platform facts and the process runner used by
//! every other androidtool crate.

pub mod config;
pub mod error;
pub mod platform;
pub mod process;

pub use config::AppConfig;
pub use error::{AndroidToolError, Result};
pub use platform::{OsFamily, Platform};
pub use process::{CommandLine, CommandResult, CommandRunner, SystemRunner};

/// androidtool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "androidtool";
