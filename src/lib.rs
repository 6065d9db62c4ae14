//! androidtool
//!
//! A friendlier command-line front end to the Android SDK tools
//! (`sdkmanager`, `avdmanager`, `emulator`).
//!
//! ## Architecture
//!
//! - `androidtool-core`: errors, configuration, platform facts and the process runner
//! - `androidtool-toolchain`: binary location, package names, sdkmanager output parsing, Java checks
//! - `androidtool-emulator`: avdmanager and emulator wrappers
//!
//! This crate holds the CLI definition and the [`controller::SdkController`]
//! that ties the pieces together.

#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod controller;

// Re-export workspace crates for library usage
pub use androidtool_core as shared;
pub use androidtool_emulator as emulator;
pub use androidtool_toolchain as toolchain;
