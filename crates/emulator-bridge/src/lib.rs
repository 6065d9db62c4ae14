//! Android Emulator Bridge
//!
//! Creates and lists Android Virtual Devices (AVDs) through `avdmanager` and
//! boots them with the `emulator` binary.

pub mod avd;
pub mod emulator;

pub use avd::AvdManager;
pub use emulator::{EmulatorLauncher, EmulatorOptions};
