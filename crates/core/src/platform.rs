//! Host platform facts
//!
//! Reports the OS family and CPU word width androidtool runs on.

use std::fmt;

/// Operating system family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Mac,
    Other(String),
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => f.write_str("Linux"),
            OsFamily::Mac => f.write_str("macOS"),
            OsFamily::Other(name) => f.write_str(name),
        }
    }
}

/// Host OS family and word width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsFamily,
    pub is_64bit: bool,
}

impl Platform {
    /// Platform of the running binary
    pub fn current() -> Self {
        let os = if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else if cfg!(target_os = "macos") {
            OsFamily::Mac
        } else {
            OsFamily::Other(std::env::consts::OS.to_string())
        };

        Self {
            os,
            is_64bit: cfg!(target_pointer_width = "64"),
        }
    }

    pub fn on_linux(&self) -> bool {
        self.os == OsFamily::Linux
    }

    pub fn on_mac(&self) -> bool {
        self.os == OsFamily::Mac
    }

    /// Linux and Mac are the only hosts with a usable PATH fallback and JVM listing
    pub fn is_supported(&self) -> bool {
        self.on_linux() || self.on_mac()
    }
}
