//! Java version checks
//!
//! Android tooling needs a specific JDK. This module reads the default
//! `java -version` and lists the other JVMs installed on the host so the
//! user can be told whether to install a JDK or just switch the default.

use std::collections::BTreeSet;

use androidtool_core::{
    AndroidToolError, CommandLine, CommandResult, CommandRunner, OsFamily, Platform, Result,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, error, warn};

const JAVA_HOME_ON_MAC: &str = "/usr/libexec/java_home";

static QUOTED_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(\d+)(?:\.(\d+))?[^"\n]*""#).expect("Invalid quoted version regex")
});

static LINUX_JVM_DIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"java-(\d+)(?:\.(\d+))?[^/\s]*/").expect("Invalid JVM directory regex")
});

static MAC_JVM_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]+(\d+)(?:\.(\d+))?[\d._]*[,\s(]").expect("Invalid java_home regex")
});

/// Outcome of comparing the default JDK with the required one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaStatus {
    /// Default java is the required version
    Ok { version: String },
    /// No usable `java` on PATH
    NotInstalled,
    /// Required version is installed but another one is the default
    WrongDefault { default: String, required: String },
    /// Required version is not installed at all
    Missing { default: String, required: String },
}

/// "major.minor" with pre-9 releases in their legacy `1.x` form
fn normalize(major: u32, minor: Option<u32>) -> String {
    match (major, minor) {
        (1, Some(minor)) => format!("1.{}", minor),
        // java-8-openjdk, "Java SE 8"
        (major, None) if major <= 8 => format!("1.{}", major),
        (major, minor) => format!("{}.{}", major, minor.unwrap_or(0)),
    }
}

fn version_from(caps: &Captures<'_>) -> Option<String> {
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some(normalize(major, minor))
}

/// Version of the default JDK from `java -version` output
pub fn default_java_version(output: &str) -> Option<String> {
    QUOTED_VERSION
        .captures(output)
        .and_then(|caps| version_from(&caps))
}

/// Every JVM version mentioned in the OS-specific listing
pub fn installed_java_versions(os: &OsFamily, output: &str) -> BTreeSet<String> {
    let patterns: &[&Lazy<Regex>] = match os {
        OsFamily::Linux => &[&LINUX_JVM_DIR],
        OsFamily::Mac => &[&MAC_JVM_COLUMN, &QUOTED_VERSION],
        OsFamily::Other(_) => &[],
    };

    patterns
        .iter()
        .flat_map(|re| re.captures_iter(output))
        .filter_map(|caps| version_from(&caps))
        .collect()
}

/// Queries the host's Java installations
pub struct JavaProbe<'a, R> {
    runner: &'a R,
    platform: &'a Platform,
}

impl<'a, R: CommandRunner> JavaProbe<'a, R> {
    pub fn new(runner: &'a R, platform: &'a Platform) -> Self {
        Self { runner, platform }
    }

    /// Run a probe command, treating a missing binary or a failure as no answer
    async fn probe(&self, command: CommandLine) -> Result<Option<CommandResult>> {
        match self.runner.run(&command).await {
            Ok(result) if result.success() => Ok(Some(result)),
            Ok(result) => {
                debug!("{} exited with {}", command.invocation(), result.exit_code);
                Ok(None)
            }
            Err(AndroidToolError::BinaryNotFound { binary }) => {
                debug!("{} is not installed", binary);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Version of the default `java`, if there is one
    pub async fn default_version(&self) -> Result<Option<String>> {
        let Some(result) = self.probe(CommandLine::new("java").arg("-version")).await? else {
            error!("Failed to get java version");
            return Ok(None);
        };

        // java prints its version on stderr
        let version = default_java_version(&result.stderr)
            .or_else(|| default_java_version(&result.stdout));
        debug!("Default java version is {:?}", version);
        Ok(version)
    }

    /// Versions of every JVM installed on the host
    pub async fn installed_versions(&self) -> Result<BTreeSet<String>> {
        let command = match &self.platform.os {
            OsFamily::Linux => {
                CommandLine::new("update-alternatives").args(["--display", "java"])
            }
            OsFamily::Mac => CommandLine::new(JAVA_HOME_ON_MAC).arg("-V"),
            OsFamily::Other(name) => {
                error!("Unsupported operating system: {}", name);
                return Ok(BTreeSet::new());
            }
        };

        let Some(result) = self.probe(command).await? else {
            error!("Failed to list java versions");
            return Ok(BTreeSet::new());
        };

        let versions = installed_java_versions(&self.platform.os, &result.combined_output());
        debug!("Versions are {:?}", versions);
        Ok(versions)
    }

    /// Compare the default JDK against `required`
    pub async fn check(&self, required: &str) -> Result<JavaStatus> {
        let Some(default) = self.default_version().await? else {
            return Ok(JavaStatus::NotInstalled);
        };

        if default == required {
            return Ok(JavaStatus::Ok { version: default });
        }

        warn!("Default java is {}, Android needs {}", default, required);
        let status = if self.installed_versions().await?.contains(required) {
            JavaStatus::WrongDefault {
                default,
                required: required.to_string(),
            }
        } else {
            JavaStatus::Missing {
                default,
                required: required.to_string(),
            }
        };

        Ok(status)
    }
}
