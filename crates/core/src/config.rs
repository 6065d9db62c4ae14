//! Application Configuration
//!
//! Optional settings read from `config.toml`:
//! - Android SDK root fallback
//! - Required Java version and the hints shown when it is missing
//! - Install confirmation and package verification behavior
//! - Emulator launch flags

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AndroidToolError, Result};
use crate::platform::Platform;

/// Java version Android tooling expects
pub const JAVA_VERSION_FOR_ANDROID: &str = "1.8";

const JAVA8_INSTALL_COMMAND_FOR_MAC: &str = "brew cask install caskroom/versions/java8";
const SET_JAVA8_AS_DEFAULT_ON_MAC: &str = "export JAVA_HOME=$(/usr/libexec/java_home -v 1.8)";
const JAVA8_INSTALL_COMMAND_FOR_LINUX: &str = "sudo apt-get install openjdk-8-jdk";
const SET_JAVA8_AS_DEFAULT_ON_LINUX: &str = "sudo update-alternatives --config java";

/// Android SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// SDK root used when neither ANDROID_SDK_ROOT nor ANDROID_HOME is set
    pub sdk_root: Option<PathBuf>,
}

/// Java requirements
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaConfig {
    /// Required "major.minor" version
    pub required_version: Option<String>,
    /// Command suggested when the required JDK is missing
    pub install_hint: Option<String>,
    /// Command suggested when the required JDK is installed but not the default
    pub switch_hint: Option<String>,
}

impl JavaConfig {
    pub fn required_version(&self) -> &str {
        self.required_version
            .as_deref()
            .unwrap_or(JAVA_VERSION_FOR_ANDROID)
    }

    pub fn install_hint(&self, platform: &Platform) -> &str {
        self.install_hint.as_deref().unwrap_or(if platform.on_linux() {
            JAVA8_INSTALL_COMMAND_FOR_LINUX
        } else {
            JAVA8_INSTALL_COMMAND_FOR_MAC
        })
    }

    pub fn switch_hint(&self, platform: &Platform) -> &str {
        self.switch_hint.as_deref().unwrap_or(if platform.on_linux() {
            SET_JAVA8_AS_DEFAULT_ON_LINUX
        } else {
            SET_JAVA8_AS_DEFAULT_ON_MAC
        })
    }
}

/// Package installation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// How many "y" answers are piped into sdkmanager prompts
    pub confirm_repeats: usize,
    /// Check each package against the sdkmanager listing before installing
    pub verify_packages: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            confirm_repeats: 100,
            verify_packages: false,
        }
    }
}

/// Emulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Pass -no-boot-anim when starting an AVD
    pub no_boot_anim: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self { no_boot_anim: true }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub android: AndroidConfig,
    pub java: JavaConfig,
    pub install: InstallConfig,
    pub emulator: EmulatorConfig,
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "androidtool", "androidtool")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_file() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("Config file not found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AndroidToolError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        if config.install.confirm_repeats == 0 {
            return Err(AndroidToolError::Config(
                "install.confirm_repeats must be at least 1".into(),
            ));
        }
        Ok(config)
    }
}
