//! Error types for androidtool
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for androidtool
#[derive(Error, Debug)]
pub enum AndroidToolError {
    #[error("{binary} not found, set ANDROID_SDK_ROOT to point to the Android SDK root")]
    BinaryNotFound { binary: String },

    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    #[error("`{command}` failed with exit code {exit_code}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Java is not installed. Install Java {required} via \"{install_hint}\"")]
    JavaNotInstalled {
        required: String,
        install_hint: String,
    },

    #[error("{0}")]
    JavaVersionMismatch(String),

    #[error("Package \"{0}\" not found")]
    PackageNotFound(String),

    #[error("Packages not installed: {}", .0.join(", "))]
    PackagesMissing(Vec<String>),

    #[error("{0}")]
    NothingFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for androidtool operations
pub type Result<T> = std::result::Result<T, AndroidToolError>;

impl AndroidToolError {
    /// Build a `CommandFailed` from a finished command
    pub fn command_failed(command: impl Into<String>, result: &crate::CommandResult) -> Self {
        AndroidToolError::CommandFailed {
            command: command.into(),
            exit_code: result.exit_code,
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AndroidToolError::CommandFailed {
                command,
                exit_code,
                stderr,
                ..
            } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("`{}` failed (return code: {})", command, exit_code)
                } else {
                    format!(
                        "`{}` failed (return code: {})\nstderr:\n{}",
                        command, exit_code, stderr
                    )
                }
            }
            AndroidToolError::Io(e) => format!("File operation failed: {}", e),
            AndroidToolError::TomlParse(e) => format!("Invalid config file: {}", e),
            _ => self.to_string(),
        }
    }
}
