//! SDK Manager
//!
//! Wraps `sdkmanager` to list, install and update SDK packages.

use std::path::PathBuf;

use androidtool_core::{AndroidToolError, CommandLine, CommandResult, CommandRunner, Result};
use tracing::{debug, info};

use crate::packages::PackageId;
use crate::parser::{self, LicenseStatus};

/// Android SDK Manager wrapper
pub struct SdkManager<'a, R> {
    runner: &'a R,
    sdkmanager_path: PathBuf,
    confirm_repeats: usize,
}

impl<'a, R: CommandRunner> SdkManager<'a, R> {
    /// `confirm_repeats` is how many `y` answers are fed to interactive prompts
    pub fn new(runner: &'a R, sdkmanager_path: impl Into<PathBuf>, confirm_repeats: usize) -> Self {
        Self {
            runner,
            sdkmanager_path: sdkmanager_path.into(),
            confirm_repeats,
        }
    }

    fn create_command(&self) -> CommandLine {
        CommandLine::new(&self.sdkmanager_path)
    }

    /// Run and turn a non-zero exit into `CommandFailed`
    async fn run_checked(&self, command: CommandLine) -> Result<CommandResult> {
        let result = self.runner.run(&command).await?;
        if !result.success() {
            return Err(AndroidToolError::command_failed(command.to_string(), &result));
        }
        Ok(result)
    }

    /// Full verbose listing of installed, available and obsolete packages
    pub async fn list(&self) -> Result<String> {
        debug!("Listing SDK packages...");

        let command = self
            .create_command()
            .args(["--verbose", "--list", "--include_obsolete"]);
        Ok(self.run_checked(command).await?.stdout)
    }

    /// Install packages in one batch, confirming every prompt
    pub async fn install(&self, packages: &[PackageId]) -> Result<CommandResult> {
        info!(
            "Installing packages: {}",
            packages
                .iter()
                .map(PackageId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let command = self
            .create_command()
            .args(["--verbose", "--install"])
            .args(packages.iter().map(PackageId::as_str))
            .answer_repeatedly("y", self.confirm_repeats);
        self.run_checked(command).await
    }

    /// Accept all pending SDK licenses
    pub async fn accept_licenses(&self) -> Result<LicenseStatus> {
        info!("Accepting Android SDK licenses...");

        let command = self
            .create_command()
            .arg("--licenses")
            .answer_repeatedly("y", self.confirm_repeats);
        let result = self.run_checked(command).await?;

        Ok(parser::license_status(&result.combined_output()))
    }

    /// Update every installed package, returning the updater's stdout
    pub async fn update(&self) -> Result<String> {
        info!("Updating installed packages...");

        let command = self.create_command().arg("--update");
        Ok(self.run_checked(command).await?.stdout)
    }
}
