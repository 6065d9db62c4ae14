//! AVD (Android Virtual Device) Manager
//!
//! Creates and lists Android Virtual Devices.

use std::path::PathBuf;

use androidtool_core::{AndroidToolError, CommandLine, CommandResult, CommandRunner, Result};
use androidtool_toolchain::{parser, PackageId};
use tracing::{debug, info};

/// AVD Manager
pub struct AvdManager<'a, R> {
    runner: &'a R,
    avdmanager_path: PathBuf,
}

impl<'a, R: CommandRunner> AvdManager<'a, R> {
    pub fn new(runner: &'a R, avdmanager_path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            avdmanager_path: avdmanager_path.into(),
        }
    }

    fn create_command(&self) -> CommandLine {
        CommandLine::new(&self.avdmanager_path).arg("--verbose")
    }

    async fn run_checked(&self, command: CommandLine) -> Result<CommandResult> {
        let result = self.runner.run(&command).await?;
        if !result.success() {
            return Err(AndroidToolError::command_failed(command.to_string(), &result));
        }
        Ok(result)
    }

    /// The "Virtual Devices" part of `avdmanager list avd`
    pub async fn list_avds(&self) -> Result<String> {
        debug!("Listing AVDs...");

        let command = self.create_command().args(["list", "avd"]);
        let result = self.run_checked(command).await?;

        Ok(parser::virtual_devices_section(&result.stdout).to_string())
    }

    /// Create an AVD from an installed system image
    ///
    /// avdmanager asks whether to create a custom hardware profile; the
    /// answer is always no.
    pub async fn create_avd(&self, name: &str, package: &PackageId) -> Result<CommandResult> {
        info!("Creating AVD: {}", name);

        let command = self
            .create_command()
            .args(["create", "avd", "--name", name, "--package", package.as_str()])
            .answer_repeatedly("no", 1);
        let result = self.run_checked(command).await?;

        info!("AVD created: {}", name);
        Ok(result)
    }
}
