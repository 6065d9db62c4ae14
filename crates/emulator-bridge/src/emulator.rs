//! Emulator Launcher
//!
//! Boots an AVD with the SDK's `emulator` binary and waits for it to exit.

use std::path::PathBuf;

use androidtool_core::{AndroidToolError, CommandLine, CommandResult, CommandRunner, Result};
use tracing::{debug, info};

/// Emulator launch options
#[derive(Debug, Clone)]
pub struct EmulatorOptions {
    /// Skip the boot animation
    pub no_boot_anim: bool,
    /// Run without a window
    pub no_window: bool,
    /// Emulator's own verbose logging
    pub verbose: bool,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self {
            no_boot_anim: true,
            no_window: false,
            verbose: false,
        }
    }
}

impl EmulatorOptions {
    /// Options for headless/CI environments
    pub fn headless() -> Self {
        Self {
            no_window: true,
            ..Default::default()
        }
    }

    /// Convert to command line arguments
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.no_boot_anim {
            args.push("-no-boot-anim".to_string());
        }

        if self.no_window {
            args.push("-no-window".to_string());
        }

        if self.verbose {
            args.push("-verbose".to_string());
        }

        args
    }
}

/// Emulator launcher
pub struct EmulatorLauncher<'a, R> {
    runner: &'a R,
    emulator_path: PathBuf,
}

impl<'a, R: CommandRunner> EmulatorLauncher<'a, R> {
    pub fn new(runner: &'a R, emulator_path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            emulator_path: emulator_path.into(),
        }
    }

    /// Boot `avd_name` and block until the emulator exits
    ///
    /// Runs from the directory holding the binary.
    pub async fn start(&self, avd_name: &str, options: &EmulatorOptions) -> Result<CommandResult> {
        info!("Starting emulator: {}", avd_name);

        let mut command = CommandLine::new(&self.emulator_path)
            .args(["-avd", avd_name])
            .args(options.to_args());

        if let Some(dir) = self.emulator_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            command = command.current_dir(dir);
        }

        let result = self.runner.run(&command).await?;
        if !result.success() {
            return Err(AndroidToolError::command_failed(command.to_string(), &result));
        }

        debug!("Emulator {} exited", avd_name);
        Ok(result)
    }
}
