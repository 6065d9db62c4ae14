//! Command-line interface
//!
//! Subcommands read as plain English (`androidtool list build tools`), so
//! the trailing words are positional values restricted to a single choice.

use std::path::PathBuf;

use androidtool_toolchain::{Arch, Flavor};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "androidtool",
    version,
    about = "A better version of the command-line android tool with a more intuitive command-line interface",
    after_help = "androidtool uses the ANDROID_SDK_ROOT environment variable to find the Android SDK, \
                  or expects sdkmanager, avdmanager and emulator to be on the PATH."
)]
pub struct Cli {
    /// Verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ensure the right version of Java, sdkmanager and the basic packages are installed
    Doctor,
    /// List build tools, API versions, packages or AVDs
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Install the basic packages or a particular API version
    Install {
        #[command(subcommand)]
        command: InstallCommands,
    },
    /// Update all installed packages to the latest versions
    Update {
        #[arg(value_name = "all", value_parser = ["all"])]
        target: String,
    },
    /// Create a new AVD, installing its system image if required
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },
    /// Start an existing AVD
    Start {
        #[command(subcommand)]
        command: StartCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// List available build tools
    Build {
        #[arg(value_name = "tools", value_parser = ["tools"])]
        noun: String,
    },
    /// List installed packages
    Installed {
        #[arg(value_name = "packages", value_parser = ["packages"])]
        noun: String,
    },
    /// List system images available to install
    Api {
        #[arg(value_name = "versions", value_parser = ["versions"])]
        noun: String,
        #[command(flatten)]
        arch: ArchArgs,
        #[command(flatten)]
        flavor: FlavorArgs,
    },
    /// List packages apart from build tools and API versions
    Other {
        #[arg(value_name = "packages", value_parser = ["packages"])]
        noun: String,
    },
    /// List existing AVDs
    Avds,
}

#[derive(Subcommand, Debug)]
pub enum InstallCommands {
    /// Install a basic set of tools, recommended on first use
    Basic {
        #[arg(value_name = "packages", value_parser = ["packages"])]
        noun: String,
    },
    /// Install a particular API version
    Version {
        /// Android API level, e.g. 29
        api_version: String,
        #[command(flatten)]
        arch: ArchArgs,
        #[command(flatten)]
        flavor: FlavorArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum CreateCommands {
    /// Create an AVD; defaults to a Google APIs image for the host word width
    Avd {
        name: String,
        /// Android API level, e.g. 29
        api_version: String,
        #[command(flatten)]
        arch: ArchArgs,
        #[command(flatten)]
        flavor: FlavorArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum StartCommands {
    /// Boot an existing AVD
    Avd {
        name: String,
        /// Run the emulator without a window
        #[arg(long)]
        headless: bool,
    },
}

/// System image architecture
#[derive(Args, Debug, Default, Clone)]
#[group(multiple = false)]
pub struct ArchArgs {
    #[arg(long = "x86_64")]
    pub x86_64: bool,
    #[arg(long)]
    pub x86: bool,
    /// armeabi-v7a
    #[arg(long)]
    pub arm: bool,
}

impl ArchArgs {
    pub fn selected(&self) -> Option<Arch> {
        if self.x86 {
            Some(Arch::X86)
        } else if self.arm {
            Some(Arch::ArmeabiV7a)
        } else if self.x86_64 {
            Some(Arch::X86_64)
        } else {
            None
        }
    }
}

/// System image flavor
#[derive(Args, Debug, Default, Clone)]
#[group(multiple = false)]
pub struct FlavorArgs {
    #[arg(long)]
    pub google_apis: bool,
    /// Standard Android image
    #[arg(long)]
    pub no_google_apis: bool,
    #[arg(long)]
    pub android_tv: bool,
    #[arg(long)]
    pub android_wear: bool,
}

impl FlavorArgs {
    pub fn selected(&self) -> Option<Flavor> {
        if self.no_google_apis {
            Some(Flavor::Default)
        } else if self.google_apis {
            Some(Flavor::GoogleApis)
        } else if self.android_tv {
            Some(Flavor::AndroidTv)
        } else if self.android_wear {
            Some(Flavor::AndroidWear)
        } else {
            None
        }
    }
}
