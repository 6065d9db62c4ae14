//! CLI commands for androidtool
//!
//! Wires the parsed command line to the SDK controller and prints listings.

use std::fmt::Write as _;

use androidtool_core::{AndroidToolError, AppConfig, CommandRunner, Platform, SystemRunner};
use androidtool_toolchain::parser::{FlavorGroup, LicenseStatus};
use androidtool_toolchain::{BinaryLocator, Flavor, PackageId};
use anyhow::{bail, Result};
use tracing::{error, info};

use crate::cli::{Cli, Commands, CreateCommands, InstallCommands, ListCommands, StartCommands};
use crate::controller::{SdkController, UpdateOutcome};

/// Load configuration, build the controller and run the parsed command
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    let platform = Platform::current();
    let locator = BinaryLocator::from_env(platform.clone(), &config);
    let controller = SdkController::new(SystemRunner::new(), platform, locator, config);

    execute(&controller, cli.command, cli.verbose).await
}

/// Run one command against `controller`
pub async fn execute<R: CommandRunner>(
    controller: &SdkController<R>,
    command: Commands,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Doctor => doctor(controller).await,
        Commands::List { command } => list(controller, command).await,
        Commands::Install { command } => match command {
            InstallCommands::Basic { .. } => {
                let packages = controller.install_basic_packages().await?;
                info!("Installed packages [{}]", join(&packages));
                Ok(())
            }
            InstallCommands::Version {
                api_version,
                arch,
                flavor,
            } => {
                let packages = controller
                    .install_api_version(&api_version, arch.selected(), flavor.selected())
                    .await?;
                info!("Installed packages [{}]", join(&packages));
                Ok(())
            }
        },
        Commands::Update { .. } => update(controller).await,
        Commands::Create {
            command:
                CreateCommands::Avd {
                    name,
                    api_version,
                    arch,
                    flavor,
                },
        } => {
            controller
                .create_avd(&name, &api_version, arch.selected(), flavor.selected())
                .await?;
            Ok(())
        }
        Commands::Start {
            command: StartCommands::Avd { name, headless },
        } => start(controller, &name, headless, verbose).await,
    }
}

async fn doctor<R: CommandRunner>(controller: &SdkController<R>) -> Result<()> {
    let report = controller.doctor().await?;

    let missing: Vec<String> = report
        .missing_packages()
        .into_iter()
        .map(PackageId::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(AndroidToolError::PackagesMissing(missing).into());
    }

    info!("All basic packages are installed");
    Ok(())
}

async fn list<R: CommandRunner>(controller: &SdkController<R>, command: ListCommands) -> Result<()> {
    match command {
        ListCommands::Build { .. } => {
            for build_tool in controller.build_tools().await? {
                println!("{}", build_tool);
            }
        }
        ListCommands::Installed { .. } => {
            let installed = controller.installed_packages().await?;
            if installed.is_empty() {
                error!("No installed packages found");
            } else {
                println!("{}", installed.join("\n"));
            }
        }
        ListCommands::Api { arch, flavor, .. } => {
            let groups = controller
                .list_packages(arch.selected(), flavor.selected())
                .await?;
            print!("{}", format_groups(&groups));
        }
        ListCommands::Other { .. } => {
            println!("Installed Packages:");
            for line in controller.other_packages().await? {
                println!("{}", line);
            }
        }
        ListCommands::Avds => {
            println!("{}", controller.list_avds().await?);
        }
    }

    Ok(())
}

async fn update<R: CommandRunner>(controller: &SdkController<R>) -> Result<()> {
    match controller.update_all().await? {
        UpdateOutcome::Updated(output) => info!("{}", output.trim_end()),
        UpdateOutcome::UpToDate(LicenseStatus::AllAccepted) => info!("All licenses accepted"),
        UpdateOutcome::UpToDate(LicenseStatus::Pending {
            not_accepted,
            total,
        }) => info!("Accepted {} of {} SDK package licenses", not_accepted, total),
    }
    Ok(())
}

async fn start<R: CommandRunner>(
    controller: &SdkController<R>,
    name: &str,
    headless: bool,
    verbose: bool,
) -> Result<()> {
    match controller.start_avd(name, headless, verbose).await {
        Ok(_) => Ok(()),
        Err(AndroidToolError::CommandFailed { stdout, stderr, .. }) => {
            error!(
                "Failed to start emulator\nstdout:\n{}\n\nstderr:\n{}",
                stdout, stderr
            );
            match controller.list_avds().await {
                Ok(avds) => {
                    info!("List of valid virtual devices");
                    println!("{}", avds);
                }
                Err(e) => error!("Failed to list virtual devices: {}", e.user_message()),
            }
            bail!("Failed to start AVD \"{}\"", name)
        }
        Err(e) => Err(e.into()),
    }
}

fn join(packages: &[PackageId]) -> String {
    packages
        .iter()
        .map(PackageId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render grouped system images, one block per flavor
pub fn format_groups(groups: &[FlavorGroup]) -> String {
    let mut out = String::new();

    for group in groups {
        if group.flavor == Flavor::Default {
            out.push_str("Google API type: default (Standard Android image; no Google API)\n");
        } else {
            let _ = writeln!(out, "Google API type: {}", group.flavor);
        }

        for (arch, levels) in &group.arches {
            let levels: Vec<String> = levels.iter().map(u32::to_string).collect();
            let _ = writeln!(out, "{} -> {}", arch, levels.join(", "));
        }
        out.push('\n');
    }

    out
}
