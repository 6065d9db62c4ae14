//! SDK controller
//!
//! Composes the binary locator, package resolver, output parser and tool
//! wrappers into the operations behind each subcommand.

use std::path::PathBuf;

use androidtool_core::{AndroidToolError, AppConfig, CommandResult, CommandRunner, Platform, Result};
use androidtool_emulator::{AvdManager, EmulatorLauncher, EmulatorOptions};
use androidtool_toolchain::packages::{self, system_image_package};
use androidtool_toolchain::parser::{self, FlavorGroup, ImageFilter, LicenseStatus};
use androidtool_toolchain::{
    ApiPackages, Arch, Binary, BinaryLocator, Flavor, JavaProbe, JavaStatus, PackageId,
    SdkManager,
};
use tracing::{debug, error, info};

/// What `doctor` found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub java_version: String,
    pub sdkmanager: PathBuf,
    /// Basic packages in install order, each with whether it is installed
    pub packages: Vec<(PackageId, bool)>,
}

impl DoctorReport {
    pub fn missing_packages(&self) -> Vec<&PackageId> {
        self.packages
            .iter()
            .filter(|(_, installed)| !installed)
            .map(|(package, _)| package)
            .collect()
    }
}

/// Result of `update all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// sdkmanager reported work; its output is kept for display
    Updated(String),
    /// Nothing to update, so the license flow ran instead
    UpToDate(LicenseStatus),
}

/// Runs SDK operations against one host
pub struct SdkController<R> {
    runner: R,
    platform: Platform,
    locator: BinaryLocator,
    config: AppConfig,
}

impl<R: CommandRunner> SdkController<R> {
    pub fn new(runner: R, platform: Platform, locator: BinaryLocator, config: AppConfig) -> Self {
        Self {
            runner,
            platform,
            locator,
            config,
        }
    }

    fn sdk_manager(&self) -> Result<SdkManager<'_, R>> {
        let path = self.locator.locate(Binary::SdkManager)?;
        Ok(SdkManager::new(
            &self.runner,
            path,
            self.config.install.confirm_repeats,
        ))
    }

    fn avd_manager(&self) -> Result<AvdManager<'_, R>> {
        let path = self.locator.locate(Binary::AvdManager)?;
        Ok(AvdManager::new(&self.runner, path))
    }

    fn emulator(&self) -> Result<EmulatorLauncher<'_, R>> {
        let path = self.locator.locate(Binary::Emulator)?;
        Ok(EmulatorLauncher::new(&self.runner, path))
    }

    async fn listing(&self) -> Result<String> {
        self.sdk_manager()?.list().await
    }

    /// Compare the default JDK against the configured version
    pub async fn check_java(&self) -> Result<JavaStatus> {
        JavaProbe::new(&self.runner, &self.platform)
            .check(self.config.java.required_version())
            .await
    }

    /// Turn anything but the required JDK into an actionable error
    async fn ensure_java(&self) -> Result<String> {
        let java = &self.config.java;

        match self.check_java().await? {
            JavaStatus::Ok { version } => {
                info!("Correct Java version {} is installed", version);
                Ok(version)
            }
            JavaStatus::NotInstalled => Err(AndroidToolError::JavaNotInstalled {
                required: java.required_version().to_string(),
                install_hint: java.install_hint(&self.platform).to_string(),
            }),
            JavaStatus::WrongDefault { default, required } => {
                Err(AndroidToolError::JavaVersionMismatch(format!(
                    "Java version {} is installed but default is set to Java {}.\n\
                     Set the correct java version via \"{}\"",
                    required,
                    default,
                    java.switch_hint(&self.platform)
                )))
            }
            JavaStatus::Missing { default, required } => {
                Err(AndroidToolError::JavaVersionMismatch(format!(
                    "Java version is {}, Android needs Java {}.\n\
                     Install it with \"{}\"\n\
                     And then set the default version via \"{}\"",
                    default,
                    required,
                    java.install_hint(&self.platform),
                    java.switch_hint(&self.platform)
                )))
            }
        }
    }

    /// Check Java, sdkmanager and the basic packages
    pub async fn doctor(&self) -> Result<DoctorReport> {
        info!("Checking java version...");
        let java_version = self.ensure_java().await?;

        info!("Checking SDK manager is installed...");
        let sdkmanager = self.locator.locate(Binary::SdkManager)?.to_path_buf();

        info!("Checking that basic Android packages are installed...");
        let installed = self.installed_packages().await?;
        let basic = self.basic_packages().await?;
        let total = basic.len();

        let packages = basic
            .into_iter()
            .enumerate()
            .map(|(i, package)| {
                let is_installed = installed.iter().any(|p| p == package.as_str());
                if is_installed {
                    info!("Package {}/{}: \"{}\" is installed", i + 1, total, package);
                } else {
                    error!("Basic package \"{}\" is not installed", package);
                }
                (package, is_installed)
            })
            .collect();

        Ok(DoctorReport {
            java_version,
            sdkmanager,
            packages,
        })
    }

    /// Build-tools packages, latest last
    pub async fn build_tools(&self) -> Result<Vec<String>> {
        let build_tools = parser::build_tools(&self.listing().await?);
        debug!("Build tools are {:?}", build_tools);
        Ok(build_tools)
    }

    pub async fn installed_packages(&self) -> Result<Vec<String>> {
        Ok(parser::installed_packages(&self.listing().await?))
    }

    /// System images grouped by flavor then arch
    pub async fn list_packages(
        &self,
        arch: Option<Arch>,
        flavor: Option<Flavor>,
    ) -> Result<Vec<FlavorGroup>> {
        debug!("List packages(arch: {:?}, flavor: {:?})", arch, flavor);

        let filter = ImageFilter::new(arch, flavor);
        let images = parser::system_images(&self.listing().await?, &filter)?;
        Ok(parser::group_system_images(&images))
    }

    pub async fn other_packages(&self) -> Result<Vec<String>> {
        Ok(parser::other_packages(&self.listing().await?))
    }

    pub async fn list_avds(&self) -> Result<String> {
        self.avd_manager()?.list_avds().await
    }

    async fn basic_packages(&self) -> Result<Vec<PackageId>> {
        let build_tools = self.build_tools().await?;
        let latest = build_tools.last().ok_or_else(|| {
            AndroidToolError::NothingFound("Build tools list is empty".to_string())
        })?;
        debug!("Latest build package is \"{}\"", latest);

        Ok(packages::basic_packages(latest, &self.platform))
    }

    pub async fn install_basic_packages(&self) -> Result<Vec<PackageId>> {
        let packages = self.basic_packages().await?;
        self.install_packages(&packages).await?;
        Ok(packages)
    }

    /// Install platform, sources, add-on and system image for one API level
    ///
    /// Without an explicit choice the image is the standard x86 one.
    pub async fn install_api_version(
        &self,
        level: &str,
        arch: Option<Arch>,
        flavor: Option<Flavor>,
    ) -> Result<Vec<PackageId>> {
        let arch = arch.unwrap_or(Arch::X86);
        let flavor = flavor.unwrap_or(Flavor::Default);

        let packages = ApiPackages::resolve(level, &flavor, &arch).to_install_list();
        self.install_packages(&packages).await?;
        Ok(packages)
    }

    async fn install_packages(&self, packages: &[PackageId]) -> Result<()> {
        let sdk = self.sdk_manager()?;

        if self.config.install.verify_packages {
            let listed = parser::listed_packages(&sdk.list().await?);
            if let Some(missing) = packages.iter().find(|p| !listed.contains(p.as_str())) {
                return Err(AndroidToolError::PackageNotFound(missing.to_string()));
            }
        }

        sdk.install(packages).await?;
        Ok(())
    }

    /// Create an AVD, installing its system image first
    ///
    /// Defaults to a Google APIs image for the host word width.
    pub async fn create_avd(
        &self,
        name: &str,
        level: &str,
        arch: Option<Arch>,
        flavor: Option<Flavor>,
    ) -> Result<PackageId> {
        let arch = arch.unwrap_or_else(|| Arch::native(&self.platform));
        let flavor = flavor.unwrap_or(Flavor::GoogleApis);

        let package = system_image_package(level, &flavor, &arch).ok_or_else(|| {
            AndroidToolError::PackageNotFound(format!("system image for API {}", level))
        })?;
        debug!("Package is {}", package);

        self.install_api_version(level, Some(arch), Some(flavor))
            .await?;

        info!("Creating AVD \"{}\" of type \"{}\"", name, package);
        self.avd_manager()?.create_avd(name, &package).await?;
        info!("AVD \"{}\" created successfully", name);

        Ok(package)
    }

    /// Update every installed package, accepting licenses when already current
    pub async fn update_all(&self) -> Result<UpdateOutcome> {
        let sdk = self.sdk_manager()?;
        let output = sdk.update().await?;

        if parser::updated_lines(&output).is_empty() {
            info!("No packages to update");
            let status = sdk.accept_licenses().await?;
            return Ok(UpdateOutcome::UpToDate(status));
        }

        Ok(UpdateOutcome::Updated(output))
    }

    /// Boot an AVD and wait for the emulator to exit
    pub async fn start_avd(&self, name: &str, headless: bool, verbose: bool) -> Result<CommandResult> {
        let mut options = if headless {
            EmulatorOptions::headless()
        } else {
            EmulatorOptions::default()
        };
        options.no_boot_anim = self.config.emulator.no_boot_anim;
        options.verbose = verbose;

        self.emulator()?.start(name, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use androidtool_core::process::ScriptedRunner;
    use androidtool_core::OsFamily;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const LISTING: &str =
        include_str!("../crates/android-toolchain/src/testdata/sdkmanager_verbose_list.txt");

    const MAC_JAVA_HOME: &str = "Matching Java Virtual Machines (2):\n\
    \x20\x20\x20\x2011.0.2, x86_64:\t\"OpenJDK 11.0.2\"\t/Library/Java/JavaVirtualMachines/openjdk-11.0.2.jdk/Contents/Home\n\
    \x20\x20\x20\x201.8.0, x86_64:\t\"Java SE 8\"\t/Library/Java/JavaVirtualMachines/jdk1.8.0.jdk/Contents/Home\n";

    fn fake_sdk() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for binary in [
            "cmdline-tools/latest/bin/sdkmanager",
            "cmdline-tools/latest/bin/avdmanager",
            "emulator/emulator",
        ] {
            let path = dir.path().join(binary);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        dir
    }

    fn controller(
        sdk: &Path,
        os: OsFamily,
        runner: ScriptedRunner,
        config: AppConfig,
    ) -> SdkController<ScriptedRunner> {
        let platform = Platform { os, is_64bit: true };
        let locator = BinaryLocator::new(Some(sdk.to_path_buf()), platform.clone())
            .with_search_path(sdk.join("no-such-dir"));
        SdkController::new(runner, platform, locator, config)
    }

    fn java_18() -> ScriptedRunner {
        ScriptedRunner::new().on(
            "java -version",
            CommandResult::new(0, "", "java version \"1.8.0_231\"\n"),
        )
    }

    #[tokio::test]
    async fn test_doctor_reports_missing_basic_packages() {
        let sdk = fake_sdk();
        let runner = java_18().on_stdout("sdkmanager --verbose --list", LISTING);
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let report = controller.doctor().await.unwrap();

        assert_eq!(report.java_version, "1.8");
        assert!(report.sdkmanager.ends_with("cmdline-tools/latest/bin/sdkmanager"));
        assert_eq!(report.packages.len(), 7);
        assert!(report
            .packages
            .contains(&(PackageId::from_listing("emulator"), true)));

        let missing: Vec<&str> = report
            .missing_packages()
            .into_iter()
            .map(PackageId::as_str)
            .collect();
        assert_eq!(
            missing,
            [
                "build-tools;29.0.2",
                "extras;android;m2repository",
                "extras;google;m2repository",
                "patcher;v4"
            ]
        );
    }

    #[tokio::test]
    async fn test_doctor_suggests_switching_java_on_mac() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new()
            .on(
                "java -version",
                CommandResult::new(0, "", "openjdk version \"11.0.2\" 2019-01-15\n"),
            )
            .on("java_home -V", CommandResult::new(0, "", MAC_JAVA_HOME));
        let controller = controller(sdk.path(), OsFamily::Mac, runner, AppConfig::default());

        let err = controller.doctor().await.unwrap_err();

        match err {
            AndroidToolError::JavaVersionMismatch(message) => {
                assert!(message.contains("installed but default is set to Java 11.0"));
                assert!(message.contains("java_home -v 1.8"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_doctor_without_java() {
        let sdk = fake_sdk();
        let controller = controller(
            sdk.path(),
            OsFamily::Linux,
            ScriptedRunner::new(),
            AppConfig::default(),
        );

        let err = controller.doctor().await.unwrap_err();
        assert!(matches!(err, AndroidToolError::JavaNotInstalled { .. }));
    }

    #[tokio::test]
    async fn test_install_api_version_defaults() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on_stdout("sdkmanager --verbose --install", "");
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let packages = controller
            .install_api_version("29", None, None)
            .await
            .unwrap();

        assert_eq!(
            packages.iter().map(PackageId::as_str).collect::<Vec<_>>(),
            [
                "platforms;android-29",
                "sources;android-29",
                "system-images;android-29;default;x86"
            ]
        );

        let calls = controller.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(&calls[0].args[..2], ["--verbose", "--install"]);
        assert_eq!(calls[0].args.len(), 5);
    }

    #[tokio::test]
    async fn test_install_verifies_packages_when_enabled() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new()
            .on_stdout("sdkmanager --verbose --list", LISTING)
            .on_stdout("sdkmanager --verbose --install", "");
        let mut config = AppConfig::default();
        config.install.verify_packages = true;
        let controller = controller(sdk.path(), OsFamily::Linux, runner, config);

        let err = controller
            .install_api_version("27", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AndroidToolError::PackageNotFound(p) if p == "platforms;android-27"));
        assert!(!controller
            .runner
            .invocations()
            .iter()
            .any(|call| call.contains("--install")));
    }

    #[tokio::test]
    async fn test_install_basic_packages_needs_build_tools() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on_stdout("sdkmanager --verbose --list", "Installed packages:\n");
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let err = controller.install_basic_packages().await.unwrap_err();
        assert!(matches!(err, AndroidToolError::NothingFound(_)));
    }

    #[tokio::test]
    async fn test_create_avd_prefers_playstore_image() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new()
            .on_stdout("sdkmanager --verbose --install", "")
            .on_stdout("avdmanager --verbose create avd", "");
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let package = controller
            .create_avd("pixel", "29", None, None)
            .await
            .unwrap();

        assert_eq!(
            package.as_str(),
            "system-images;android-29;google_apis_playstore;x86_64"
        );
        let invocations = controller.runner.invocations();
        assert_eq!(invocations.len(), 2);
        assert!(invocations[1].ends_with(
            "--name pixel --package system-images;android-29;google_apis_playstore;x86_64"
        ));
    }

    #[tokio::test]
    async fn test_create_avd_below_api_10() {
        let sdk = fake_sdk();
        let controller = controller(
            sdk.path(),
            OsFamily::Linux,
            ScriptedRunner::new(),
            AppConfig::default(),
        );

        let err = controller.create_avd("old", "9", None, None).await.unwrap_err();

        assert!(matches!(err, AndroidToolError::PackageNotFound(_)));
        assert!(controller.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_packages_filters_and_groups() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on_stdout("sdkmanager --verbose --list", LISTING);
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let groups = controller
            .list_packages(Some(Arch::X86), Some(Flavor::GoogleApis))
            .await
            .unwrap();

        assert_eq!(
            groups,
            [FlavorGroup {
                flavor: Flavor::GoogleApis,
                arches: vec![(Arch::X86, vec![23, 29]), (Arch::X86_64, vec![29])],
            }]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_extractors() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on(
            "sdkmanager --verbose --list",
            CommandResult::new(1, "", "Error: Failed to find package\n"),
        );
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let err = controller.build_tools().await.unwrap_err();
        assert!(matches!(err, AndroidToolError::CommandFailed { exit_code: 1, .. }));

        let err = controller.list_packages(None, None).await.unwrap_err();
        assert!(matches!(err, AndroidToolError::CommandFailed { exit_code: 1, .. }));

        let err = controller.installed_packages().await.unwrap_err();
        assert!(matches!(err, AndroidToolError::CommandFailed { exit_code: 1, .. }));
    }

    #[tokio::test]
    async fn test_start_avd_with_window() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on_stdout("emulator -avd", "");
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        controller.start_avd("pixel", false, false).await.unwrap();

        assert_eq!(
            controller.runner.invocations(),
            ["emulator -avd pixel -no-boot-anim"]
        );
    }

    #[tokio::test]
    async fn test_update_all_accepts_licenses_when_current() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new()
            .on_stdout(
                "sdkmanager --update",
                "[=======================================] 100% Computing updates...\r\n",
            )
            .on_stdout("sdkmanager --licenses", "All SDK package licenses accepted.\n");
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let outcome = controller.update_all().await.unwrap();

        assert_eq!(outcome, UpdateOutcome::UpToDate(LicenseStatus::AllAccepted));
        assert_eq!(
            controller.runner.invocations(),
            ["sdkmanager --update", "sdkmanager --licenses"]
        );
    }

    #[tokio::test]
    async fn test_update_all_returns_updater_output() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on_stdout(
            "sdkmanager --update",
            "Installing Android Emulator\ndone\n",
        );
        let controller = controller(sdk.path(), OsFamily::Linux, runner, AppConfig::default());

        let outcome = controller.update_all().await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(out) if out.contains("Android Emulator")));
    }

    #[tokio::test]
    async fn test_start_avd_honours_config() {
        let sdk = fake_sdk();
        let runner = ScriptedRunner::new().on_stdout("emulator -avd", "");
        let mut config = AppConfig::default();
        config.emulator.no_boot_anim = false;
        let controller = controller(sdk.path(), OsFamily::Linux, runner, config);

        controller.start_avd("pixel", true, true).await.unwrap();

        let calls = controller.runner.calls();
        assert_eq!(calls[0].invocation(), "emulator -avd pixel -no-window -verbose");
        assert_eq!(calls[0].cwd.as_deref(), Some(sdk.path().join("emulator").as_path()));
    }
}
