//! SDK package names
//!
//! Builds the exact identifiers sdkmanager expects, including the naming quirks
//! that changed between API levels. Nothing here touches the filesystem or
//! spawns a process.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use androidtool_core::Platform;
use tracing::debug;

use crate::{ADDON_API_LEVELS, MIN_SOURCES_API, MIN_SYSTEM_IMAGE_API};

/// A semicolon-delimited SDK package identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(String);

impl PackageId {
    /// Wrap an identifier taken verbatim from sdkmanager output
    pub fn from_listing(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Google API variant of a system image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flavor {
    Default,
    GoogleApis,
    GoogleApisPlaystore,
    AndroidTv,
    AndroidWear,
    Other(String),
}

impl Flavor {
    pub fn as_str(&self) -> &str {
        match self {
            Flavor::Default => "default",
            Flavor::GoogleApis => "google_apis",
            Flavor::GoogleApisPlaystore => "google_apis_playstore",
            Flavor::AndroidTv => "android-tv",
            Flavor::AndroidWear => "android-wear",
            Flavor::Other(name) => name,
        }
    }
}

impl FromStr for Flavor {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => Flavor::Default,
            "google_apis" => Flavor::GoogleApis,
            "google_apis_playstore" => Flavor::GoogleApisPlaystore,
            "android-tv" => Flavor::AndroidTv,
            "android-wear" => Flavor::AndroidWear,
            other => Flavor::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emulator CPU architecture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    ArmeabiV7a,
    Arm64V8a,
    Other(String),
}

impl Arch {
    pub fn as_str(&self) -> &str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::ArmeabiV7a => "armeabi-v7a",
            Arch::Arm64V8a => "arm64-v8a",
            Arch::Other(name) => name,
        }
    }

    /// Architecture matching the host word width
    pub fn native(platform: &Platform) -> Self {
        if platform.is_64bit {
            Arch::X86_64
        } else {
            Arch::X86
        }
    }
}

impl FromStr for Arch {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "x86" => Arch::X86,
            "x86_64" => Arch::X86_64,
            "armeabi-v7a" => Arch::ArmeabiV7a,
            "arm64-v8a" => Arch::Arm64V8a,
            other => Arch::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric API level, if the text is one
fn numeric_level(level: &str) -> Option<u32> {
    level.trim().parse().ok()
}

/// `platforms;android-{level}`
pub fn platform_package(level: &str) -> PackageId {
    PackageId(format!("platforms;android-{}", level))
}

/// `sources;android-{level}`, unavailable before API 14
pub fn sources_package(level: &str) -> Option<PackageId> {
    if let Some(n) = numeric_level(level) {
        if n < MIN_SOURCES_API {
            debug!("Sources are not available before API {}", MIN_SOURCES_API);
            return None;
        }
    }
    Some(PackageId(format!("sources;android-{}", level)))
}

/// Google APIs add-on, published only for a handful of legacy levels
pub fn addon_package(level: &str, flavor: &Flavor) -> Option<PackageId> {
    // The GDK and Google TV add-ons are deprecated and not offered
    match (flavor, numeric_level(level)) {
        (Flavor::GoogleApis, Some(n)) if ADDON_API_LEVELS.contains(&n) => Some(PackageId(
            format!("add-ons;addon-google_apis-google-{}", level),
        )),
        _ => None,
    }
}

/// System image package, preferring Play Store images once they exist for the arch
pub fn system_image_package(level: &str, flavor: &Flavor, arch: &Arch) -> Option<PackageId> {
    let mut flavor = flavor.clone();

    if let Some(n) = numeric_level(level) {
        if n < MIN_SYSTEM_IMAGE_API {
            debug!(
                "System images are bundled in the platform below API {}",
                MIN_SYSTEM_IMAGE_API
            );
            return None;
        }

        let playstore_from = match arch {
            Arch::X86 => Some(24),
            Arch::X86_64 => Some(28),
            _ => None,
        };
        if flavor == Flavor::GoogleApis && playstore_from.is_some_and(|min| n >= min) {
            flavor = Flavor::GoogleApisPlaystore;
        }
    }

    Some(PackageId(format!(
        "system-images;android-{};{};{}",
        level, flavor, arch
    )))
}

/// Everything needed to develop against one API level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPackages {
    pub platform: PackageId,
    pub sources: Option<PackageId>,
    pub addon: Option<PackageId>,
    pub system_image: Option<PackageId>,
}

impl ApiPackages {
    pub fn resolve(level: &str, flavor: &Flavor, arch: &Arch) -> Self {
        Self {
            platform: platform_package(level),
            sources: sources_package(level),
            addon: addon_package(level, flavor),
            system_image: system_image_package(level, flavor, arch),
        }
    }

    /// Packages to request, in install order
    pub fn to_install_list(&self) -> Vec<PackageId> {
        std::iter::once(self.platform.clone())
            .chain(self.sources.clone())
            .chain(self.addon.clone())
            .chain(self.system_image.clone())
            .collect()
    }
}

/// The basic tool set every SDK install needs
pub fn basic_packages(latest_build_tools: &str, platform: &Platform) -> Vec<PackageId> {
    let mut packages: Vec<PackageId> = [
        latest_build_tools,
        "emulator",
        "tools",
        "platform-tools",
        "extras;android;m2repository",
        "extras;google;m2repository",
        "patcher;v4",
    ]
    .into_iter()
    .map(PackageId::from_listing)
    .collect();

    // HAXM is only needed off Linux
    if !platform.on_linux() {
        packages.push(PackageId::from_listing(
            "extras;intel;Hardware_Accelerated_Execution_Manager",
        ));
    }

    packages
}
