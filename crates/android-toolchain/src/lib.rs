//! Android Toolchain
//!
//! Handles everything androidtool knows about the SDK tooling itself:
//! - Locating sdkmanager, avdmanager and emulator
//! - Building SDK package identifiers
//! - Parsing sdkmanager listings
//! - Checking the installed Java version

pub mod jdk;
pub mod locator;
pub mod packages;
pub mod parser;
pub mod sdk_manager;

pub use jdk::{JavaProbe, JavaStatus};
pub use locator::{Binary, BinaryLocator};
pub use packages::{ApiPackages, Arch, Flavor, PackageId};
pub use parser::{FlavorGroup, ImageFilter, LicenseStatus, SystemImageDescriptor};
pub use sdk_manager::SdkManager;

/// API levels where the Google APIs add-on package was published
pub const ADDON_API_LEVELS: &[u32] = &[15, 16, 17, 18, 19, 21, 22, 23, 24];

/// First API level with a downloadable sources package
pub const MIN_SOURCES_API: u32 = 14;

/// Below this API level the system image ships inside the platform package
pub const MIN_SYSTEM_IMAGE_API: u32 = 10;
