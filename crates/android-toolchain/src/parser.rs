//! sdkmanager output parsing
//!
//! sdkmanager only speaks human-oriented text. These functions pull
//! structured data out of `sdkmanager --verbose --list --include_obsolete`
//! and the license/update flows. Text that matches nothing yields an empty
//! result, never an error.

use std::collections::BTreeSet;

use androidtool_core::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::packages::{Arch, Flavor};

const INSTALLED_MARKER: &str = "installed packages:";
const AVAILABLE_MARKER: &str = "available packages:";
const VIRTUAL_DEVICES_MARKER: &str = "Virtual Devices";

/// Metadata lines printed under each package in verbose listings
const METADATA_PREFIXES: &[&str] = &[
    "Description:",
    "Version:",
    "Installed Location:",
    "Installed Obsolete Packages:",
];

/// Families with their own listing commands, hidden from "list other packages"
const CATEGORIZED_PREFIXES: &[&str] = &[
    "system-images;",
    "platforms;",
    "sources;",
    "platform-tools",
    "build-tools;",
];

static BUILD_TOOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"build-tools;\S+").expect("Invalid build-tools regex"));

static LICENSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+) of (\d+) SDK package licenses not accepted")
        .expect("Invalid license regex")
});

static PACKAGE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][\w.\-]*(?:;[\w.\-]+)*$").expect("Invalid package path regex")
});

/// One requestable emulator image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemImageDescriptor {
    pub api_level: u32,
    pub flavor: Flavor,
    pub arch: Arch,
}

/// Restricts which system images are listed
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Prefix match, so `x86` also lists `x86_64`
    pub arch: Option<Arch>,
    /// Exact match
    pub flavor: Option<Flavor>,
}

impl ImageFilter {
    pub fn new(arch: Option<Arch>, flavor: Option<Flavor>) -> Self {
        Self { arch, flavor }
    }

    /// Regex matching a full system image package line
    pub fn pattern(&self) -> String {
        const ANY: &str = r"[^;\s]+";

        let flavor = self
            .flavor
            .as_ref()
            .map(|f| regex::escape(f.as_str()))
            .unwrap_or_else(|| ANY.to_string());
        let arch = self
            .arch
            .as_ref()
            .map(|a| format!(r"{}[^;\s]*", regex::escape(a.as_str())))
            .unwrap_or_else(|| ANY.to_string());

        format!(
            r"(?m)system-images;android-(\d+);({});({})[ \t\r]*$",
            flavor, arch
        )
    }
}

/// Result of the license acceptance flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseStatus {
    AllAccepted,
    Pending { not_accepted: u32, total: u32 },
}

/// System images of one flavor, grouped by architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorGroup {
    pub flavor: Flavor,
    pub arches: Vec<(Arch, Vec<u32>)>,
}

fn is_rule(line: &str) -> bool {
    line.starts_with("---")
}

/// Installed package identifiers, sorted and deduplicated
pub fn installed_packages(output: &str) -> Vec<String> {
    let mut lines = output.lines();

    // Everything up to and including the marker is skipped
    for line in lines.by_ref() {
        if line.to_lowercase().contains(INSTALLED_MARKER) {
            break;
        }
    }

    let mut installed = BTreeSet::new();
    for line in lines {
        if line.to_lowercase().contains(AVAILABLE_MARKER) {
            break;
        }

        let line = line.trim();
        if line.is_empty()
            || is_rule(line)
            || METADATA_PREFIXES.iter().any(|p| line.starts_with(p))
        {
            continue;
        }
        installed.insert(line.to_string());
    }

    installed.into_iter().collect()
}

/// Every system image line in the listing that passes `filter`
pub fn system_images(output: &str, filter: &ImageFilter) -> Result<Vec<SystemImageDescriptor>> {
    let pattern = filter.pattern();
    trace!("Package pattern: {}", pattern);
    let regex = Regex::new(&pattern)?;

    let images = regex
        .captures_iter(output)
        .filter_map(|caps| {
            Some(SystemImageDescriptor {
                api_level: caps[1].parse().ok()?,
                flavor: caps[2].parse().ok()?,
                arch: caps[3].parse().ok()?,
            })
        })
        .collect();

    Ok(images)
}

/// Group images as flavor -> arch -> API levels, keeping first-seen order
pub fn group_system_images(images: &[SystemImageDescriptor]) -> Vec<FlavorGroup> {
    let mut groups: Vec<FlavorGroup> = Vec::new();

    for image in images {
        let idx = match groups.iter().position(|g| g.flavor == image.flavor) {
            Some(idx) => idx,
            None => {
                groups.push(FlavorGroup {
                    flavor: image.flavor.clone(),
                    arches: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let arches = &mut groups[idx].arches;
        match arches.iter_mut().find(|(arch, _)| *arch == image.arch) {
            Some((_, levels)) => levels.push(image.api_level),
            None => arches.push((image.arch.clone(), vec![image.api_level])),
        }
    }

    groups
}

/// `build-tools;<version>` identifiers, sorted so the latest comes last
pub fn build_tools(output: &str) -> Vec<String> {
    BUILD_TOOLS
        .find_iter(output)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// License summary printed by `sdkmanager --licenses`
pub fn license_status(output: &str) -> LicenseStatus {
    LICENSES
        .captures(output)
        .and_then(|caps| {
            Some(LicenseStatus::Pending {
                not_accepted: caps[1].parse().ok()?,
                total: caps[2].parse().ok()?,
            })
        })
        .unwrap_or(LicenseStatus::AllAccepted)
}

/// Package names outside the families with dedicated listings
///
/// A line counts as a package name only when it follows a blank line or a
/// dash rule. Empty strings mark where a blank line goes before a category
/// header.
pub fn other_packages(output: &str) -> Vec<String> {
    let lines: Vec<&str> = output.split('\n').collect();
    let mut names = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        let is_package_name = match i.checked_sub(1) {
            None => true,
            Some(prev) => {
                let previous = lines[prev].trim();
                previous.is_empty() || is_rule(previous)
            }
        };

        if !is_package_name || line.is_empty() {
            continue;
        }
        trace!("Package name line \"{}\"", line);

        if CATEGORIZED_PREFIXES.iter().any(|p| line.starts_with(p)) || line.contains("Info:") {
            continue;
        }

        if line.ends_with(':') {
            names.push(String::new());
        }
        names.push(line.to_string());
    }

    names
}

/// Every package path appearing anywhere in a verbose listing
pub fn listed_packages(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|line| PACKAGE_PATH.is_match(line))
        .map(str::to_string)
        .collect()
}

/// Lines of `sdkmanager --update` output that report actual work
pub fn updated_lines(output: &str) -> Vec<&str> {
    output
        .split(|c: char| c == '\r' || c == '\n')
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('[')
                && !line.contains("Fetch remote repository")
                && !line.contains("Computing updates")
        })
        .collect()
}

/// `avdmanager list avd` output from the "Virtual Devices" header onward
pub fn virtual_devices_section(output: &str) -> &str {
    output
        .find(VIRTUAL_DEVICES_MARKER)
        .map(|start| &output[start..])
        .unwrap_or(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = include_str!("testdata/sdkmanager_verbose_list.txt");

    #[test]
    fn test_installed_packages_simple_block() {
        let output = "\
Installed packages:
  system-images;android-29;default;x86
  platforms;android-29
  build-tools;29.0.2
Available Packages:
  platforms;android-30
";
        assert_eq!(
            installed_packages(output),
            [
                "build-tools;29.0.2",
                "platforms;android-29",
                "system-images;android-29;default;x86",
            ]
        );
    }

    #[test]
    fn test_installed_packages_verbose_listing() {
        assert_eq!(
            installed_packages(LISTING),
            [
                "build-tools;28.0.3",
                "emulator",
                "platform-tools",
                "system-images;android-28;google_apis_playstore;x86_64",
                "tools",
            ]
        );
    }

    #[test]
    fn test_installed_packages_without_marker() {
        assert!(installed_packages("Available Packages:\nplatforms;android-29\n").is_empty());
        assert!(installed_packages("").is_empty());
    }

    #[test]
    fn test_installed_packages_marker_is_case_insensitive_and_dedups() {
        let output = "INSTALLED PACKAGES:\n---\nemulator\nemulator\n\nAVAILABLE PACKAGES:\n";
        assert_eq!(installed_packages(output), ["emulator"]);
    }

    #[test]
    fn test_system_images_unfiltered() {
        let images = system_images(LISTING, &ImageFilter::default()).unwrap();

        // Installed and available copies are both reported
        assert_eq!(images.len(), 7);
        assert_eq!(
            images[0],
            SystemImageDescriptor {
                api_level: 28,
                flavor: Flavor::GoogleApisPlaystore,
                arch: Arch::X86_64,
            }
        );
        assert!(images.contains(&SystemImageDescriptor {
            api_level: 29,
            flavor: Flavor::AndroidTv,
            arch: Arch::X86,
        }));
    }

    #[test]
    fn test_system_images_arch_filter_is_prefix() {
        let filter = ImageFilter::new(Some(Arch::X86), Some(Flavor::GoogleApis));
        let images = system_images(LISTING, &filter).unwrap();

        let found: Vec<(u32, &str)> = images
            .iter()
            .map(|i| (i.api_level, i.arch.as_str()))
            .collect();
        assert_eq!(found, [(23, "x86"), (29, "x86"), (29, "x86_64")]);
    }

    #[test]
    fn test_system_images_flavor_filter_is_exact() {
        let filter = ImageFilter::new(None, Some(Flavor::Default));
        let images = system_images(LISTING, &filter).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].api_level, 28);
    }

    #[test]
    fn test_group_system_images() {
        let images = system_images(LISTING, &ImageFilter::default()).unwrap();
        let groups = group_system_images(&images);

        let flavors: Vec<&str> = groups.iter().map(|g| g.flavor.as_str()).collect();
        assert_eq!(
            flavors,
            ["google_apis_playstore", "google_apis", "default", "android-tv"]
        );

        assert_eq!(groups[0].arches, [(Arch::X86_64, vec![28, 28])]);
        assert_eq!(
            groups[1].arches,
            [(Arch::X86, vec![23, 29]), (Arch::X86_64, vec![29])]
        );
    }

    #[test]
    fn test_build_tools_sorted_latest_last() {
        let output = "build-tools;29.0.0\nsomething\n  build-tools;28.0.3\nbuild-tools;29.0.0\n";
        assert_eq!(build_tools(output), ["build-tools;28.0.3", "build-tools;29.0.0"]);

        let tools = build_tools(LISTING);
        assert_eq!(tools.last().map(String::as_str), Some("build-tools;29.0.2"));
        assert_eq!(tools.len(), 3);
    }

    #[test]
    fn test_license_status() {
        assert_eq!(
            license_status("Info\n2 of 5 SDK package licenses not accepted.\nReview licenses"),
            LicenseStatus::Pending {
                not_accepted: 2,
                total: 5
            }
        );
        assert_eq!(
            license_status("All SDK package licenses accepted.\n"),
            LicenseStatus::AllAccepted
        );
    }

    #[test]
    fn test_other_packages() {
        assert_eq!(
            other_packages(LISTING),
            [
                "emulator",
                "",
                "Installed Obsolete Packages:",
                "tools",
                "",
                "Available Packages:",
                "add-ons;addon-google_apis-google-24",
                "emulator",
                "extras;android;m2repository",
                "extras;google;m2repository",
                "patcher;v4",
                "",
                "Available Obsolete Packages:",
                "tools",
                "",
                "Available Updates:",
                "emulator",
            ]
        );
    }

    #[test]
    fn test_listed_packages() {
        let listed = listed_packages(LISTING);
        assert!(listed.contains("patcher;v4"));
        assert!(listed.contains("system-images;android-29;android-tv;x86"));
        assert!(listed.contains("tools"));
        assert!(!listed.contains("Installed packages:"));
        assert!(!listed.iter().any(|p| p.starts_with("Description")));
    }

    #[test]
    fn test_updated_lines() {
        let nothing = "[=======                                ] 17% Fetch remote repository...\r\
[=======================================] 100% Computing updates...\n";
        assert!(updated_lines(nothing).is_empty());

        let updated = "Fetch remote repository...\nInstalling Android Emulator\ndone\n";
        assert_eq!(updated_lines(updated), ["Installing Android Emulator", "done"]);
    }

    #[test]
    fn test_virtual_devices_section() {
        let output = "Parsing /opt/sdk/package.xml\nAvailable Android Virtual Devices:\n    Name: Pixel\n";
        assert_eq!(
            virtual_devices_section(output),
            "Virtual Devices:\n    Name: Pixel\n"
        );
        assert_eq!(virtual_devices_section("nothing"), "nothing");
    }
}
