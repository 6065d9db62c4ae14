//! Binary Locator
//!
//! Resolves the SDK tools androidtool drives. The SDK root is searched first,
//! then PATH. Each binary is resolved at most once per locator.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use androidtool_core::{AndroidToolError, AppConfig, Platform, Result};
use once_cell::sync::OnceCell;
use tracing::debug;

/// SDK tools androidtool knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binary {
    SdkManager,
    AvdManager,
    Emulator,
}

impl Binary {
    /// Executable name
    pub fn name(&self) -> &'static str {
        match self {
            Binary::SdkManager => "sdkmanager",
            Binary::AvdManager => "avdmanager",
            Binary::Emulator => "emulator",
        }
    }

    /// Locations under the SDK root, newest layout first
    pub fn relative_paths(&self) -> &'static [&'static [&'static str]] {
        match self {
            Binary::SdkManager => &[
                &["cmdline-tools", "latest", "bin", "sdkmanager"],
                &["tools", "bin", "sdkmanager"],
            ],
            Binary::AvdManager => &[
                &["cmdline-tools", "latest", "bin", "avdmanager"],
                &["tools", "bin", "avdmanager"],
            ],
            Binary::Emulator => &[&["emulator", "emulator"], &["tools", "emulator"]],
        }
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Finds SDK binaries and remembers where they are
#[derive(Debug)]
pub struct BinaryLocator {
    sdk_root: Option<PathBuf>,
    platform: Platform,
    search_path: Option<OsString>,
    sdkmanager: OnceCell<PathBuf>,
    avdmanager: OnceCell<PathBuf>,
    emulator: OnceCell<PathBuf>,
}

impl BinaryLocator {
    /// Create a locator for an explicit SDK root
    pub fn new(sdk_root: Option<PathBuf>, platform: Platform) -> Self {
        Self {
            sdk_root,
            platform,
            search_path: None,
            sdkmanager: OnceCell::new(),
            avdmanager: OnceCell::new(),
            emulator: OnceCell::new(),
        }
    }

    /// Create a locator from ANDROID_SDK_ROOT, ANDROID_HOME or the config file
    pub fn from_env(platform: Platform, config: &AppConfig) -> Self {
        let sdk_root = ["ANDROID_SDK_ROOT", "ANDROID_HOME"]
            .iter()
            .find_map(|var| env::var_os(var).filter(|v| !v.is_empty()))
            .map(PathBuf::from)
            .or_else(|| config.android.sdk_root.clone());

        match &sdk_root {
            Some(root) => debug!("Android SDK root is {:?}", root),
            None => debug!("ANDROID_SDK_ROOT is not set"),
        }

        Self::new(sdk_root, platform)
    }

    /// Search these directories instead of the process PATH
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// The SDK root in use, if any
    pub fn sdk_root(&self) -> Option<&Path> {
        self.sdk_root.as_deref()
    }

    /// Path to `binary`, resolved on first use
    pub fn locate(&self, binary: Binary) -> Result<&Path> {
        let cell = match binary {
            Binary::SdkManager => &self.sdkmanager,
            Binary::AvdManager => &self.avdmanager,
            Binary::Emulator => &self.emulator,
        };

        let path = cell.get_or_try_init(|| {
            let path = self.locate_uncached(binary)?;
            debug!("{} is located at {:?}", binary, path);
            Ok::<_, AndroidToolError>(path)
        })?;

        Ok(path.as_path())
    }

    fn locate_uncached(&self, binary: Binary) -> Result<PathBuf> {
        if let Some(path) = self.find_in_sdk_root(binary) {
            return Ok(path);
        }

        if !self.platform.is_supported() {
            debug!(
                "Not searching PATH for {} on unsupported OS {}",
                binary, self.platform.os
            );
            return Err(AndroidToolError::BinaryNotFound {
                binary: binary.name().to_string(),
            });
        }

        self.find_in_path(binary)
            .ok_or_else(|| AndroidToolError::BinaryNotFound {
                binary: binary.name().to_string(),
            })
    }

    fn find_in_sdk_root(&self, binary: Binary) -> Option<PathBuf> {
        let root = self.sdk_root.as_ref()?;

        for components in binary.relative_paths() {
            let candidate: PathBuf = components.iter().fold(root.clone(), |p, c| p.join(c));
            if candidate.is_file() {
                return Some(candidate);
            }
            debug!("{} not found at {:?}", binary, candidate);
        }

        None
    }

    fn find_in_path(&self, binary: Binary) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(binary.name(), Some(paths), cwd)
            }
            None => which::which(binary.name()),
        };

        match found {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("{} not in PATH: {}", binary, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use androidtool_core::OsFamily;
    use std::fs;

    fn linux() -> Platform {
        Platform {
            os: OsFamily::Linux,
            is_64bit: true,
        }
    }

    fn touch(root: &Path, rel: &[&str]) -> PathBuf {
        let path = rel.iter().fold(root.to_path_buf(), |p, c| p.join(c));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "#!/bin/sh\n").unwrap();
        path
    }

    fn empty_search_path() -> OsString {
        env::temp_dir()
            .join("androidtool-no-such-search-dir")
            .into_os_string()
    }

    #[test]
    fn test_finds_legacy_tools_layout() {
        let sdk = tempfile::tempdir().unwrap();
        let expected = touch(sdk.path(), &["tools", "bin", "sdkmanager"]);

        let locator = BinaryLocator::new(Some(sdk.path().to_path_buf()), linux())
            .with_search_path(empty_search_path());

        assert_eq!(locator.locate(Binary::SdkManager).unwrap(), expected);
    }

    #[test]
    fn test_prefers_cmdline_tools_over_legacy() {
        let sdk = tempfile::tempdir().unwrap();
        touch(sdk.path(), &["tools", "bin", "avdmanager"]);
        let expected = touch(sdk.path(), &["cmdline-tools", "latest", "bin", "avdmanager"]);

        let locator = BinaryLocator::new(Some(sdk.path().to_path_buf()), linux());

        assert_eq!(locator.locate(Binary::AvdManager).unwrap(), expected);
    }

    #[test]
    fn test_emulator_falls_back_to_tools_dir() {
        let sdk = tempfile::tempdir().unwrap();
        let expected = touch(sdk.path(), &["tools", "emulator"]);
        // A directory named like the binary is not a match
        fs::create_dir_all(sdk.path().join("emulator").join("emulator")).unwrap();

        let locator = BinaryLocator::new(Some(sdk.path().to_path_buf()), linux())
            .with_search_path(empty_search_path());

        assert_eq!(locator.locate(Binary::Emulator).unwrap(), expected);
    }

    #[test]
    fn test_result_is_memoized() {
        let sdk = tempfile::tempdir().unwrap();
        let path = touch(sdk.path(), &["tools", "bin", "sdkmanager"]);

        let locator = BinaryLocator::new(Some(sdk.path().to_path_buf()), linux())
            .with_search_path(empty_search_path());
        assert_eq!(locator.locate(Binary::SdkManager).unwrap(), path);

        fs::remove_file(&path).unwrap();
        assert_eq!(locator.locate(Binary::SdkManager).unwrap(), path);
    }

    #[test]
    fn test_missing_everywhere() {
        let sdk = tempfile::tempdir().unwrap();
        let locator = BinaryLocator::new(Some(sdk.path().to_path_buf()), linux())
            .with_search_path(empty_search_path());

        let err = locator.locate(Binary::AvdManager).unwrap_err();
        assert!(matches!(
            err,
            AndroidToolError::BinaryNotFound { ref binary } if binary == "avdmanager"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_fallback_without_sdk_root() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::tempdir().unwrap();
        let path = touch(bin.path(), &["sdkmanager"]);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let locator = BinaryLocator::new(None, linux()).with_search_path(bin.path());
        assert_eq!(locator.locate(Binary::SdkManager).unwrap(), path);
    }

    #[cfg(unix)]
    #[test]
    fn test_unsupported_os_skips_path() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::tempdir().unwrap();
        let path = touch(bin.path(), &["emulator"]);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let platform = Platform {
            os: OsFamily::Other("windows".into()),
            is_64bit: true,
        };
        let locator = BinaryLocator::new(None, platform).with_search_path(bin.path());

        assert!(locator.locate(Binary::Emulator).is_err());
    }

    #[test]
    fn test_config_root_used_when_env_unset() {
        let mut config = AppConfig::default();
        config.android.sdk_root = Some(PathBuf::from("/opt/android-sdk"));

        let locator = BinaryLocator::from_env(linux(), &config);
        if env::var_os("ANDROID_SDK_ROOT").is_none() && env::var_os("ANDROID_HOME").is_none() {
            assert_eq!(locator.sdk_root(), Some(Path::new("/opt/android-sdk")));
        } else {
            assert!(locator.sdk_root().is_some());
        }
    }
}
