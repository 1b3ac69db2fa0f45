//! Target platform of an Xray build

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::UnsupportedPlatformError;

/// `(os, arch, abi)` as used in Xray release asset names
///
/// The ABI is empty for builds published without one, e.g. `Xray-linux-64.zip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub os: String,
    pub arch: String,
    #[serde(default)]
    pub abi: String,
}

impl PlatformDescriptor {
    pub fn new(os: impl Into<String>, arch: impl Into<String>, abi: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            abi: abi.into(),
        }
    }

    /// Detect the platform this process runs on
    pub fn detect() -> Result<Self, UnsupportedPlatformError> {
        let (os, arch, abi) = match (std::env::consts::OS, std::env::consts::ARCH) {
            ("linux", "x86_64") => ("linux", "64", ""),
            ("linux", "x86") => ("linux", "32", ""),
            ("linux", "aarch64") => ("linux", "arm64", "v8a"),
            ("linux", "arm") => ("linux", "arm32", "v7a"),
            ("macos", "x86_64") => ("macos", "64", ""),
            ("macos", "aarch64") => ("macos", "arm64", "v8a"),
            ("windows", "x86_64") => ("windows", "64", ""),
            ("windows", "x86") => ("windows", "32", ""),
            ("windows", "aarch64") => ("windows", "arm64", "v8a"),
            ("freebsd", "x86_64") => ("freebsd", "64", ""),
            ("android", "aarch64") => ("android", "arm64", "v8a"),
            (os, arch) => {
                return Err(UnsupportedPlatformError {
                    platform: Self::new(os, arch, ""),
                });
            }
        };
        Ok(Self::new(os, arch, abi))
    }

    /// `os-arch[-abi]`, the platform part of archive and cache names
    pub fn slug(&self) -> String {
        [self.os.as_str(), self.arch.as_str(), self.abi.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Name of the executable inside the release archive
    pub fn archive_entry(&self) -> &'static str {
        if self.is_windows() { "xray.exe" } else { "xray" }
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}
