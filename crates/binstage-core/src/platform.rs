//! Target platform identifiers.

use serde::{Deserialize, Serialize};

/// Platform a host build is targeting.
///
/// The set mirrors what a host build system may hand us, not what the
/// manifest covers: a platform without a profile stages nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPlatform {
    /// 64-bit Windows.
    Win64,
    /// macOS (any architecture).
    Mac,
    /// x86_64 Linux.
    Linux,
    /// aarch64 Linux.
    LinuxArm64,
    /// Android.
    Android,
    /// iOS.
    Ios,
}

impl TargetPlatform {
    /// All known platforms, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Win64,
        Self::Mac,
        Self::Linux,
        Self::LinuxArm64,
        Self::Android,
        Self::Ios,
    ];

    /// Get the platform of the machine running this process, if it is one we know.
    #[must_use]
    pub fn current() -> Option<Self> {
        if cfg!(all(target_os = "windows", target_pointer_width = "64")) {
            Some(Self::Win64)
        } else if cfg!(target_os = "macos") {
            Some(Self::Mac)
        } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
            Some(Self::Linux)
        } else if cfg!(all(target_os = "linux", target_arch = "aarch64")) {
            Some(Self::LinuxArm64)
        } else if cfg!(target_os = "android") {
            Some(Self::Android)
        } else if cfg!(target_os = "ios") {
            Some(Self::Ios)
        } else {
            None
        }
    }

    /// Parse from string, accepting common aliases.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "win64" | "windows" | "windows64" | "windows-x64" => Some(Self::Win64),
            "mac" | "macos" | "darwin" | "osx" => Some(Self::Mac),
            "linux" | "linux-x86_64" | "linux64" => Some(Self::Linux),
            "linux-arm64" | "linux-aarch64" | "linuxarm64" => Some(Self::LinuxArm64),
            "android" => Some(Self::Android),
            "ios" => Some(Self::Ios),
            _ => None,
        }
    }

    /// Canonical name, as used for manifest keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Win64 => "win64",
            Self::Mac => "mac",
            Self::Linux => "linux",
            Self::LinuxArm64 => "linux-arm64",
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

impl std::fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown platform: {s}"))
    }
}
