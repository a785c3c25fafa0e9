//! The target platform and architecture model.
//!
//! Platforms are a closed set. Each one owns its architectures, and an
//! architecture refers back to its platform by [`PlatformKind`]. The table is
//! built once and is read-only afterwards.

use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

use crate::util::errors::DeployError;

/// The supported platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Android,
    Ios,
    Linux,
    MacOs,
    Windows,
}

/// Which targets an architecture can build for when used as the host.
#[derive(Debug, Clone, Copy)]
enum HostRule {
    /// Only itself.
    SelfOnly,
    /// Itself plus any architecture of the listed platforms.
    AlsoPlatforms(&'static [PlatformKind]),
    /// Any architecture of its own platform.
    SamePlatform,
    /// Never a host.
    Never,
}

/// An environment variable a platform sets for the duration of a build.
#[derive(Debug, Clone, Copy)]
pub struct DeploymentTarget {
    pub var: &'static str,
    pub default: &'static str,
}

/// A target platform.
#[derive(Debug)]
pub struct Platform {
    pub kind: PlatformKind,
    /// The well known short name (`linux`, `win`, ...).
    pub name: &'static str,
    /// The name as presented to the user.
    pub full_name: &'static str,
    /// The C++ preprocessor symbol Qt defines for the platform.
    pub cpp_define: &'static str,
    /// The qmake scope that selects the platform.
    pub qmake_scope: &'static str,
    /// Environment variables that must be set before building.
    pub required_env: &'static [&'static str],
    /// The deployment target variable set if the user has not set it.
    pub deployment_target: Option<DeploymentTarget>,
    architectures: Vec<Architecture>,
}

/// One buildable target.
#[derive(Debug)]
pub struct Architecture {
    pub name: &'static str,
    pub pointer_width: u32,
    /// The qmake scope that selects this architecture.
    pub qmake_scope: &'static str,
    platform: PlatformKind,
    host_rule: HostRule,
}

impl PartialEq for Architecture {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Architecture {}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn arch(
    name: &'static str,
    platform: PlatformKind,
    pointer_width: u32,
    qmake_scope: &'static str,
    host_rule: HostRule,
) -> Architecture {
    Architecture {
        name,
        pointer_width,
        qmake_scope,
        platform,
        host_rule,
    }
}

// Defined in alphabetical order of the platform name.
static PLATFORMS: LazyLock<Vec<Platform>> = LazyLock::new(|| {
    use PlatformKind::*;

    vec![
        Platform {
            kind: Android,
            name: "android",
            full_name: "Android",
            cpp_define: "Q_OS_ANDROID",
            qmake_scope: "android",
            required_env: &[
                "ANDROID_NDK_ROOT",
                "ANDROID_NDK_PLATFORM",
                "ANDROID_NDK_TOOLCHAIN_VERSION",
            ],
            deployment_target: None,
            architectures: vec![arch("android-32", Android, 32, "android", HostRule::Never)],
        },
        Platform {
            kind: Ios,
            name: "ios",
            full_name: "iOS",
            cpp_define: "Q_OS_IOS",
            qmake_scope: "ios",
            required_env: &[],
            deployment_target: Some(DeploymentTarget {
                var: "IPHONEOS_DEPLOYMENT_TARGET",
                default: "8.0",
            }),
            architectures: vec![arch("ios-64", Ios, 64, "ios", HostRule::Never)],
        },
        Platform {
            kind: Linux,
            name: "linux",
            full_name: "Linux",
            cpp_define: "Q_OS_LINUX",
            qmake_scope: "linux-*",
            required_env: &[],
            deployment_target: None,
            architectures: vec![
                arch("linux-32", Linux, 32, "linux-*", HostRule::SelfOnly),
                arch(
                    "linux-64",
                    Linux,
                    64,
                    "linux-*",
                    HostRule::AlsoPlatforms(&[Android]),
                ),
            ],
        },
        Platform {
            kind: MacOs,
            name: "macos",
            full_name: "macOS",
            cpp_define: "Q_OS_MAC",
            qmake_scope: "macx",
            required_env: &[],
            deployment_target: Some(DeploymentTarget {
                var: "MACOSX_DEPLOYMENT_TARGET",
                default: "10.10",
            }),
            architectures: vec![arch(
                "macos-64",
                MacOs,
                64,
                "macx",
                HostRule::AlsoPlatforms(&[Android, Ios]),
            )],
        },
        Platform {
            kind: Windows,
            name: "win",
            full_name: "Windows",
            cpp_define: "Q_OS_WIN",
            qmake_scope: "win32",
            required_env: &[],
            deployment_target: None,
            architectures: vec![
                arch(
                    "win-32",
                    Windows,
                    32,
                    "win32:!contains(QMAKE_TARGET.arch, x86_64)",
                    HostRule::SamePlatform,
                ),
                arch(
                    "win-64",
                    Windows,
                    64,
                    "win32:contains(QMAKE_TARGET.arch, x86_64)",
                    HostRule::SamePlatform,
                ),
            ],
        },
    ]
});

impl Platform {
    /// All registered platforms.
    pub fn all() -> &'static [Platform] {
        &PLATFORMS
    }

    /// Find a platform by its short name.
    pub fn find(name: &str) -> Result<&'static Platform, DeployError> {
        Self::all()
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DeployError::UnknownPlatform {
                name: name.to_string(),
            })
    }

    /// The platform for a kind.
    pub fn of(kind: PlatformKind) -> &'static Platform {
        Self::all()
            .iter()
            .find(|p| p.kind == kind)
            .unwrap_or_else(|| unreachable!("every platform kind is registered"))
    }

    /// The architectures owned by this platform.
    pub fn architectures(&self) -> &[Architecture] {
        &self.architectures
    }

    pub fn is_windows(&self) -> bool {
        self.kind == PlatformKind::Windows
    }

    pub fn is_apple(&self) -> bool {
        matches!(self.kind, PlatformKind::MacOs | PlatformKind::Ios)
    }

    /// Convert a generic executable name to a platform-specific one.
    pub fn exe(&self, name: &str) -> String {
        if self.is_windows() {
            format!("{}.exe", name)
        } else {
            name.to_string()
        }
    }

    /// The name of the make executable used on this platform as a host.
    pub fn make(&self) -> &'static str {
        if self.is_windows() {
            "nmake"
        } else {
            "make"
        }
    }
}

impl Architecture {
    /// All registered architectures across every platform.
    pub fn all() -> impl Iterator<Item = &'static Architecture> {
        Platform::all().iter().flat_map(|p| p.architectures.iter())
    }

    /// Find an architecture by name.
    ///
    /// A platform name is accepted and selects the platform's first
    /// architecture. The deprecated `osx-` prefix is mapped to `macos-`.
    pub fn find(name: &str) -> Result<&'static Architecture, DeployError> {
        let name = match name.strip_prefix("osx-") {
            Some(rest) => format!("macos-{}", rest),
            None => name.to_string(),
        };

        if let Some(arch) = Self::all().find(|a| a.name == name) {
            return Ok(arch);
        }

        if let Some(platform) = Platform::all().iter().find(|p| p.name == name) {
            if let Some(first) = platform.architectures.first() {
                return Ok(first);
            }
        }

        Err(DeployError::UnknownArchitecture { name })
    }

    /// The architecture of the machine we are running on.
    pub fn host() -> Result<&'static Architecture, DeployError> {
        let platform = if cfg!(target_os = "linux") {
            "linux"
        } else if cfg!(target_os = "windows") {
            "win"
        } else if cfg!(target_os = "macos") {
            "macos"
        } else {
            return Err(DeployError::config(format!(
                "'{}' is not a supported host platform",
                std::env::consts::OS
            )));
        };

        Self::find(&format!("{}-{}", platform, usize::BITS))
    }

    /// The platform this architecture belongs to.
    pub fn platform(&self) -> &'static Platform {
        Platform::of(self.platform)
    }

    pub fn platform_kind(&self) -> PlatformKind {
        self.platform
    }

    /// Check if this architecture, used as the host, can build `target`.
    pub fn can_host(&self, target: &Architecture) -> bool {
        match self.host_rule {
            HostRule::Never => false,
            HostRule::SelfOnly => self == target,
            HostRule::AlsoPlatforms(kinds) => self == target || kinds.contains(&target.platform),
            HostRule::SamePlatform => target.platform == self.platform,
        }
    }
}
