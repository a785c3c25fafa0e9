//! Python version numbers and inclusive version ranges.
//!
//! Versions are compared numerically via `major * 100 + minor`, so `3.10`
//! sorts after `3.9` (a lexicographic comparison would not).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::util::errors::DeployError;

/// A target Python `major.minor` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

/// The versions the metadata tables describe.
pub const SUPPORTED_VERSIONS: &[PythonVersion] = &[
    PythonVersion::new(2, 7),
    PythonVersion::new(3, 3),
    PythonVersion::new(3, 4),
    PythonVersion::new(3, 5),
    PythonVersion::new(3, 6),
    PythonVersion::new(3, 7),
];

impl PythonVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        PythonVersion { major, minor }
    }

    /// The numeric encoding used for comparisons.
    #[inline]
    pub const fn encoded(&self) -> u32 {
        self.major * 100 + self.minor
    }

    /// Check if this is one of the [`SUPPORTED_VERSIONS`].
    pub fn is_supported(&self) -> bool {
        SUPPORTED_VERSIONS.contains(self)
    }

    /// Return an error unless the version is supported.
    pub fn ensure_supported(&self) -> Result<(), DeployError> {
        if self.is_supported() {
            Ok(())
        } else {
            let supported: Vec<String> = SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect();
            Err(DeployError::config_in(
                format!("Python v{} is not supported", self),
                format!("supported versions: {}", supported.join(", ")),
            ))
        }
    }

    pub fn is_python3(&self) -> bool {
        self.major >= 3
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeployError::config(format!("'{}' is not a valid Python version", s));

        let mut parts = s.trim().split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

        // A patch level is accepted and ignored, anything more is not.
        if let Some(patch) = parts.next() {
            if patch.parse::<u32>().is_err() || parts.next().is_some() {
                return Err(invalid());
            }
        }

        Ok(PythonVersion { major, minor })
    }
}

impl Serialize for PythonVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PythonVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A closed interval of versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub min: PythonVersion,
    pub max: PythonVersion,
}

impl VersionRange {
    pub const fn new(min: (u32, u32), max: (u32, u32)) -> Self {
        VersionRange {
            min: PythonVersion::new(min.0, min.1),
            max: PythonVersion::new(max.0, max.1),
        }
    }

    /// A range covering every version.
    pub const fn all() -> Self {
        VersionRange::new((0, 0), (99, 99))
    }

    /// Check if `(major, minor)` lies within the range.
    pub fn contains(&self, major: u32, minor: u32) -> bool {
        let v = major * 100 + minor;
        self.min.encoded() <= v && v <= self.max.encoded()
    }

    pub fn contains_version(&self, version: PythonVersion) -> bool {
        self.contains(version.major, version.minor)
    }

    /// Check if two ranges share at least one version.
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.min.encoded() <= other.max.encoded() && other.min.encoded() <= self.max.encoded()
    }

    /// The supported versions that fall within this range.
    pub fn supported_versions(&self) -> impl Iterator<Item = PythonVersion> + '_ {
        SUPPORTED_VERSIONS
            .iter()
            .copied()
            .filter(move |v| self.contains_version(*v))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
