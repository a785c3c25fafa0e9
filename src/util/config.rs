//! Configuration file support for pydeploy.
//!
//! pydeploy supports two configuration file locations:
//! - Global: `<config dir>/pydeploy/config.toml` - User-wide defaults
//! - Project: `.pydeploy/config.toml` next to the project file
//!
//! Project config takes precedence over global config, and command line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// pydeploy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Host Python settings
    pub python: PythonConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Default sysroot containing the target Python and Qt
    pub sysroot: Option<PathBuf>,

    /// Default optimisation level used when freezing (0, 1 or 2)
    pub opt: Option<u8>,

    /// Default number of resource files
    pub resources: Option<usize>,

    /// qmake to use (found on PATH if not set)
    pub qmake: Option<PathBuf>,

    /// Run make after qmake
    #[serde(default)]
    pub make: bool,

    /// Default build directory
    pub build_dir: Option<PathBuf>,
}

/// Host Python configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Host interpreter used to freeze Python modules
    pub interpreter: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.sysroot.is_some() {
            self.build.sysroot = other.build.sysroot;
        }
        if other.build.opt.is_some() {
            self.build.opt = other.build.opt;
        }
        if other.build.resources.is_some() {
            self.build.resources = other.build.resources;
        }
        if other.build.qmake.is_some() {
            self.build.qmake = other.build.qmake;
        }
        if other.build.make {
            self.build.make = true;
        }
        if other.build.build_dir.is_some() {
            self.build.build_dir = other.build.build_dir;
        }

        if other.python.interpreter.is_some() {
            self.python.interpreter = other.python.interpreter;
        }
    }

    /// Resolve relative paths in a project config against the project
    /// directory. Bare program names are left to be found on PATH.
    fn anchor(mut self, base: &Path) -> Self {
        for dir in [&mut self.build.sysroot, &mut self.build.build_dir]
            .into_iter()
            .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }

        for program in [&mut self.build.qmake, &mut self.python.interpreter]
            .into_iter()
            .flatten()
        {
            if program.is_relative() && program.components().count() > 1 {
                *program = base.join(&*program);
            }
        }

        self
    }
}

/// Get the global config path (`<config dir>/pydeploy/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pydeploy").map(|d| d.config_dir().join("config.toml"))
}

/// Get the project config path (`.pydeploy/config.toml`).
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".pydeploy").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.pydeploy/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_dir: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    let project_path = project_config_path(project_dir);
    if project_path.exists() {
        config.merge(Config::load_or_default(&project_path).anchor(project_dir));
    }

    config
}
