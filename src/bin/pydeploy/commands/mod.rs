//! Command implementations

pub mod build;
pub mod check_metadata;
pub mod completions;
pub mod explain;
pub mod modules;
pub mod resolve;
pub mod targets;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::ProjectArgs;
use pydeploy::core::Architecture;
use pydeploy::ops::{resolve_project, Resolution};
use pydeploy::util::config::{global_config_path, load_config};
use pydeploy::util::Config;
use pydeploy::Project;

/// The directory containing a project file.
pub fn project_dir(project: &Path) -> PathBuf {
    match project.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Load the global and project configuration for a project file.
pub fn load_project_config(project: &Path) -> Config {
    load_config(global_config_path().as_deref(), &project_dir(project))
}

/// The requested architecture, or the host.
pub fn target(name: Option<&str>) -> Result<&'static Architecture> {
    Ok(match name {
        Some(name) => Architecture::find(name)?,
        None => Architecture::host()?,
    })
}

/// Load and resolve the selected project.
pub fn resolve_selected(args: &ProjectArgs) -> Result<Resolution> {
    let project = Project::load(&args.project)?;
    let target = target(args.target.as_deref())?;
    resolve_project(&project, target)
}
