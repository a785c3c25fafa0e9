//! The project file (`pydeploy.toml`).
//!
//! A project describes one application: its script, the target Python
//! version and the standard library and toolkit modules it imports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::environment::Environment;
use crate::core::version::PythonVersion;
use crate::metadata::external::{self, LibraryOverride};
use crate::metadata::toolkit::Binding;
use crate::util::diagnostic::suggestions;
use crate::util::errors::DeployError;

/// Default project file name.
pub const PROJECT_FILE: &str = "pydeploy.toml";

/// A loaded project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub application: Application,
    pub python: PythonSettings,
    pub toolkit: Option<ToolkitSettings>,
    pub external_libraries: BTreeMap<String, LibraryOverride>,
    pub extension_modules: Vec<ExtensionModule>,
    /// Directory containing the project file.
    pub project_dir: PathBuf,
}

/// `[application]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Application {
    pub name: Option<String>,
    pub script: PathBuf,
    /// Directory of additional Python files to bundle.
    pub package: Option<PathBuf>,
    /// `pkg.module:function`, used instead of running the script.
    pub entry_point: Option<String>,
    pub console: bool,
    pub sys_path: String,
}

/// `[python]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PythonSettings {
    pub version: PythonVersion,
    #[serde(default = "default_ssl")]
    pub ssl: bool,
    #[serde(default)]
    pub stdlib: Vec<String>,
    /// Imports the application makes that are not visible statically.
    #[serde(default)]
    pub hidden_imports: Vec<String>,
    #[serde(default)]
    pub host_interpreter: Option<PathBuf>,
    #[serde(default)]
    pub include_dir: Option<PathBuf>,
    #[serde(default)]
    pub library: Option<PathBuf>,
    #[serde(default)]
    pub stdlib_dir: Option<PathBuf>,
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub dll: Option<PathBuf>,
}

fn default_ssl() -> bool {
    true
}

/// `[toolkit]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolkitSettings {
    pub binding: Binding,
    #[serde(default)]
    pub modules: Vec<String>,
}

/// `[[extension-modules]]`: a third-party static extension module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionModule {
    pub name: String,
    /// Directory containing the static library.
    pub path: PathBuf,
}

impl ExtensionModule {
    /// The name of the static library, which is the last component of the
    /// dotted module name.
    pub fn lib_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Raw project file format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProject {
    application: Application,
    python: PythonSettings,
    #[serde(default)]
    toolkit: Option<ToolkitSettings>,
    #[serde(default)]
    external_libraries: BTreeMap<String, LibraryOverride>,
    #[serde(default)]
    extension_modules: Vec<ExtensionModule>,
}

impl Project {
    /// Load a project from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::missing_with_help(
                format!("unable to read the project file {}: {}", path.display(), e),
                suggestions::NO_PROJECT,
            )
        })?;

        Self::parse(&content, path)
    }

    /// Parse project content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawProject = toml::from_str(content).map_err(|e| {
            DeployError::config_in(
                format!("failed to parse project: {}", e.message()),
                path.display().to_string(),
            )
        })?;

        let project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        if raw.application.script.as_os_str().is_empty() {
            return Err(DeployError::config_in(
                "the application script is not set",
                format!("{}: [application] script", path.display()),
            )
            .into());
        }

        raw.python
            .version
            .ensure_supported()
            .map_err(|e| with_context(e, path, "[python] version"))?;

        for id in raw.external_libraries.keys() {
            if external::find(id).is_none() {
                return Err(DeployError::config_in(
                    format!("'{}' is not a known external library", id),
                    format!("{}: [external-libraries.{}]", path.display(), id),
                )
                .into());
            }
        }

        if let Some(entry_point) = &raw.application.entry_point {
            if !entry_point.contains(':') {
                return Err(DeployError::config_in(
                    format!("entry point '{}' must be written `module:function`", entry_point),
                    format!("{}: [application] entry-point", path.display()),
                )
                .into());
            }
        }

        Ok(Project {
            application: raw.application,
            python: raw.python,
            toolkit: raw.toolkit,
            external_libraries: raw.external_libraries,
            extension_modules: raw.extension_modules,
            project_dir,
        })
    }

    /// The application name, which defaults to the script's file stem.
    pub fn app_name(&self) -> String {
        if let Some(name) = self.application.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        self.application
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string())
    }

    /// Every module the application imports explicitly, sorted.
    pub fn explicit_imports(&self) -> Vec<String> {
        let mut imports: Vec<String> = self
            .python
            .stdlib
            .iter()
            .chain(&self.python.hidden_imports)
            .cloned()
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }

    /// The toolkit modules the application imports.
    pub fn toolkit_modules(&self) -> &[String] {
        self.toolkit.as_ref().map(|t| t.modules.as_slice()).unwrap_or(&[])
    }

    /// Expand variables in a path and make it absolute relative to the
    /// project directory.
    ///
    /// `$SYSROOT` is taken from `sysroot` when given, other variables from
    /// the environment. Unknown variables are left as they are.
    pub fn resolve_path(
        &self,
        path: &Path,
        sysroot: Option<&Path>,
        env: &dyn Environment,
    ) -> PathBuf {
        let expanded = expand_vars(&path.to_string_lossy(), |name| {
            if name == "SYSROOT" {
                if let Some(sysroot) = sysroot {
                    return Some(sysroot.to_string_lossy().into_owned());
                }
            }
            env.var(name)
        });

        let expanded = PathBuf::from(expanded);
        if expanded.is_absolute() {
            expanded
        } else {
            self.project_dir.join(expanded)
        }
    }

    /// The application script as an absolute path.
    pub fn script_path(&self) -> PathBuf {
        self.project_dir.join(&self.application.script)
    }
}

fn with_context(err: DeployError, path: &Path, field: &str) -> DeployError {
    match err {
        DeployError::Config { message, .. } => {
            DeployError::config_in(message, format!("{}: {}", path.display(), field))
        }
        other => other,
    }
}

/// Expand `$NAME` and `${NAME}` references.
pub fn expand_vars(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let (name, raw_len) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 1 + raw_len]),
        }
        rest = &after[raw_len..];
    }

    out.push_str(rest);
    out
}
