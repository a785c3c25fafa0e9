//! Where the target Python installation lives.
//!
//! Every location can be set in the project. Anything not set is taken from
//! the standard layout of a sysroot:
//!
//! ```text
//! <sysroot>/include/pythonX.Y
//! <sysroot>/lib/libpythonX.Y.a      (pythonXY.lib on Windows)
//! <sysroot>/lib/pythonX.Y
//! <sysroot>/src/Python-X.Y
//! <sysroot>/bin/python
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::core::environment::Environment;
use crate::core::platform::Architecture;
use crate::core::project::Project;
use crate::core::version::PythonVersion;
use crate::util::errors::DeployError;
use crate::util::process::find_executable;

static PY_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^#define\s+PY_VERSION\s+"(\d+)\.(\d+)"#).expect("valid regex")
});

/// The resolved locations of the target Python installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub include_dir: PathBuf,
    pub library: PathBuf,
    pub stdlib_dir: PathBuf,
    /// The interpreter source tree, used for extension module sources.
    pub source_dir: PathBuf,
    /// A DLL to copy next to the executable (Windows only).
    pub dll: Option<PathBuf>,
    /// The host interpreter used to freeze modules.
    pub host_interpreter: Option<PathBuf>,
}

impl Locations {
    /// Compute the locations for a project and target.
    ///
    /// `interpreter` is the host interpreter from the configuration, used
    /// when the project does not name one.
    pub fn new(
        project: &Project,
        sysroot: Option<&Path>,
        arch: &Architecture,
        interpreter: Option<&Path>,
        env: &dyn Environment,
    ) -> Result<Self> {
        let version = project.python.version;
        let python = &project.python;
        let windows = arch.platform().is_windows();

        let locate = |value: &Option<PathBuf>, field: &str, default: &str| -> Result<PathBuf> {
            if let Some(path) = value {
                return Ok(project.resolve_path(path, sysroot, env));
            }

            match sysroot {
                Some(sysroot) => Ok(sysroot.join(default)),
                None => Err(DeployError::missing_with_help(
                    format!("the location of the target Python {} is not known", field),
                    format!("Pass --sysroot or set `{}` in the [python] section", field),
                )
                .into()),
            }
        };

        let library_default = if windows {
            format!("lib/python{}{}.lib", version.major, version.minor)
        } else {
            format!("lib/libpython{}.a", version)
        };

        let include_dir = locate(&python.include_dir, "include-dir", &format!("include/python{}", version))?;
        let library = locate(&python.library, "library", &library_default)?;
        let stdlib_dir = locate(&python.stdlib_dir, "stdlib-dir", &format!("lib/python{}", version))?;
        let source_dir = locate(&python.source_dir, "source-dir", &format!("src/Python-{}", version))?;

        let dll = match &python.dll {
            Some(dll) => Some(project.resolve_path(dll, sysroot, env)),
            None if windows => sysroot
                .map(|s| s.join("bin").join(format!("python{}{}.dll", version.major, version.minor)))
                .filter(|p| p.is_file()),
            None => None,
        };

        let host_interpreter = match &python.host_interpreter {
            Some(path) => Some(project.resolve_path(path, sysroot, env)),
            None => interpreter
                .map(Path::to_path_buf)
                .or_else(|| sysroot_interpreter(sysroot))
                .or_else(|| default_interpreter(version)),
        };

        let locations = Locations {
            include_dir,
            library,
            stdlib_dir,
            source_dir,
            dll,
            host_interpreter,
        };
        debug!("python locations: {:?}", locations);

        check_patchlevel(&locations.include_dir, version)?;

        Ok(locations)
    }

    /// The `-L` directory and `-l` name used to link the interpreter
    /// library.
    pub fn library_link(&self) -> (PathBuf, String) {
        let dir = self.library.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = self
            .library
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = stem.strip_prefix("lib").map(str::to_string).unwrap_or(stem);

        (dir, name)
    }

    /// The host interpreter, which must be known for freezing.
    pub fn require_host_interpreter(&self) -> Result<&Path, DeployError> {
        self.host_interpreter.as_deref().ok_or_else(|| {
            DeployError::missing_with_help(
                "unable to find a host Python interpreter",
                "Set `host-interpreter` in the [python] section or `interpreter` in the configuration",
            )
        })
    }
}

fn sysroot_interpreter(sysroot: Option<&Path>) -> Option<PathBuf> {
    let bin = sysroot?.join("bin");
    ["python", "python3", "python.exe"]
        .iter()
        .map(|name| bin.join(name))
        .find(|p| p.is_file())
}

fn default_interpreter(version: PythonVersion) -> Option<PathBuf> {
    find_executable(&format!("python{}", version))
        .or_else(|| find_executable(&format!("python{}", version.major)))
}

/// Check that an include directory is for the expected version.
///
/// Nothing is checked if there is no `patchlevel.h`.
pub fn check_patchlevel(include_dir: &Path, version: PythonVersion) -> Result<()> {
    let patchlevel = include_dir.join("patchlevel.h");
    if !patchlevel.is_file() {
        return Ok(());
    }

    let content = std::fs::read_to_string(&patchlevel)
        .with_context(|| format!("failed to read {}", patchlevel.display()))?;

    let found = PY_VERSION.captures(&content).and_then(|caps| {
        let major = caps[1].parse().ok()?;
        let minor = caps[2].parse().ok()?;
        Some(PythonVersion::new(major, minor))
    });

    match found {
        Some(found) if found == version => Ok(()),
        Some(found) => Err(DeployError::config_in(
            format!(
                "the target Python installation is v{} but the project is for v{}",
                found, version
            ),
            patchlevel.display().to_string(),
        )
        .into()),
        None => Err(DeployError::config_in(
            "unable to find PY_VERSION",
            patchlevel.display().to_string(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::MapEnv;
    use std::fs;
    use tempfile::TempDir;

    fn project(extra: &str) -> Project {
        let content = format!(
            "[application]\nscript = \"app.py\"\n[python]\nversion = \"3.6\"\n{}",
            extra
        );
        Project::parse(&content, Path::new("/work/pydeploy.toml")).unwrap()
    }

    #[test]
    fn test_sysroot_layout() {
        let arch = Architecture::find("linux-64").unwrap();
        let locations = Locations::new(
            &project(""),
            Some(Path::new("/sysroot")),
            arch,
            Some(Path::new("/usr/bin/python3.6")),
            &MapEnv::new(),
        )
        .unwrap();

        assert_eq!(locations.include_dir, Path::new("/sysroot/include/python3.6"));
        assert_eq!(locations.library, Path::new("/sysroot/lib/libpython3.6.a"));
        assert_eq!(locations.stdlib_dir, Path::new("/sysroot/lib/python3.6"));
        assert_eq!(locations.source_dir, Path::new("/sysroot/src/Python-3.6"));
        assert_eq!(locations.dll, None);
        assert_eq!(
            locations.library_link(),
            (PathBuf::from("/sysroot/lib"), "python3.6".to_string())
        );
    }

    #[test]
    fn test_windows_library_name() {
        let arch = Architecture::find("win-64").unwrap();
        let locations = Locations::new(
            &project(""),
            Some(Path::new("/sysroot")),
            arch,
            None,
            &MapEnv::new(),
        )
        .unwrap();

        assert_eq!(locations.library, Path::new("/sysroot/lib/python36.lib"));
        assert_eq!(locations.library_link().1, "python36");
    }

    #[test]
    fn test_project_overrides() {
        let arch = Architecture::find("linux-64").unwrap();
        let project = project("include-dir = \"$SYSROOT/inc\"\nstdlib-dir = \"stdlib\"\n");
        let locations = Locations::new(
            &project,
            Some(Path::new("/sysroot")),
            arch,
            None,
            &MapEnv::new(),
        )
        .unwrap();

        assert_eq!(locations.include_dir, Path::new("/sysroot/inc"));
        assert_eq!(locations.stdlib_dir, Path::new("/work/stdlib"));
    }

    #[test]
    fn test_no_sysroot() {
        let arch = Architecture::find("linux-64").unwrap();
        let err = Locations::new(&project(""), None, arch, None, &MapEnv::new()).unwrap_err();
        let err = err.downcast_ref::<DeployError>().unwrap();
        assert!(matches!(err, DeployError::MissingPrerequisite { .. }));
    }

    #[test]
    fn test_patchlevel_mismatch() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("patchlevel.h"),
            "#define PY_MAJOR_VERSION 3\n#define PY_VERSION      \"3.5.4\"\n",
        )
        .unwrap();

        assert!(check_patchlevel(tmp.path(), PythonVersion::new(3, 5)).is_ok());

        let err = check_patchlevel(tmp.path(), PythonVersion::new(3, 6)).unwrap_err();
        assert!(err.to_string().contains("is v3.5 but the project is for v3.6"));
    }

    #[test]
    fn test_missing_patchlevel_is_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(check_patchlevel(tmp.path(), PythonVersion::new(2, 7)).is_ok());
    }
}
