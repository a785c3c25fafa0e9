//! Test fixtures for a project and the sysroot it is built against.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::version::PythonVersion;
use crate::resolver::stdlib::ResolvedModuleSet;

/// A target Python installation laid out the way a sysroot is.
#[derive(Debug, Clone)]
pub struct SysrootFixture {
    pub version: PythonVersion,
    /// `(module name, is package)`
    pub modules: Vec<(String, bool)>,
    /// The version written to `patchlevel.h`, if any.
    pub patchlevel: Option<String>,
}

impl SysrootFixture {
    pub fn new(version: PythonVersion) -> Self {
        SysrootFixture {
            version,
            modules: Vec::new(),
            patchlevel: Some(format!("{}.0", version)),
        }
    }

    pub fn with_module(mut self, name: &str, package: bool) -> Self {
        self.modules.push((name.to_string(), package));
        self
    }

    /// Add the sources of every Python module in a resolve.
    pub fn with_resolved(mut self, resolved: &ResolvedModuleSet) -> Self {
        for module in resolved.python_modules.values() {
            self.modules.push((module.name.clone(), module.is_package()));
        }
        self
    }

    pub fn with_patchlevel(mut self, version: &str) -> Self {
        self.patchlevel = Some(version.to_string());
        self
    }

    /// Write the sysroot below `base` and return its path.
    pub fn write_to(&self, base: &Path) -> io::Result<PathBuf> {
        let root = base.join("sysroot");
        let version = self.version;

        let include = root.join(format!("include/python{}", version));
        fs::create_dir_all(&include)?;
        if let Some(patchlevel) = &self.patchlevel {
            fs::write(
                include.join("patchlevel.h"),
                format!("#define PY_MAJOR_VERSION {}\n#define PY_VERSION \"{}\"\n", version.major, patchlevel),
            )?;
        }

        fs::create_dir_all(root.join(format!("src/Python-{}/Modules", version)))?;
        fs::create_dir_all(root.join("bin"))?;
        fs::write(root.join(format!("lib/libpython{}.a", version)).with_parent_dirs()?, b"")?;

        let stdlib = root.join(format!("lib/python{}", version));
        fs::create_dir_all(&stdlib)?;
        for (name, package) in &self.modules {
            let name = name.replace('*', "_linux");
            let mut path: PathBuf = name.split('.').collect();
            if *package {
                path.push("__init__.py");
            } else {
                path.set_extension("py");
            }
            fs::write(stdlib.join(&path).with_parent_dirs()?, format!("# {}\n", name))?;
        }

        Ok(root)
    }
}

/// A project file and its application sources.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub name: String,
    pub version: PythonVersion,
    pub stdlib: Vec<String>,
    /// Extra TOML appended to the project file.
    pub extra: String,
    /// Files of the application package, relative to the package.
    pub package: Vec<(PathBuf, String)>,
}

impl ProjectFixture {
    pub fn new(name: &str, version: PythonVersion) -> Self {
        ProjectFixture {
            name: name.to_string(),
            version,
            stdlib: Vec::new(),
            extra: String::new(),
            package: Vec::new(),
        }
    }

    pub fn with_stdlib(mut self, modules: &[&str]) -> Self {
        self.stdlib.extend(modules.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_extra(mut self, toml: &str) -> Self {
        self.extra.push_str(toml);
        self.extra.push('\n');
        self
    }

    pub fn with_package_file(mut self, path: &str, content: &str) -> Self {
        self.package.push((PathBuf::from(path), content.to_string()));
        self
    }

    /// The text of the project file.
    pub fn toml(&self) -> String {
        let stdlib: Vec<String> = self.stdlib.iter().map(|m| format!("\"{}\"", m)).collect();
        let package = if self.package.is_empty() {
            String::new()
        } else {
            format!("package = \"{}_pkg\"\n", self.name)
        };

        format!(
            "[application]\nname = \"{name}\"\nscript = \"{name}.py\"\n{package}\n\
             [python]\nversion = \"{version}\"\nstdlib = [{stdlib}]\n\n{extra}",
            name = self.name,
            package = package,
            version = self.version,
            stdlib = stdlib.join(", "),
            extra = self.extra,
        )
    }

    /// Write the project below `base` and return the path of the project
    /// file.
    pub fn write_to(&self, base: &Path) -> io::Result<PathBuf> {
        let dir = base.join(&self.name);
        fs::create_dir_all(&dir)?;

        fs::write(dir.join(format!("{}.py", self.name)), "print('hello')\n")?;
        for (path, content) in &self.package {
            let file = dir.join(format!("{}_pkg", self.name)).join(path);
            fs::write(file.with_parent_dirs()?, content)?;
        }

        let project = dir.join("pydeploy.toml");
        fs::write(&project, self.toml())?;
        Ok(project)
    }
}

trait WithParentDirs: Sized {
    fn with_parent_dirs(self) -> io::Result<Self>;
}

impl WithParentDirs for PathBuf {
    /// Create the parent directories of a path.
    fn with_parent_dirs(self) -> io::Result<Self> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;
    use tempfile::TempDir;

    #[test]
    fn test_sysroot_layout() {
        let tmp = TempDir::new().unwrap();
        let root = SysrootFixture::new(PythonVersion::new(3, 6))
            .with_module("json", true)
            .with_module("json.decoder", false)
            .with_module("_sysconfigdata*", false)
            .write_to(tmp.path())
            .unwrap();

        assert!(root.join("include/python3.6/patchlevel.h").is_file());
        assert!(root.join("lib/libpython3.6.a").is_file());
        assert!(root.join("lib/python3.6/json/__init__.py").is_file());
        assert!(root.join("lib/python3.6/json/decoder.py").is_file());
        assert!(root.join("lib/python3.6/_sysconfigdata_linux.py").is_file());
        assert!(root.join("src/Python-3.6/Modules").is_dir());
    }

    #[test]
    fn test_project_parses() {
        let tmp = TempDir::new().unwrap();
        let path = ProjectFixture::new("demo", PythonVersion::new(3, 6))
            .with_stdlib(&["json"])
            .with_package_file("__init__.py", "")
            .write_to(tmp.path())
            .unwrap();

        let project = Project::load(&path).unwrap();
        assert_eq!(project.app_name(), "demo");
        assert_eq!(project.explicit_imports(), ["json"]);
        assert!(project.script_path().is_file());
        assert!(tmp.path().join("demo/demo_pkg/__init__.py").is_file());
    }
}
