//! Freezing Python modules into Qt resource files.
//!
//! Frozen modules are written under `resources/` in the build directory and
//! listed in one or more `.qrc` files. Large applications can split them
//! over several files to keep `rcc` output to a manageable size.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::builder::freeze::Freezer;
use crate::metadata::module::ModuleVariant;
use crate::resolver::stdlib::ResolvedModuleSet;
use crate::util::errors::DeployError;
use crate::util::fs::{ensure_dir, find_files, find_unique_match, to_slash, write_bytes, write_string};

pub const RESOURCES_DIR: &str = "resources";

/// A Python source file and where its frozen form goes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrozenFile {
    /// Path relative to the resources directory, with `/` separators.
    pub resource: String,
    pub source: PathBuf,
}

/// Find the source of a module in the standard library directory.
///
/// Returns the path relative to `stdlib_dir`.
pub fn locate_module(stdlib_dir: &Path, module: &ModuleVariant) -> Result<PathBuf> {
    let relative: PathBuf = module.name.split('.').collect();

    if module.is_wildcard() {
        let mut pattern = stdlib_dir.join(&relative).into_os_string();
        pattern.push(".py");
        let found = find_unique_match(Path::new(&pattern))?;

        return found
            .strip_prefix(stdlib_dir)
            .map(Path::to_path_buf)
            .with_context(|| format!("{} is not in {}", found.display(), stdlib_dir.display()));
    }

    let package = relative.join("__init__.py");
    let file = relative.with_extension("py");
    if stdlib_dir.join(&package).is_file() {
        return Ok(package);
    }
    if !module.is_package() && stdlib_dir.join(&file).is_file() {
        return Ok(file);
    }

    Err(DeployError::config_in(
        format!("unable to find the source of `{}`", module.name),
        stdlib_dir.display().to_string(),
    )
    .into())
}

/// The standard library modules to freeze.
pub fn stdlib_files(stdlib_dir: &Path, resolved: &ResolvedModuleSet) -> Result<Vec<FrozenFile>> {
    resolved
        .python_modules
        .values()
        .map(|module| {
            let relative = locate_module(stdlib_dir, module)?;
            Ok(FrozenFile {
                resource: format!("stdlib/{}", to_slash(&relative.with_extension("pyo"))),
                source: stdlib_dir.join(relative),
            })
        })
        .collect()
}

/// The files of an application package to freeze.
pub fn package_files(package_dir: &Path) -> Result<Vec<FrozenFile>> {
    let name = package_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            DeployError::config_in(
                format!("'{}' is not a package directory", package_dir.display()),
                "[application] package",
            )
        })?;

    if !package_dir.is_dir() {
        return Err(DeployError::config_in(
            format!("the package directory '{}' does not exist", package_dir.display()),
            "[application] package",
        )
        .into());
    }

    Ok(find_files(package_dir, "py")?
        .into_iter()
        .map(|relative| FrozenFile {
            resource: format!("app/{}/{}", name, to_slash(&relative.with_extension("pyo"))),
            source: package_dir.join(relative),
        })
        .collect())
}

/// Freeze files into the resources directory and write `count` `.qrc`
/// files listing them.
///
/// Returns the `.qrc` files relative to the build directory.
pub fn write_resources(
    build_dir: &Path,
    files: &[FrozenFile],
    freezer: &dyn Freezer,
    count: usize,
) -> Result<Vec<String>> {
    let resources_dir = build_dir.join(RESOURCES_DIR);
    ensure_dir(&resources_dir)?;

    let mut files: Vec<&FrozenFile> = files.iter().collect();
    files.sort();
    files.dedup_by(|a, b| a.resource == b.resource);

    info!("freezing {} modules", files.len());
    for file in &files {
        let code = freezer.freeze(&file.source)?;
        write_bytes(&resources_dir.join(&file.resource), &code)?;
    }

    let count = count.max(1);
    let mut qrcs = Vec::with_capacity(count);
    for i in 0..count {
        let listed = files
            .iter()
            .skip(i)
            .step_by(count)
            .map(|f| f.resource.as_str());

        let name = format!("pydeploy{}.qrc", i);
        write_string(&resources_dir.join(&name), &qrc(listed))?;
        qrcs.push(format!("{}/{}", RESOURCES_DIR, name));
    }
    debug!("wrote {} resource files", qrcs.len());

    Ok(qrcs)
}

/// The text of a `.qrc` file.
pub fn qrc<'a>(files: impl IntoIterator<Item = &'a str>) -> String {
    let mut xml = String::from("<!DOCTYPE RCC>\n<RCC version=\"1.0\">\n    <qresource>\n");
    for file in files {
        let _ = writeln!(xml, "        <file>{}</file>", escape(file));
    }
    xml.push_str("    </qresource>\n</RCC>\n");
    xml
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::module::{ModuleDef, ModuleKind, ModuleTable};
    use crate::test_support::MockFreezer;
    use std::fs;
    use tempfile::TempDir;

    fn variant(def: ModuleDef) -> ModuleVariant {
        let name = def.name;
        ModuleTable::new([def]).unwrap().variants(name)[0].clone()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_locate_module() {
        let tmp = TempDir::new().unwrap();
        let stdlib = tmp.path();
        touch(&stdlib.join("json/__init__.py"));
        touch(&stdlib.join("json/decoder.py"));
        touch(&stdlib.join("os.py"));
        touch(&stdlib.join("_sysconfigdata_m_linux.py"));

        let locate = |def| locate_module(stdlib, &variant(def)).unwrap();

        assert_eq!(
            locate(ModuleDef::new("json", ModuleKind::PythonSource).submodules(&["json.decoder"])),
            Path::new("json/__init__.py")
        );
        assert_eq!(
            locate(ModuleDef::new("json.decoder", ModuleKind::PythonSource)),
            Path::new("json/decoder.py")
        );
        assert_eq!(locate(ModuleDef::new("os", ModuleKind::CorePythonSource)), Path::new("os.py"));
        assert_eq!(
            locate(ModuleDef::new("_sysconfigdata*", ModuleKind::PythonSource)),
            Path::new("_sysconfigdata_m_linux.py")
        );
    }

    #[test]
    fn test_missing_module_names_stdlib_dir() {
        let tmp = TempDir::new().unwrap();
        let err = locate_module(
            tmp.path(),
            &variant(ModuleDef::new("codecs", ModuleKind::CorePythonSource)),
        )
        .unwrap_err();

        let err = err.downcast_ref::<DeployError>().unwrap();
        assert!(err.is_config());
        assert!(err.to_diagnostic().format(false).contains(&tmp.path().display().to_string()));
    }

    #[test]
    fn test_package_files() {
        let tmp = TempDir::new().unwrap();
        let package = tmp.path().join("demo_pkg");
        touch(&package.join("__init__.py"));
        touch(&package.join("ui/window.py"));
        touch(&package.join("data.json"));

        let files = package_files(&package).unwrap();
        let resources: Vec<_> = files.iter().map(|f| f.resource.as_str()).collect();
        assert_eq!(resources, ["app/demo_pkg/__init__.pyo", "app/demo_pkg/ui/window.pyo"]);
    }

    #[test]
    fn test_round_robin() {
        let tmp = TempDir::new().unwrap();
        let files: Vec<FrozenFile> = ["d", "a", "c", "b", "e"]
            .iter()
            .map(|name| FrozenFile {
                resource: format!("stdlib/{}.pyo", name),
                source: tmp.path().join(format!("{}.py", name)),
            })
            .collect();

        let qrcs = write_resources(tmp.path(), &files, &MockFreezer::default(), 2).unwrap();
        assert_eq!(qrcs, ["resources/pydeploy0.qrc", "resources/pydeploy1.qrc"]);

        let first = fs::read_to_string(tmp.path().join("resources/pydeploy0.qrc")).unwrap();
        assert_eq!(
            first,
            "<!DOCTYPE RCC>\n<RCC version=\"1.0\">\n    <qresource>\n        \
             <file>stdlib/a.pyo</file>\n        \
             <file>stdlib/c.pyo</file>\n        \
             <file>stdlib/e.pyo</file>\n    \
             </qresource>\n</RCC>\n"
        );

        let second = fs::read_to_string(tmp.path().join("resources/pydeploy1.qrc")).unwrap();
        assert!(second.contains("stdlib/b.pyo"));
        assert!(second.contains("stdlib/d.pyo"));

        assert!(tmp.path().join("resources/stdlib/a.pyo").is_file());
    }

    #[test]
    fn test_more_files_than_modules() {
        let tmp = TempDir::new().unwrap();
        let qrcs = write_resources(tmp.path(), &[], &MockFreezer::default(), 3).unwrap();
        assert_eq!(qrcs.len(), 3);
        assert_eq!(
            fs::read_to_string(tmp.path().join("resources/pydeploy2.qrc")).unwrap(),
            qrc([])
        );
    }
}
