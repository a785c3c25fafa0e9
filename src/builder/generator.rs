//! Turning a resolved build into a [`BuildDescriptor`].

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::builder::descriptor::BuildDescriptor;
use crate::core::locations::Locations;
use crate::core::platform::Architecture;
use crate::core::project::ExtensionModule;
use crate::metadata::external::ExternalLibraries;
use crate::metadata::module::{ModuleVariant, Scoped};
use crate::metadata::toolkit::Binding;
use crate::resolver::stdlib::ResolvedModuleSet;
use crate::resolver::toolkit::ResolvedToolkitSet;

/// Everything about a build that does not come from resolving modules.
#[derive(Debug, Clone)]
pub struct GenerateOptions<'a> {
    pub locations: &'a Locations,
    pub libraries: ExternalLibraries<'a>,
    pub ssl: bool,
    /// The application always has a console.
    pub console: bool,
    /// Third-party extension modules with their library directories
    /// already resolved.
    pub extension_modules: &'a [ExtensionModule],
    /// `.qrc` files, relative to the build directory.
    pub resources: Vec<String>,
    /// Generated sources, relative to the build directory.
    pub bootstrap: Vec<PathBuf>,
}

/// Generate the text of the `.pro` file.
pub fn generate(
    resolved: &ResolvedModuleSet,
    toolkit: Option<&ResolvedToolkitSet>,
    target: &Architecture,
    options: &GenerateOptions<'_>,
) -> String {
    build_descriptor(resolved, toolkit, target, options).to_pro()
}

/// Collect everything a build needs into a descriptor.
pub fn build_descriptor(
    resolved: &ResolvedModuleSet,
    toolkit: Option<&ResolvedToolkitSet>,
    target: &Architecture,
    options: &GenerateOptions<'_>,
) -> BuildDescriptor {
    let mut descriptor = BuildDescriptor::new();
    descriptor.console = options.console;

    for resource in &options.resources {
        descriptor.add_resource(resource.clone());
    }
    for source in &options.bootstrap {
        descriptor.add_source(source);
    }

    if let Some(toolkit) = toolkit.filter(|t| !t.is_empty()) {
        add_toolkit(&mut descriptor, toolkit, &options.locations.stdlib_dir);
    }

    let modules_dir = options.locations.source_dir.join("Modules");
    for module in resolved.compiled_extensions() {
        if let Some(id) = &module.external_lib_id {
            let Some(flags) = options.libraries.flags(id) else {
                warn!(
                    "leaving out `{}` because the {} library is not available for {}",
                    module.name, id, target
                );
                continue;
            };

            for define in flags.defines.split_whitespace() {
                descriptor.add_define(define);
            }
            for path in flags.includepath.split_whitespace() {
                descriptor.add_include_path(Path::new(path));
            }
            descriptor.add_lib_flags(&flags.libs);
        }

        add_extension(&mut descriptor, module, &modules_dir, target, options.ssl);
    }

    for module in options.extension_modules {
        descriptor.add_lib_dir(&module.path);
        descriptor.add_lib(format!("-l{}", module.lib_name()));
        descriptor.add_inittab(module.name.clone());
    }

    let locations = options.locations;
    descriptor.add_include_path(&locations.include_dir);
    let (lib_dir, lib_name) = locations.library_link();
    descriptor.add_lib_dir(&lib_dir);
    descriptor.add_lib(format!("-l{}", lib_name));

    if target.platform().is_windows() {
        if let Some(dll) = &locations.dll {
            descriptor.add_post_link_dll(dll);
        }
    }

    debug!(
        "descriptor has {} inittab entries and {} libraries",
        descriptor.inittab.len(),
        descriptor.libs.len()
    );

    descriptor
}

fn add_toolkit(descriptor: &mut BuildDescriptor, toolkit: &ResolvedToolkitSet, stdlib_dir: &Path) {
    for module in toolkit.modules.values() {
        descriptor.add_toolkit_module(module);
    }

    let site_packages = stdlib_dir.join("site-packages");
    let binding_dir = site_packages.join(toolkit.binding.name());

    let mut libraries = toolkit.libraries().peekable();
    if libraries.peek().is_some() {
        descriptor.add_lib_dir(&binding_dir);
    }
    for module in libraries {
        descriptor.add_lib(format!("-l{}", module.lib_name()));
        descriptor.add_inittab(format!("{}.{}", toolkit.binding, module.name));
    }

    let sip_dir = match toolkit.binding {
        Binding::PyQt4 => site_packages,
        Binding::PyQt5 => binding_dir,
    };
    descriptor.add_lib_dir(&sip_dir);
    descriptor.add_lib("-lsip");
    descriptor.add_inittab(toolkit.binding.sip_module());
}

fn add_extension(
    descriptor: &mut BuildDescriptor,
    module: &ModuleVariant,
    modules_dir: &Path,
    target: &Architecture,
    ssl: bool,
) {
    let applicable = |values: &'_ [Scoped]| -> Vec<String> {
        values
            .iter()
            .filter(|v| v.applies(target, ssl))
            .map(|v| v.value.clone())
            .collect()
    };

    for source in applicable(&module.source_files) {
        descriptor.add_source(&modules_dir.join(source));
    }
    for define in applicable(&module.defines) {
        descriptor.add_define(define);
    }
    for dir in applicable(&module.include_subdirs) {
        descriptor.add_include_path(&modules_dir.join(dir));
    }
    for libs in applicable(&module.libs) {
        descriptor.add_lib_flags(&libs);
    }

    descriptor.add_inittab(module.name.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::PythonVersion;
    use crate::metadata::external::LibraryOverride;
    use crate::metadata::stdlib;
    use crate::resolver::stdlib::{ResolveContext, Resolver};
    use crate::resolver::toolkit::resolve_toolkit;
    use std::collections::BTreeMap;

    fn arch(name: &str) -> &'static Architecture {
        Architecture::find(name).unwrap()
    }

    fn locations(windows: bool) -> Locations {
        let (library, dll) = if windows {
            ("C:/Python36/libs/python36.lib", Some(PathBuf::from("C:/Python36/python36.dll")))
        } else {
            ("/sysroot/lib/libpython3.6m.a", None)
        };

        Locations {
            include_dir: PathBuf::from("/sysroot/include/python3.6"),
            library: PathBuf::from(library),
            stdlib_dir: PathBuf::from("/sysroot/lib/python3.6"),
            source_dir: PathBuf::from("/sysroot/src/Python-3.6"),
            dll,
            host_interpreter: None,
        }
    }

    fn resolve(
        imports: &[&str],
        arch: &'static Architecture,
        overrides: &BTreeMap<String, LibraryOverride>,
    ) -> ResolvedModuleSet {
        let ctx = ResolveContext {
            arch,
            ssl: true,
            libraries: ExternalLibraries::new(overrides, arch),
        };
        let imports: Vec<String> = imports.iter().map(|s| s.to_string()).collect();
        Resolver::new(stdlib::table().unwrap(), ctx)
            .resolve(3, 6, &imports)
            .unwrap()
    }

    fn options<'a>(
        locations: &'a Locations,
        overrides: &'a BTreeMap<String, LibraryOverride>,
        arch: &'a Architecture,
    ) -> GenerateOptions<'a> {
        GenerateOptions {
            locations,
            libraries: ExternalLibraries::new(overrides, arch),
            ssl: true,
            console: false,
            extension_modules: &[],
            resources: vec!["resources/pydeploy0.qrc".to_string()],
            bootstrap: vec![PathBuf::from("pydeploy_main.c"), PathBuf::from("frozen_main.h")],
        }
    }

    #[test]
    fn test_extension_module_sources() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let resolved = resolve(&["json"], linux, &overrides);

        let descriptor = build_descriptor(&resolved, None, linux, &options(&locations, &overrides, linux));

        assert!(descriptor.inittab.contains("_json"));
        let pro = descriptor.to_pro();
        assert!(pro.contains("/sysroot/src/Python-3.6/Modules/_json.c"));
        assert!(pro.contains("HEADERS += frozen_main.h\n"));
        assert!(pro.contains("INCLUDEPATH += /sysroot/include/python3.6\n"));
        assert!(pro.contains("LIBS += -L/sysroot/lib -lpython3.6m\n"));
        assert!(pro.contains("QT -= gui\n"));
        assert!(!pro.contains("win32"));
    }

    #[test]
    fn test_external_library_flags() {
        let linux = arch("linux-64");
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "zlib".to_string(),
            LibraryOverride {
                includepath: "/opt/zlib/include".to_string(),
                libs: "-L/opt/zlib/lib -lz".to_string(),
                ..Default::default()
            },
        );
        let locations = locations(false);
        let resolved = resolve(&["zlib"], linux, &overrides);

        let pro = generate(&resolved, None, linux, &options(&locations, &overrides, linux));
        assert!(pro.contains("/opt/zlib/include"));
        assert!(pro.contains("-L/opt/zlib/lib"));
        assert!(pro.contains(" -lz"));
    }

    #[test]
    fn test_dependent_libraries_keep_link_order() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let resolved = resolve(&["ssl", "curses.panel"], linux, &overrides);

        let pro = generate(&resolved, None, linux, &options(&locations, &overrides, linux));
        assert!(pro.contains(" -lssl -lcrypto"), "{}", pro);
        assert!(pro.contains(" -lpanel -lcurses"), "{}", pro);
    }

    #[test]
    fn test_unavailable_library_leaves_module_out() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let resolved = resolve(&["zlib"], linux, &overrides);
        assert!(resolved.extension_modules.contains_key("zlib"));

        // The library is disabled after the resolve.
        let mut disabled = BTreeMap::new();
        disabled.insert(
            "zlib".to_string(),
            LibraryOverride {
                scope: crate::core::scope::TargetExpression::parse("win").unwrap(),
                ..Default::default()
            },
        );

        let descriptor =
            build_descriptor(&resolved, None, linux, &options(&locations, &disabled, linux));
        assert!(!descriptor.inittab.contains("zlib"));
        assert!(!descriptor.libs.contains("-lz"));
    }

    #[test]
    fn test_toolkit_pyqt5() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let resolved = resolve(&[], linux, &overrides);
        let modules = vec!["QtWidgets".to_string()];
        let toolkit =
            resolve_toolkit(Binding::PyQt5, &modules, linux, PythonVersion::new(3, 6)).unwrap();

        let descriptor =
            build_descriptor(&resolved, Some(&toolkit), linux, &options(&locations, &overrides, linux));

        assert!(descriptor.gui);
        for name in ["PyQt5.QtCore", "PyQt5.QtGui", "PyQt5.QtWidgets", "PyQt5.sip"] {
            assert!(descriptor.inittab.contains(name), "{}", name);
        }
        assert!(descriptor.lib_dirs.contains("-L/sysroot/lib/python3.6/site-packages/PyQt5"));
        assert!(descriptor.libs.contains("-lQtWidgets"));
        assert!(descriptor.libs.contains("-lsip"));
        assert!(!descriptor.to_pro().contains("QT -= gui"));
    }

    #[test]
    fn test_toolkit_pyqt4_sip() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let resolved = resolve(&[], linux, &overrides);
        let modules = vec!["QtCore".to_string()];
        let toolkit =
            resolve_toolkit(Binding::PyQt4, &modules, linux, PythonVersion::new(3, 6)).unwrap();

        let descriptor =
            build_descriptor(&resolved, Some(&toolkit), linux, &options(&locations, &overrides, linux));

        assert!(descriptor.inittab.contains("sip"));
        assert!(descriptor.inittab.contains("PyQt4.QtCore"));
        assert!(descriptor.lib_dirs.contains("-L/sysroot/lib/python3.6/site-packages"));
    }

    #[test]
    fn test_third_party_extension_modules() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let resolved = resolve(&[], linux, &overrides);
        let extensions = vec![ExtensionModule {
            name: "pkg.fastmath".to_string(),
            path: PathBuf::from("/sysroot/lib"),
        }];
        let mut options = options(&locations, &overrides, linux);
        options.extension_modules = &extensions;

        let descriptor = build_descriptor(&resolved, None, linux, &options);
        assert!(descriptor.inittab.contains("pkg.fastmath"));
        assert!(descriptor.libs.contains("-lfastmath"));
    }

    #[test]
    fn test_windows_dll() {
        let win = arch("win-64");
        let overrides = BTreeMap::new();
        let locations = locations(true);
        let resolved = resolve(&[], win, &overrides);

        let pro = generate(&resolved, None, win, &options(&locations, &overrides, win));
        assert!(pro.contains("-lpython36"));
        assert!(pro.contains("win32 {\n"));
        assert!(pro.contains("C:/Python36/python36.dll"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let linux = arch("linux-64");
        let overrides = BTreeMap::new();
        let locations = locations(false);
        let one = resolve(&["json", "zlib", "hashlib"], linux, &overrides);
        let two = resolve(&["hashlib", "json", "zlib"], linux, &overrides);
        assert_eq!(one, two);

        let options = options(&locations, &overrides, linux);
        assert_eq!(
            generate(&one, None, linux, &options),
            generate(&two, None, linux, &options)
        );
    }
}
