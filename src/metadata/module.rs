//! The versioned module metadata model.
//!
//! A module name maps to one or more [`ModuleVariant`]s, each valid for a
//! range of Python versions. Tables are written as [`ModuleDef`]s using
//! plain string slices and are normalised into variants exactly once when a
//! [`ModuleTable`] is built.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::platform::{Architecture, PlatformKind};
use crate::core::scope::TargetExpression;
use crate::core::version::{PythonVersion, VersionRange};
use crate::util::errors::DeployError;

/// How a module is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ModuleKind {
    /// Python source that is always bundled.
    CorePythonSource,
    /// Python source bundled when required.
    PythonSource,
    /// An extension module built into the interpreter library.
    CoreNativeExtension,
    /// An extension module compiled into the application when required.
    NativeExtension,
}

impl ModuleKind {
    pub fn is_core(self) -> bool {
        matches!(
            self,
            ModuleKind::CorePythonSource | ModuleKind::CoreNativeExtension
        )
    }

    pub fn is_extension(self) -> bool {
        matches!(
            self,
            ModuleKind::CoreNativeExtension | ModuleKind::NativeExtension
        )
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleKind::CorePythonSource => "core python",
            ModuleKind::PythonSource => "python",
            ModuleKind::CoreNativeExtension => "core extension",
            ModuleKind::NativeExtension => "extension",
        };
        f.write_str(s)
    }
}

/// Restricts a module to, or away from, Windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlatformRestriction {
    WindowsOnly,
    NonWindows,
}

impl PlatformRestriction {
    pub fn allows(self, platform: PlatformKind) -> bool {
        match self {
            PlatformRestriction::WindowsOnly => platform == PlatformKind::Windows,
            PlatformRestriction::NonWindows => platform != PlatformKind::Windows,
        }
    }
}

/// Ties a module to whether SSL support is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SslRelevance {
    WithSsl,
    WithoutSsl,
}

impl SslRelevance {
    pub fn allows(self, ssl: bool) -> bool {
        match self {
            SslRelevance::WithSsl => ssl,
            SslRelevance::WithoutSsl => !ssl,
        }
    }
}

/// A value that only applies to some builds.
///
/// Written as `value`, `scope#value`, `ssl#value` or `!ssl#value`, where
/// `scope` is a [`TargetExpression`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scoped {
    pub value: String,
    #[serde(skip_serializing_if = "TargetExpression::is_everywhere")]
    pub scope: TargetExpression,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
}

impl Scoped {
    pub fn parse(s: &str) -> Result<Self, DeployError> {
        let (condition, value) = match s.split_once('#') {
            Some((condition, value)) => (condition.trim(), value.trim()),
            None => ("", s.trim()),
        };

        if value.is_empty() {
            return Err(DeployError::config(format!("'{}' has no value", s)));
        }

        let (scope, ssl) = match condition {
            "ssl" => (TargetExpression::everywhere(), Some(true)),
            "!ssl" => (TargetExpression::everywhere(), Some(false)),
            other => (TargetExpression::parse(other)?, None),
        };

        Ok(Scoped {
            value: value.to_string(),
            scope,
            ssl,
        })
    }

    /// Check if the value applies to a build.
    pub fn applies(&self, arch: &Architecture, ssl: bool) -> bool {
        self.scope.covers(arch) && self.ssl.is_none_or(|wanted| wanted == ssl)
    }

    pub fn is_conditional(&self) -> bool {
        !self.scope.is_everywhere() || self.ssl.is_some()
    }
}

impl fmt::Display for Scoped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ssl {
            Some(true) => write!(f, "ssl#")?,
            Some(false) => write!(f, "!ssl#")?,
            None if !self.scope.is_everywhere() => write!(f, "{}#", self.scope)?,
            None => {}
        }
        f.write_str(&self.value)
    }
}

/// One version-specific definition of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleVariant {
    pub name: String,
    pub version_range: VersionRange,
    pub kind: ModuleKind,
    pub internal: bool,
    pub platform_restriction: Option<PlatformRestriction>,
    pub ssl_relevance: Option<SslRelevance>,
    pub deps: Vec<Scoped>,
    pub submodules: Vec<String>,
    /// Source files relative to the interpreter's `Modules` directory.
    pub source_files: Vec<Scoped>,
    pub defines: Vec<Scoped>,
    pub include_subdirs: Vec<Scoped>,
    pub libs: Vec<Scoped>,
    pub external_lib_id: Option<String>,
}

impl ModuleVariant {
    pub fn is_wildcard(&self) -> bool {
        self.name.ends_with('*')
    }

    pub fn is_package(&self) -> bool {
        !self.submodules.is_empty()
    }

    /// Check the platform and SSL restrictions against a build.
    pub fn is_available(&self, platform: PlatformKind, ssl: bool) -> bool {
        self.platform_restriction.is_none_or(|r| r.allows(platform))
            && self.ssl_relevance.is_none_or(|r| r.allows(ssl))
    }

    /// The dependencies that apply to a build.
    pub fn deps_for<'a>(
        &'a self,
        arch: &'a Architecture,
        ssl: bool,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.deps
            .iter()
            .filter(move |d| d.applies(arch, ssl))
            .map(|d| d.value.as_str())
    }
}

/// The parent package names of a dotted module name, innermost last.
pub fn parent_packages(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices('.').map(move |(i, _)| &name[..i])
}

/// A table entry as it is written in the source.
#[derive(Debug, Clone)]
pub struct ModuleDef {
    pub name: &'static str,
    pub range: VersionRange,
    pub kind: ModuleKind,
    pub internal: bool,
    pub platform: Option<PlatformRestriction>,
    pub ssl: Option<SslRelevance>,
    pub deps: &'static [&'static str],
    pub submodules: &'static [&'static str],
    pub sources: &'static [&'static str],
    pub defines: &'static [&'static str],
    pub includes: &'static [&'static str],
    pub libs: &'static [&'static str],
    pub external_lib: Option<&'static str>,
}

impl ModuleDef {
    pub fn new(name: &'static str, kind: ModuleKind) -> Self {
        ModuleDef {
            name,
            range: VersionRange::all(),
            kind,
            internal: false,
            platform: None,
            ssl: None,
            deps: &[],
            submodules: &[],
            sources: &[],
            defines: &[],
            includes: &[],
            libs: &[],
            external_lib: None,
        }
    }

    pub fn versions(mut self, min: (u32, u32), max: (u32, u32)) -> Self {
        self.range = VersionRange::new(min, max);
        self
    }

    pub fn py2(self) -> Self {
        self.versions((2, 0), (2, 99))
    }

    pub fn py3(self) -> Self {
        self.versions((3, 0), (3, 99))
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn windows_only(mut self) -> Self {
        self.platform = Some(PlatformRestriction::WindowsOnly);
        self
    }

    pub fn non_windows(mut self) -> Self {
        self.platform = Some(PlatformRestriction::NonWindows);
        self
    }

    pub fn with_ssl(mut self) -> Self {
        self.ssl = Some(SslRelevance::WithSsl);
        self
    }

    pub fn without_ssl(mut self) -> Self {
        self.ssl = Some(SslRelevance::WithoutSsl);
        self
    }

    pub fn deps(mut self, deps: &'static [&'static str]) -> Self {
        self.deps = deps;
        self
    }

    pub fn submodules(mut self, submodules: &'static [&'static str]) -> Self {
        self.submodules = submodules;
        self
    }

    pub fn sources(mut self, sources: &'static [&'static str]) -> Self {
        self.sources = sources;
        self
    }

    pub fn defines(mut self, defines: &'static [&'static str]) -> Self {
        self.defines = defines;
        self
    }

    pub fn includes(mut self, includes: &'static [&'static str]) -> Self {
        self.includes = includes;
        self
    }

    pub fn libs(mut self, libs: &'static [&'static str]) -> Self {
        self.libs = libs;
        self
    }

    pub fn external(mut self, id: &'static str) -> Self {
        self.external_lib = Some(id);
        self
    }

    fn normalise(&self) -> Result<ModuleVariant, DeployError> {
        let context = || format!("module `{}` ({})", self.name, self.range);
        let scoped = |values: &[&str]| -> Result<Vec<Scoped>, DeployError> {
            values
                .iter()
                .map(|v| {
                    Scoped::parse(v).map_err(|e| DeployError::config_in(e.to_string(), context()))
                })
                .collect()
        };

        if !self.kind.is_extension()
            && !(self.sources.is_empty()
                && self.defines.is_empty()
                && self.includes.is_empty()
                && self.libs.is_empty()
                && self.external_lib.is_none())
        {
            return Err(DeployError::config_in(
                "only extension modules may have build information",
                context(),
            ));
        }

        let mut source_files = scoped(self.sources)?;
        if self.kind == ModuleKind::NativeExtension && source_files.is_empty() {
            source_files.push(Scoped::parse(&format!("{}module.c", self.name))?);
        }

        Ok(ModuleVariant {
            name: self.name.to_string(),
            version_range: self.range,
            kind: self.kind,
            internal: self.internal,
            platform_restriction: self.platform,
            ssl_relevance: self.ssl,
            deps: scoped(self.deps)?,
            submodules: self.submodules.iter().map(|s| s.to_string()).collect(),
            source_files,
            defines: scoped(self.defines)?,
            include_subdirs: scoped(self.includes)?,
            libs: scoped(self.libs)?,
            external_lib_id: self.external_lib.map(str::to_string),
        })
    }
}

/// An immutable table of module variants.
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    modules: BTreeMap<String, Vec<ModuleVariant>>,
}

impl ModuleTable {
    /// Build a table, normalising every entry.
    ///
    /// Two variants of the same name with overlapping version ranges are an
    /// error.
    pub fn new(defs: impl IntoIterator<Item = ModuleDef>) -> Result<Self, DeployError> {
        let mut modules: BTreeMap<String, Vec<ModuleVariant>> = BTreeMap::new();

        for def in defs {
            let variant = def.normalise()?;
            let variants = modules.entry(variant.name.clone()).or_default();

            if let Some(clash) = variants
                .iter()
                .find(|v| v.version_range.overlaps(&variant.version_range))
            {
                return Err(DeployError::config_in(
                    format!(
                        "module `{}` has overlapping version ranges {} and {}",
                        variant.name, clash.version_range, variant.version_range
                    ),
                    "module metadata",
                ));
            }

            variants.push(variant);
        }

        for variants in modules.values_mut() {
            variants.sort_by_key(|v| v.version_range.min);
        }

        Ok(ModuleTable { modules })
    }

    /// Every module name in the table.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// All variants of a module, oldest first.
    pub fn variants(&self, name: &str) -> &[ModuleVariant] {
        self.modules.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every variant in the table.
    pub fn all_variants(&self) -> impl Iterator<Item = &ModuleVariant> {
        self.modules.values().flatten()
    }

    /// The variant of a module for a version, if there is one.
    pub fn get(&self, name: &str, version: PythonVersion) -> Option<&ModuleVariant> {
        self.variants(name)
            .iter()
            .find(|v| v.version_range.contains_version(version))
    }

    /// Select the variant of every module that exists for a version.
    pub fn get_modules_for_version(
        &self,
        major: u32,
        minor: u32,
    ) -> BTreeMap<&str, &ModuleVariant> {
        self.modules
            .iter()
            .filter_map(|(name, variants)| {
                variants
                    .iter()
                    .find(|v| v.version_range.contains(major, minor))
                    .map(|v| (name.as_str(), v))
            })
            .collect()
    }

    /// The modules for a version after removing those unavailable on the
    /// platform or with the SSL setting.
    pub fn filtered_for(
        &self,
        version: PythonVersion,
        platform: PlatformKind,
        ssl: bool,
    ) -> BTreeMap<&str, &ModuleVariant> {
        let mut modules = self.get_modules_for_version(version.major, version.minor);
        modules.retain(|_, v| v.is_available(platform, ssl));
        modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ModuleKind::*;

    fn arch(name: &str) -> &'static Architecture {
        Architecture::find(name).unwrap()
    }

    #[test]
    fn test_scoped_parse() {
        let plain = Scoped::parse("os").unwrap();
        assert_eq!(plain.value, "os");
        assert!(!plain.is_conditional());

        let win = Scoped::parse("win#_winreg").unwrap();
        assert!(win.applies(arch("win-64"), true));
        assert!(!win.applies(arch("linux-64"), true));

        let not_win = Scoped::parse("!win#posix").unwrap();
        assert!(not_win.applies(arch("android-32"), false));
        assert!(!not_win.applies(arch("win-32"), false));

        let ssl = Scoped::parse("ssl#_hashlib").unwrap();
        assert!(ssl.applies(arch("linux-64"), true));
        assert!(!ssl.applies(arch("linux-64"), false));

        let no_ssl = Scoped::parse("!ssl#_md5").unwrap();
        assert!(no_ssl.applies(arch("linux-64"), false));
        assert_eq!(no_ssl.to_string(), "!ssl#_md5");

        assert!(Scoped::parse("beos#thing").is_err());
        assert!(Scoped::parse("win#").is_err());
    }

    #[test]
    fn test_default_source_file() {
        let table = ModuleTable::new([ModuleDef::new("array", NativeExtension)]).unwrap();
        let array = &table.variants("array")[0];
        assert_eq!(array.source_files[0].value, "arraymodule.c");
    }

    #[test]
    fn test_overlapping_ranges_are_rejected() {
        let result = ModuleTable::new([
            ModuleDef::new("collections", PythonSource).versions((3, 0), (3, 4)),
            ModuleDef::new("collections", PythonSource).versions((3, 4), (3, 99)),
        ]);

        let err = result.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("overlapping version ranges"));
    }

    #[test]
    fn test_python_source_cannot_have_build_info() {
        let result = ModuleTable::new([ModuleDef::new("json", PythonSource).libs(&["-lm"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_selection() {
        let table = ModuleTable::new([
            ModuleDef::new("collections", PythonSource).versions((3, 0), (3, 3)),
            ModuleDef::new("collections", PythonSource)
                .versions((3, 4), (3, 99))
                .deps(&["_collections_abc"]),
            ModuleDef::new("_collections_abc", PythonSource).versions((3, 4), (3, 99)),
            ModuleDef::new("urllib2", PythonSource).py2(),
        ])
        .unwrap();

        let py33 = table.get_modules_for_version(3, 3);
        assert!(py33["collections"].deps.is_empty());
        assert!(!py33.contains_key("_collections_abc"));
        assert!(!py33.contains_key("urllib2"));

        let py36 = table.get_modules_for_version(3, 6);
        assert_eq!(py36["collections"].deps[0].value, "_collections_abc");

        let py27 = table.get_modules_for_version(2, 7);
        assert_eq!(py27.keys().copied().collect::<Vec<_>>(), vec!["urllib2"]);
    }

    #[test]
    fn test_filtering() {
        let table = ModuleTable::new([
            ModuleDef::new("_winreg", CoreNativeExtension).windows_only(),
            ModuleDef::new("posix", CoreNativeExtension).non_windows(),
            ModuleDef::new("ssl", PythonSource).with_ssl(),
        ])
        .unwrap();

        let version = PythonVersion::new(2, 7);
        let linux = table.filtered_for(version, PlatformKind::Linux, false);
        assert_eq!(linux.keys().copied().collect::<Vec<_>>(), vec!["posix"]);

        let win = table.filtered_for(version, PlatformKind::Windows, true);
        assert_eq!(win.keys().copied().collect::<Vec<_>>(), vec!["_winreg", "ssl"]);
    }

    #[test]
    fn test_parent_packages() {
        let parents: Vec<_> = parent_packages("xml.etree.ElementTree").collect();
        assert_eq!(parents, vec!["xml", "xml.etree"]);
        assert_eq!(parent_packages("os").count(), 0);
    }
}
