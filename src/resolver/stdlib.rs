//! Standard library module resolution.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::platform::Architecture;
use crate::core::version::PythonVersion;
use crate::metadata::external::ExternalLibraries;
use crate::metadata::module::{parent_packages, ModuleTable, ModuleVariant};
use crate::resolver::closure::{self, CORE, EXPLICIT};
use crate::util::errors::DeployError;

/// What a resolve is for.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub arch: &'a Architecture,
    pub ssl: bool,
    /// Which external libraries are available for the architecture.
    pub libraries: ExternalLibraries<'a>,
}

/// The standard library modules a build needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModuleSet {
    pub version: PythonVersion,
    pub python_modules: BTreeMap<String, ModuleVariant>,
    pub extension_modules: BTreeMap<String, ModuleVariant>,
    pub external_libraries: BTreeSet<String>,
    /// Extension modules left out because their external library is not
    /// available, with the library id.
    pub dropped: BTreeMap<String, String>,
    pub explicit: BTreeSet<String>,
    #[serde(skip)]
    pub edges: BTreeSet<(String, String)>,
}

impl ResolvedModuleSet {
    /// Check if a module is part of the build.
    pub fn contains(&self, name: &str) -> bool {
        self.python_modules.contains_key(name) || self.extension_modules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleVariant> {
        self.python_modules
            .get(name)
            .or_else(|| self.extension_modules.get(name))
    }

    /// Every module in the build, sorted by name.
    pub fn all_modules(&self) -> impl Iterator<Item = &ModuleVariant> {
        let mut all: Vec<_> = self
            .python_modules
            .values()
            .chain(self.extension_modules.values())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all.into_iter()
    }

    /// The extension modules that have to be compiled into the executable.
    pub fn compiled_extensions(&self) -> impl Iterator<Item = &ModuleVariant> {
        self.extension_modules.values().filter(|v| !v.kind.is_core())
    }

    pub fn len(&self) -> usize {
        self.python_modules.len() + self.extension_modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves imports against a module table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a ModuleTable,
    ctx: ResolveContext<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a ModuleTable, ctx: ResolveContext<'a>) -> Self {
        Resolver { table, ctx }
    }

    /// Compute the modules needed for a set of explicit imports.
    pub fn resolve(
        &self,
        major: u32,
        minor: u32,
        explicit_imports: &[String],
    ) -> Result<ResolvedModuleSet> {
        let version = PythonVersion::new(major, minor);
        version.ensure_supported()?;

        let platform = self.ctx.arch.platform_kind();
        let all = self.table.get_modules_for_version(major, minor);
        let available = self.table.filtered_for(version, platform, self.ctx.ssl);

        let unresolved = |module: &str, required_by: Option<&str>| DeployError::UnresolvedDependency {
            module: module.to_string(),
            required_by: required_by.map(str::to_string),
            version: version.to_string(),
        };

        let mut seeds: Vec<(&'static str, String)> = available
            .values()
            .filter(|v| v.kind.is_core())
            .map(|v| (CORE, v.name.clone()))
            .collect();

        let mut explicit = BTreeSet::new();
        for name in explicit_imports {
            let Some(variant) = all.get(name.as_str()) else {
                return Err(unresolved(name, None).into());
            };

            if variant.internal {
                return Err(DeployError::config_in(
                    format!("`{}` is an internal module and cannot be imported explicitly", name),
                    "[python] stdlib",
                )
                .into());
            }

            if !available.contains_key(name.as_str()) {
                warn!(
                    "`{}` is not available for {} with SSL {} and will be ignored",
                    name,
                    self.ctx.arch,
                    if self.ctx.ssl { "enabled" } else { "disabled" }
                );
                continue;
            }

            explicit.insert(name.clone());
            seeds.push((EXPLICIT, name.clone()));
        }

        let closure = closure::compute(seeds, |name| {
            let variant = available
                .get(name)
                .ok_or_else(|| unresolved(name, None))?;

            let mut deps = Vec::new();
            for dep in variant
                .deps_for(self.ctx.arch, self.ctx.ssl)
                .chain(parent_packages(name))
            {
                if !available.contains_key(dep) {
                    return Err(unresolved(dep, Some(name)));
                }
                deps.push(dep.to_string());
            }

            Ok(deps)
        })?;

        let mut resolved = ResolvedModuleSet {
            version,
            python_modules: BTreeMap::new(),
            extension_modules: BTreeMap::new(),
            external_libraries: BTreeSet::new(),
            dropped: BTreeMap::new(),
            explicit,
            edges: closure.edges,
        };

        for name in &closure.visited {
            let variant = available[name.as_str()];

            if !variant.kind.is_extension() {
                resolved.python_modules.insert(name.clone(), variant.clone());
                continue;
            }

            if let Some(id) = &variant.external_lib_id {
                if !self.ctx.libraries.is_enabled(id) {
                    warn!(
                        "`{}` will not be included because the {} library is not available for {}",
                        name, id, self.ctx.arch
                    );
                    resolved.dropped.insert(name.clone(), id.clone());
                    continue;
                }
                resolved.external_libraries.insert(id.clone());
            }

            resolved.extension_modules.insert(name.clone(), variant.clone());
        }

        // A dropped module is not part of the build, so nothing depends on it.
        let dropped = &resolved.dropped;
        resolved
            .edges
            .retain(|(from, to)| !dropped.contains_key(from) && !dropped.contains_key(to));

        debug!(
            "resolved {} python and {} extension modules for v{}",
            resolved.python_modules.len(),
            resolved.extension_modules.len(),
            version
        );

        Ok(resolved)
    }
}
