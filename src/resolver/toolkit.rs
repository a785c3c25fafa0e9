//! Toolkit module resolution.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::core::platform::Architecture;
use crate::core::version::PythonVersion;
use crate::metadata::toolkit::{Binding, ToolkitModule};
use crate::resolver::closure::{self, EXPLICIT};
use crate::util::errors::DeployError;

/// The toolkit modules a build needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedToolkitSet {
    pub binding: Binding,
    pub modules: BTreeMap<String, ToolkitModule>,
    pub explicit: BTreeSet<String>,
    #[serde(skip)]
    pub edges: BTreeSet<(String, String)>,
}

impl ResolvedToolkitSet {
    /// Check if any module needs QtGui.
    pub fn needs_gui(&self) -> bool {
        self.modules.values().any(|m| m.gui)
    }

    /// The modules that are linked as static libraries.
    pub fn libraries(&self) -> impl Iterator<Item = &ToolkitModule> {
        self.modules.values().filter(|m| m.is_library)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Compute the toolkit modules needed for a set of imports.
///
/// `version` is only used to report unknown modules.
pub fn resolve_toolkit(
    binding: Binding,
    modules: &[String],
    arch: &Architecture,
    version: PythonVersion,
) -> Result<ResolvedToolkitSet> {
    let table = binding.table()?;
    let explicit: BTreeSet<String> = modules.iter().cloned().collect();

    let closure = closure::compute(
        modules.iter().map(|m| (EXPLICIT, m.clone())),
        |name| {
            let Some(module) = table.get(name) else {
                return Err(DeployError::UnresolvedDependency {
                    module: format!("{}.{}", binding, name),
                    required_by: None,
                    version: version.to_string(),
                });
            };

            if !module.targets.covers(arch) {
                return Err(DeployError::config_in(
                    format!("{}.{} is not available for {}", binding, name, arch),
                    "[toolkit] modules",
                ));
            }

            Ok(module.deps.clone())
        },
    )?;

    let resolved: BTreeMap<String, ToolkitModule> = closure
        .visited
        .iter()
        .filter_map(|name| table.get(name).map(|m| (name.clone(), m.clone())))
        .collect();

    debug!("resolved {} {} modules", resolved.len(), binding);

    Ok(ResolvedToolkitSet {
        binding,
        modules: resolved,
        explicit,
        edges: closure.edges,
    })
}
