//! Resolving the modules of a project for a target.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::core::platform::Architecture;
use crate::core::project::Project;
use crate::core::version::PythonVersion;
use crate::metadata::external::ExternalLibraries;
use crate::metadata::stdlib;
use crate::resolver::{
    resolve_toolkit, DependencyGraph, Reason, ResolveContext, ResolvedModuleSet,
    ResolvedToolkitSet, Resolver,
};
use crate::util::errors::DeployError;

/// Every module a project needs on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub target: String,
    pub python: PythonVersion,
    pub modules: ResolvedModuleSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolkit: Option<ResolvedToolkitSet>,
}

/// Resolve the standard library and toolkit modules of a project.
pub fn resolve_project(project: &Project, target: &Architecture) -> Result<Resolution> {
    let version = project.python.version;
    version.ensure_supported()?;

    let ctx = ResolveContext {
        arch: target,
        ssl: project.python.ssl,
        libraries: ExternalLibraries::new(&project.external_libraries, target),
    };
    let modules = Resolver::new(stdlib::table()?, ctx).resolve(
        version.major,
        version.minor,
        &project.explicit_imports(),
    )?;

    let toolkit = match &project.toolkit {
        Some(toolkit) => Some(resolve_toolkit(toolkit.binding, &toolkit.modules, target, version)?),
        None => None,
    };

    info!(
        "resolved {} modules for Python v{} on {}",
        modules.len() + toolkit.as_ref().map_or(0, |t| t.modules.len()),
        version,
        target
    );

    Ok(Resolution {
        target: target.name.to_string(),
        python: version,
        modules,
        toolkit,
    })
}

/// Why a module is part of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub module: String,
    pub reason: Reason,
    /// From the module that was requested to this one.
    pub chain: Vec<String>,
    pub dependents: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Explain why a module is included.
///
/// Toolkit modules may be given with or without the binding prefix. A
/// module left out because its external library is unavailable is an
/// error naming the library.
pub fn explain(resolution: &Resolution, module: &str) -> Result<Explanation> {
    if let Some(lib) = resolution.modules.dropped.get(module) {
        return Err(DeployError::config(format!(
            "`{}` was left out because the {} library is not available for {}",
            module, lib, resolution.target
        ))
        .into());
    }

    let mut graphs = vec![(module.to_string(), DependencyGraph::for_modules(&resolution.modules))];
    if let Some(toolkit) = &resolution.toolkit {
        let prefix = format!("{}.", toolkit.binding);
        let name = module.strip_prefix(&prefix).unwrap_or(module);
        graphs.push((name.to_string(), DependencyGraph::for_toolkit(toolkit)));
    }

    for (name, graph) in &graphs {
        if let Some((reason, chain)) = graph.why(name) {
            return Ok(Explanation {
                module: module.to_string(),
                reason,
                chain,
                dependents: graph.dependents(name),
                dependencies: graph.dependencies(name),
            });
        }
    }

    Err(DeployError::config(format!(
        "`{}` is not part of the build for {}",
        module, resolution.target
    ))
    .into())
}
