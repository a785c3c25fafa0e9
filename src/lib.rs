//! pydeploy - Deploy Python applications as self-contained Qt programs
//!
//! This crate provides the core library functionality for pydeploy,
//! including standard library metadata, module resolution and generation
//! of qmake projects.

pub mod builder;
pub mod core;
pub mod metadata;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for pydeploy unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a mock process runner, a mock freezer and
/// fixtures for projects and sysroots.
#[cfg(test)]
pub mod test_support;

pub use core::{
    platform::{Architecture, Platform},
    project::Project,
    scope::TargetExpression,
    version::PythonVersion,
};

pub use resolver::{ResolvedModuleSet, ResolvedToolkitSet};
pub use util::errors::DeployError;
