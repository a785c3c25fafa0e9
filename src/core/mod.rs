//! Core data structures for pydeploy.
//!
//! This module contains the foundational types used throughout pydeploy:
//! - Python versions and version ranges
//! - Platforms, architectures and target expressions
//! - The project file and the locations of the target Python
//! - The build environment

pub mod environment;
pub mod locations;
pub mod platform;
pub mod project;
pub mod scope;
pub mod version;

pub use environment::{Environment, ProcessEnv};
pub use locations::Locations;
pub use platform::{Architecture, Platform, PlatformKind};
pub use project::Project;
pub use scope::TargetExpression;
pub use version::{PythonVersion, VersionRange};
