//! High-level operations.
//!
//! This module contains the implementation of pydeploy commands.

pub mod build;
pub mod resolve;

pub use build::{build, build_with, BuildOptions, BuildResult};
pub use resolve::{explain, resolve_project, Explanation, Resolution};
