//! Dependency resolution.
//!
//! The resolvers are pure and deterministic. Everything they need is looked
//! up before they run and their results are sorted.

pub mod closure;
pub mod graph;
pub mod stdlib;
pub mod toolkit;

pub use graph::{DependencyGraph, Reason};
pub use stdlib::{ResolveContext, ResolvedModuleSet, Resolver};
pub use toolkit::{resolve_toolkit, ResolvedToolkitSet};
