//! qmake project generation.
//!
//! A build goes through a fixed sequence of stages. There are no retries:
//! any failure aborts the build.

pub mod descriptor;
pub mod freeze;
pub mod generator;
pub mod importer;
pub mod inittab;
pub mod resources;
pub mod sources;

use std::fmt;

pub use descriptor::BuildDescriptor;
pub use freeze::{Freezer, HostInterpreterFreezer};
pub use generator::{build_descriptor, generate, GenerateOptions};
pub use sources::SourceBucket;

/// The stages of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    /// Loading the project, configuration and locations.
    Collecting,
    /// Resolving standard library and toolkit modules.
    Resolving,
    /// Freezing modules and generating sources.
    Generating,
    /// The `.pro` file has been written.
    Emitted,
}

impl BuildStage {
    /// The stage that follows this one.
    pub fn next(self) -> Option<BuildStage> {
        match self {
            BuildStage::Collecting => Some(BuildStage::Resolving),
            BuildStage::Resolving => Some(BuildStage::Generating),
            BuildStage::Generating => Some(BuildStage::Emitted),
            BuildStage::Emitted => None,
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Collecting => "collecting",
            BuildStage::Resolving => "resolving",
            BuildStage::Generating => "generating",
            BuildStage::Emitted => "emitted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_ordered() {
        let mut stage = BuildStage::Collecting;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(stage.to_string(), "emitted");
    }
}
