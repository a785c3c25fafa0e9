//! Metadata describing what can be deployed.
//!
//! The standard library table is versioned: a module may have several
//! variants, each for a range of Python versions. The toolkit tables list
//! the modules of each binding and the Qt modules they need.

pub mod check;
pub mod external;
pub mod module;
pub mod stdlib;
pub mod toolkit;

pub use external::{ExternalLibraries, LibraryFlags, LibraryOverride};
pub use module::{ModuleDef, ModuleKind, ModuleTable, ModuleVariant};
pub use toolkit::{Binding, ToolkitModule, ToolkitTable};
