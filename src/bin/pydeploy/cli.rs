//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// pydeploy - Deploy Python applications as self-contained Qt programs
#[derive(Parser)]
#[command(name = "pydeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the qmake project for an application
    Build(BuildArgs),

    /// List the supported platforms and architectures
    Targets,

    /// List the standard library modules available for a Python version
    Modules(ModulesArgs),

    /// Show the modules a project needs for a target
    Resolve(ResolveArgs),

    /// Explain why a module is part of a build
    Explain(ExplainArgs),

    /// Check the module metadata for mistakes
    CheckMetadata,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Selects a project and the target to build it for.
#[derive(Args)]
pub struct ProjectArgs {
    /// The project file
    #[arg(long, default_value = "pydeploy.toml")]
    pub project: PathBuf,

    /// Target architecture (defaults to the host)
    #[arg(long, env = "PYDEPLOY_TARGET")]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Sysroot containing the target Python
    #[arg(long)]
    pub sysroot: Option<PathBuf>,

    /// Optimisation level used when freezing
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub opt: Option<u8>,

    /// Number of resource files to split the frozen modules over
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub resources: Option<u64>,

    /// Directory to generate the project in
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Keep the contents of an existing build directory
    #[arg(long)]
    pub no_clean: bool,

    /// Run this qmake on the generated project
    #[arg(long)]
    pub qmake: Option<PathBuf>,

    /// Run make after qmake
    #[arg(long)]
    pub make: bool,
}

#[derive(Args)]
pub struct ModulesArgs {
    /// Python version, e.g. 3.6
    #[arg(long)]
    pub python: String,

    /// Only show modules available on this architecture
    #[arg(long)]
    pub target: Option<String>,

    /// Assume Python was built without SSL support
    #[arg(long)]
    pub no_ssl: bool,

    /// Include internal modules
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the resolved modules as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Module to explain
    pub module: String,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
