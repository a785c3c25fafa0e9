//! pydeploy CLI - Deploy Python applications as self-contained Qt programs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pydeploy::util::diagnostic;
use pydeploy::DeployError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<DeployError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("pydeploy=debug")
    } else if cli.quiet {
        EnvFilter::new("pydeploy=warn")
    } else {
        EnvFilter::new("pydeploy=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args),
        Commands::Targets => commands::targets::execute(),
        Commands::Modules(args) => commands::modules::execute(args),
        Commands::Resolve(args) => commands::resolve::execute(args),
        Commands::Explain(args) => commands::explain::execute(args),
        Commands::CheckMetadata => commands::check_metadata::execute(),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
