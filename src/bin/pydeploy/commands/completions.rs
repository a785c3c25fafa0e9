//! `pydeploy completions` command
//!
//! Prints a completion script covering every pydeploy subcommand and flag.
//! With `--output` the script is written to a file instead, for packagers
//! installing it system-wide.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            generate(args.shell, &mut cmd, name, &mut out);
            out.flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("   Generated {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            generate(args.shell, &mut cmd, name, &mut stdout.lock());
        }
    }

    Ok(())
}
