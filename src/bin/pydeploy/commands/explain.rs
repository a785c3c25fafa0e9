//! `pydeploy explain` command

use anyhow::Result;

use crate::cli::ExplainArgs;
use crate::commands;
use pydeploy::ops::explain;
use pydeploy::resolver::Reason;

pub fn execute(args: ExplainArgs) -> Result<()> {
    let resolution = commands::resolve_selected(&args.project)?;
    let explanation = explain(&resolution, &args.module)?;

    let reason = match explanation.reason {
        Reason::Explicit => "imported by the application",
        Reason::Core => "always included",
    };
    println!("{} ({})", explanation.module, reason);

    // The chain runs from the requested module down to this one.
    for (depth, name) in explanation.chain.iter().enumerate() {
        println!("{}└─ {}", "   ".repeat(depth), name);
    }

    if !explanation.dependents.is_empty() {
        println!();
        println!("Required by:");
        for name in &explanation.dependents {
            println!("  ← {}", name);
        }
    }

    if !explanation.dependencies.is_empty() {
        println!();
        println!("Direct dependencies:");
        for name in &explanation.dependencies {
            println!("  → {}", name);
        }
    }

    Ok(())
}
