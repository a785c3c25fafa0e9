//! `pydeploy check-metadata` command
//!
//! Checks the standard library and toolkit tables for authoring mistakes.

use anyhow::{bail, Result};

use pydeploy::metadata::check::{check_overlaps, check_table};
use pydeploy::metadata::{stdlib, Binding};

pub fn execute() -> Result<()> {
    let defs = stdlib::stdlib_defs();

    // Overlaps stop the table from being built at all.
    let mut problems = check_overlaps(&defs);
    if problems.is_empty() {
        problems = check_table(stdlib::table()?);
    }

    for problem in &problems {
        println!("{}", problem);
    }
    if !problems.is_empty() {
        bail!("found {} problems in the standard library metadata", problems.len());
    }

    let mut count = 0;
    for binding in [Binding::PyQt4, Binding::PyQt5] {
        count += binding.table()?.len();
    }

    println!(
        "{} standard library modules and {} toolkit modules checked",
        stdlib::table()?.len(),
        count
    );

    Ok(())
}
