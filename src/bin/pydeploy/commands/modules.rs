//! `pydeploy modules` command

use anyhow::Result;

use crate::cli::ModulesArgs;
use crate::commands::target;
use pydeploy::metadata::stdlib;
use pydeploy::PythonVersion;

pub fn execute(args: ModulesArgs) -> Result<()> {
    let version: PythonVersion = args.python.parse()?;
    version.ensure_supported()?;

    let table = stdlib::table()?;
    let modules = match &args.target {
        Some(name) => {
            let arch = target(Some(name))?;
            table.filtered_for(version, arch.platform_kind(), !args.no_ssl)
        }
        None => table.get_modules_for_version(version.major, version.minor),
    };

    let width = modules.keys().map(|n| n.len()).max().unwrap_or(0);
    for (name, variant) in &modules {
        if variant.internal && !args.all {
            continue;
        }
        println!("{:width$}  {}", name, variant.kind, width = width);
    }

    Ok(())
}
