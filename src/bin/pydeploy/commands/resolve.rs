//! `pydeploy resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use crate::commands;
use pydeploy::ops::Resolution;

pub fn execute(args: ResolveArgs) -> Result<()> {
    let resolution = commands::resolve_selected(&args.project)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        print_resolution(&resolution);
    }

    Ok(())
}

fn print_resolution(resolution: &Resolution) {
    let modules = &resolution.modules;
    println!("Python v{} on {}", resolution.python, resolution.target);

    print_section("Python modules", modules.python_modules.keys());
    print_section("Extension modules", modules.extension_modules.keys());
    print_section("External libraries", modules.external_libraries.iter());

    if !modules.dropped.is_empty() {
        println!();
        println!("Left out:");
        for (module, lib) in &modules.dropped {
            println!("  {} ({} is not available)", module, lib);
        }
    }

    if let Some(toolkit) = &resolution.toolkit {
        print_section(&format!("{} modules", toolkit.binding), toolkit.modules.keys());
    }
}

fn print_section<'a>(title: &str, names: impl ExactSizeIterator<Item = &'a String>) {
    if names.len() == 0 {
        return;
    }

    println!();
    println!("{} ({}):", title, names.len());
    for name in names {
        println!("  {}", name);
    }
}
