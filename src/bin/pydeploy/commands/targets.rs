//! `pydeploy targets` command

use anyhow::Result;

use pydeploy::core::{Architecture, Platform};

pub fn execute() -> Result<()> {
    let host = Architecture::host().ok();

    for platform in Platform::all() {
        println!("{} ({})", platform.name, platform.full_name);
        for arch in platform.architectures() {
            let marker = if host == Some(arch) { " (host)" } else { "" };
            println!("  {}{}", arch.name, marker);
        }
    }

    Ok(())
}
