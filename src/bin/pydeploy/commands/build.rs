//! `pydeploy build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::load_project_config;
use pydeploy::core::ProcessEnv;
use pydeploy::ops::{build, BuildOptions};
use pydeploy::util::process::SystemProcessRunner;

pub fn execute(args: BuildArgs) -> Result<()> {
    // Configuration is loaded relative to the project file, CLI flags win.
    let config = load_project_config(&args.project.project);

    let opts = BuildOptions {
        project: args.project.project,
        sysroot: args.sysroot,
        target: args.project.target,
        opt: args.opt,
        resources: args.resources.map(|n| n as usize),
        build_dir: args.build_dir,
        no_clean: args.no_clean,
        qmake: args.qmake,
        make: args.make,
    };

    let result = build(&opts, &config, &ProcessEnv, &SystemProcessRunner)?;

    eprintln!("   Generated {}", result.pro_file.display());
    println!("{}", result.fingerprint);

    Ok(())
}
