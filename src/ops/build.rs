//! Implementation of `pydeploy build`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::builder::freeze::{frozen_main_header, Freezer, HostInterpreterFreezer, FROZEN_MAIN_HEADER};
use crate::builder::importer::{importer_source, IMPORTER_SOURCE};
use crate::builder::inittab::{inittab_source, main_source, INITTAB_SOURCE, MAIN_SOURCE};
use crate::builder::resources::{package_files, stdlib_files, write_resources};
use crate::builder::{build_descriptor, BuildStage, GenerateOptions};
use crate::core::environment::{configure, Environment};
use crate::core::locations::Locations;
use crate::core::platform::Architecture;
use crate::core::project::{ExtensionModule, Project};
use crate::metadata::external::ExternalLibraries;
use crate::ops::resolve::resolve_project;
use crate::util::config::Config;
use crate::util::errors::DeployError;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, write_string};
use crate::util::hash::write_checksum;
use crate::util::process::{find_executable, ProcessBuilder, ProcessRunner};

/// Options for the build command.
///
/// Anything not given here is taken from the configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// The project file.
    pub project: PathBuf,

    /// Sysroot containing the target Python installation
    pub sysroot: Option<PathBuf>,

    /// Target architecture (the host if not given)
    pub target: Option<String>,

    /// Optimisation level used when freezing
    pub opt: Option<u8>,

    /// Number of `.qrc` files
    pub resources: Option<usize>,

    pub build_dir: Option<PathBuf>,

    /// Keep an existing build directory
    pub no_clean: bool,

    /// Run this qmake on the generated project
    pub qmake: Option<PathBuf>,

    /// Run make after qmake
    pub make: bool,
}

/// What a build produced.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub build_dir: PathBuf,
    pub pro_file: PathBuf,
    /// SHA-256 of the `.pro` file.
    pub fingerprint: String,
    pub stage: BuildStage,
}

/// Everything collected before resolving.
struct Collected {
    project: Project,
    target: &'static Architecture,
    sysroot: Option<PathBuf>,
    locations: Locations,
    build_dir: PathBuf,
    opt: u8,
    resources: usize,
}

/// Build a project, freezing with the host interpreter.
pub fn build(
    options: &BuildOptions,
    config: &Config,
    env: &dyn Environment,
    runner: &dyn ProcessRunner,
) -> Result<BuildResult> {
    let collected = collect(options, config, env)?;
    let interpreter = collected.locations.require_host_interpreter()?;
    let freezer = HostInterpreterFreezer::new(interpreter, collected.opt, runner);

    run(collected, options, config, env, runner, &freezer)
}

/// Build a project with the given freezer.
pub fn build_with(
    options: &BuildOptions,
    config: &Config,
    env: &dyn Environment,
    runner: &dyn ProcessRunner,
    freezer: &dyn Freezer,
) -> Result<BuildResult> {
    let collected = collect(options, config, env)?;
    run(collected, options, config, env, runner, freezer)
}

fn collect(options: &BuildOptions, config: &Config, env: &dyn Environment) -> Result<Collected> {
    debug!("build stage: {}", BuildStage::Collecting);

    let project = Project::load(&options.project)?;

    let target = match &options.target {
        Some(name) => Architecture::find(name)?,
        None => Architecture::host()?,
    };

    let sysroot = options
        .sysroot
        .clone()
        .or_else(|| config.build.sysroot.clone())
        .or_else(|| env.var("SYSROOT").map(PathBuf::from));

    let opt = options.opt.or(config.build.opt).unwrap_or(2);
    if opt > 2 {
        return Err(DeployError::config_in(
            format!("the optimisation level must be 0, 1 or 2, not {}", opt),
            "[build] opt",
        )
        .into());
    }

    let resources = options.resources.or(config.build.resources).unwrap_or(1);
    if resources == 0 {
        return Err(DeployError::config_in(
            "the number of resource files must be at least 1",
            "[build] resources",
        )
        .into());
    }

    let build_dir = options
        .build_dir
        .clone()
        .or_else(|| config.build.build_dir.clone())
        .unwrap_or_else(|| project.project_dir.join(format!("build-{}", target)));

    let locations = Locations::new(
        &project,
        sysroot.as_deref(),
        target,
        config.python.interpreter.as_deref(),
        env,
    )?;

    Ok(Collected {
        project,
        target,
        sysroot,
        locations,
        build_dir,
        opt,
        resources,
    })
}

fn run(
    collected: Collected,
    options: &BuildOptions,
    config: &Config,
    env: &dyn Environment,
    runner: &dyn ProcessRunner,
    freezer: &dyn Freezer,
) -> Result<BuildResult> {
    let Collected {
        project,
        target,
        sysroot,
        locations,
        build_dir,
        resources,
        ..
    } = collected;

    debug!("build stage: {}", BuildStage::Resolving);
    let resolution = resolve_project(&project, target)?;

    debug!("build stage: {}", BuildStage::Generating);
    if !options.no_clean {
        remove_dir_all_if_exists(&build_dir)?;
    }
    ensure_dir(&build_dir)?;
    info!("generating {} for {} in {}", project.app_name(), target, build_dir.display());

    let main_code = freeze_main(&project, &build_dir, freezer)?;
    write_string(&build_dir.join(FROZEN_MAIN_HEADER), &frozen_main_header(&main_code))?;

    let mut files = stdlib_files(&locations.stdlib_dir, &resolution.modules)?;
    if let Some(package) = &project.application.package {
        files.extend(package_files(&project.resolve_path(package, sysroot.as_deref(), env))?);
    }
    let qrcs = write_resources(&build_dir, &files, freezer, resources)?;

    let extension_modules: Vec<ExtensionModule> = project
        .extension_modules
        .iter()
        .map(|m| ExtensionModule {
            name: m.name.clone(),
            path: project.resolve_path(&m.path, sysroot.as_deref(), env),
        })
        .collect();

    let generate_options = GenerateOptions {
        locations: &locations,
        libraries: ExternalLibraries::new(&project.external_libraries, target),
        ssl: project.python.ssl,
        console: project.application.console,
        extension_modules: &extension_modules,
        resources: qrcs,
        bootstrap: [MAIN_SOURCE, INITTAB_SOURCE, IMPORTER_SOURCE, FROZEN_MAIN_HEADER]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
    };
    let descriptor = build_descriptor(
        &resolution.modules,
        resolution.toolkit.as_ref(),
        target,
        &generate_options,
    );

    let version = project.python.version;
    write_string(
        &build_dir.join(INITTAB_SOURCE),
        &inittab_source(descriptor.inittab.iter().map(String::as_str), version),
    )?;
    let sys_path: Vec<String> = project
        .application
        .sys_path
        .split_whitespace()
        .map(str::to_string)
        .collect();
    write_string(&build_dir.join(MAIN_SOURCE), &main_source(version, &sys_path))?;
    write_string(&build_dir.join(IMPORTER_SOURCE), &importer_source(version))?;

    let pro = descriptor.to_pro();
    let pro_file = build_dir.join(format!("{}.pro", project.app_name()));
    write_string(&pro_file, &pro)?;
    let fingerprint = write_checksum(&pro_file, pro.as_bytes())?;
    debug!("build stage: {}", BuildStage::Emitted);
    info!("wrote {} (sha256 {})", pro_file.display(), fingerprint);

    run_native_tools(options, config, env, runner, target, &build_dir, &pro_file)?;

    Ok(BuildResult {
        build_dir,
        pro_file,
        fingerprint,
        stage: BuildStage::Emitted,
    })
}

/// Freeze the application script, or a stub that calls the entry point.
fn freeze_main(project: &Project, build_dir: &Path, freezer: &dyn Freezer) -> Result<Vec<u8>> {
    let Some(entry_point) = project.application.entry_point.as_deref().filter(|e| !e.is_empty())
    else {
        let script = project.script_path();
        if !script.is_file() {
            return Err(DeployError::config_in(
                format!("the application script '{}' does not exist", script.display()),
                "[application] script",
            )
            .into());
        }
        return freezer.freeze(&script);
    };

    let (module, function) = entry_point
        .split_once(':')
        .with_context(|| format!("invalid entry point '{}'", entry_point))?;
    let stub = build_dir.join("pydeploy_entry_point.py");
    write_string(
        &stub,
        &format!("from {} import {}\n{}()\n", module.trim(), function.trim(), function.trim()),
    )?;

    freezer.freeze(&stub)
}

fn run_native_tools(
    options: &BuildOptions,
    config: &Config,
    env: &dyn Environment,
    runner: &dyn ProcessRunner,
    target: &'static Architecture,
    build_dir: &Path,
    pro_file: &Path,
) -> Result<()> {
    let make = options.make || config.build.make;
    let qmake = match options.qmake.clone().or_else(|| config.build.qmake.clone()) {
        Some(qmake) => Some(qmake),
        None if make => Some(find_executable("qmake").ok_or_else(|| {
            DeployError::missing_with_help(
                "unable to find qmake",
                "Pass --qmake or set `qmake` in the [build] section of the configuration",
            )
        })?),
        None => None,
    };

    let Some(qmake) = qmake else {
        return Ok(());
    };

    let host = Architecture::host()?;
    if !host.can_host(target) {
        return Err(DeployError::missing(format!("{} cannot build for {}", host, target)).into());
    }

    let _guard = configure(target.platform(), env)?;

    info!("running qmake");
    let pro_name = pro_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    runner.run(&ProcessBuilder::new(&qmake).arg(pro_name).cwd(build_dir))?;

    if make {
        info!("running {}", host.platform().make());
        runner.run(&ProcessBuilder::new(host.platform().make()).cwd(build_dir))?;
    }

    Ok(())
}
