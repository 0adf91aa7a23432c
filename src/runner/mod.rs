//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the design, runs the selected backend, writes its files into the
//! work root and, for `build` and `run`, hands over to `make`.

mod error;
pub mod file_io;
mod path_helpers;
mod process;

pub use error::RunnerError;
pub use make_env::MAKE_ENV;
pub use process::{resolve_make_program, run_make};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::ast::Design;
use crate::backend::{MakeInvocation, Tool, ToolSetup, WrittenSetup};
use crate::cli::{Cli, Commands, RunArgs};
use crate::design;
use crate::param::{self, ParamType, ParameterSet};
use path_helpers::{resolve_design_path, resolve_output_path, resolve_work_root};

/// Default make executable to invoke.
pub const MAKE_PROGRAM: &str = "make";

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if the design cannot be loaded, the backend rejects it,
/// a file cannot be written, or `make` fails.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli.command.clone().unwrap_or(Commands::Build);
    match command {
        Commands::Makefile { file } => {
            let (design, tool) = load(cli)?;
            let params = ParameterSet::from_declarations(&design.parameters)?;
            let text = setup(&design, tool, &params)?
                .makefile()
                .context("render Makefile")?;
            if file_io::is_stdout_path(&file) {
                file_io::write_stdout(&text)
            } else {
                let path = resolve_output_path(cli, &file);
                file_io::write_file(&path, &text)
                    .with_context(|| format!("write Makefile to {}", path.display()))
            }
        }
        Commands::Configure => configure(cli, &RunArgs::default()).map(|_| ()),
        Commands::Build => {
            let (written, _) = configure(cli, &RunArgs::default())?;
            invoke_make(cli, &written.build_invocation())
        }
        Commands::Run(args) => handle_run(cli, &args),
    }
}

fn handle_run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let (written, params) = configure(cli, args)?;
    invoke_make(cli, &written.build_invocation())?;
    match written.run_invocation(&params, &args.raw) {
        Some(invocation) => invoke_make(cli, &invocation),
        None => {
            info!(tool = %written.tool(), "backend has no run stage; skipping run");
            Ok(())
        }
    }
}

fn load(cli: &Cli) -> Result<(Design, Tool)> {
    let path = resolve_design_path(cli)?;
    let design =
        design::from_path(&path).with_context(|| format!("load design from {path}"))?;
    let tool = Tool::select(cli.tool.as_deref(), &design)?;
    debug!(%tool, design = %design.name, "selected backend");
    Ok((design, tool))
}

fn setup(design: &Design, tool: Tool, params: &ParameterSet) -> Result<ToolSetup> {
    let setup = tool
        .setup(design, params)
        .with_context(|| format!("configure {tool} for '{}'", design.name))?;
    for file in setup.leftover() {
        debug!(file = %file.name, "not consumed by {tool}");
    }
    Ok(setup)
}

/// Collect declared defaults, then apply `run` overrides.
fn parameters(design: &Design, args: &RunArgs) -> Result<ParameterSet> {
    let mut params = ParameterSet::from_declarations(&design.parameters)?;
    let overrides = args
        .plusargs
        .iter()
        .map(|a| (a, ParamType::Plusarg))
        .chain(args.cmdlineargs.iter().map(|a| (a, ParamType::Cmdlinearg)));
    for (assignment, kind) in overrides {
        let (name, value) = param::parse_assignment(assignment, &design.parameters, kind)
            .with_context(|| format!("apply override '{assignment}'"))?;
        params.set(kind, &name, value);
    }
    Ok(params)
}

fn configure(cli: &Cli, args: &RunArgs) -> Result<(WrittenSetup, ParameterSet)> {
    let (design, tool) = load(cli)?;
    let params = parameters(&design, args)?;
    let work_root = resolve_work_root(cli)?;
    let prepared = setup(&design, tool, &params)?;
    let dir = file_io::open_dir(&work_root)?;
    let written = prepared
        .write(&dir)
        .with_context(|| format!("write build files into {work_root}"))?;
    info!(%tool, %work_root, files = written.files().len(), "configured");
    Ok((written, params))
}

fn invoke_make(cli: &Cli, invocation: &MakeInvocation) -> Result<()> {
    let work_root = resolve_work_root(cli)?;
    let program = resolve_make_program();
    run_make(&program, &work_root, cli.jobs, invocation).with_context(|| {
        format!(
            "running {program} {} in {work_root}",
            invocation.args().join(" ")
        )
    })
}
