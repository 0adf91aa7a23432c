//! End-to-end validation of Makefile generation.
//!
//! A mixed-language VCS design and a Verilator C++ model are turned into
//! Makefiles, snapshotted with `insta`, and then dry-run through the real
//! `make` executable to check that the rules parse and resolve as expected.

use anyhow::{Context, Result, ensure};
use camino::Utf8Path;
use edagraph::backend::Tool;
use edagraph::design;
use edagraph::param::ParameterSet;
use insta::{Settings, assert_snapshot};
use rstest::rstest;
use std::fs;
use std::process::Command;
use test_support::design::{VCS_DESIGN, VERILATOR_DESIGN};
use test_support::make::make_workspace;

fn makefile_for(yaml: &str, tool: Tool) -> Result<String> {
    let design = design::from_str(yaml)?;
    let params = ParameterSet::from_declarations(&design.parameters)?;
    let setup = tool.setup(&design, &params)?;
    Ok(setup.makefile()?)
}

fn snapshot_settings() -> Settings {
    let mut settings = Settings::new();
    settings.set_snapshot_path(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/snapshots/makefile"
    ));
    settings
}

#[test]
fn vcs_makefile_snapshot() -> Result<()> {
    let makefile = makefile_for(VCS_DESIGN, Tool::Vcs)?;
    snapshot_settings().bind(|| {
        assert_snapshot!("vcs_mixed_language", makefile);
    });
    Ok(())
}

#[test]
fn verilator_makefile_snapshot() -> Result<()> {
    let makefile = makefile_for(VERILATOR_DESIGN, Tool::Verilator)?;
    snapshot_settings().bind(|| {
        assert_snapshot!("verilator_cc_model", makefile);
    });
    Ok(())
}

/// Write the design's build files into `root` and touch every source.
fn prepare(root: &Utf8Path, yaml: &str, tool: Tool) -> Result<()> {
    let design = design::from_str(yaml)?;
    let params = ParameterSet::from_declarations(&design.parameters)?;
    let dir = edagraph::runner::file_io::open_dir(root)?;
    tool.setup(&design, &params)?.write(&dir)?;
    for file in &design.files {
        let path = root.join(&file.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, "").with_context(|| format!("touch {path}"))?;
    }
    Ok(())
}

#[test]
fn vcs_makefile_dry_runs_with_make() -> Result<()> {
    let Ok(workspace) = make_workspace() else {
        eprintln!("skipping test: make must be installed for integration tests");
        return Ok(());
    };
    let root = Utf8Path::from_path(workspace.path()).context("utf-8 workspace")?;
    prepare(root, VCS_DESIGN, Tool::Vcs)?;

    let output = Command::new("make")
        .arg("-n")
        .current_dir(root)
        .output()
        .context("run make -n")?;
    ensure!(
        output.status.success(),
        "make -n failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).context("make output is utf-8")?;
    let analyse = stdout.find("vlogan").context("vlogan not scheduled")?;
    let elaborate = stdout.find("vcs -full64 -o sim").context("vcs not scheduled")?;
    ensure!(
        analyse < elaborate,
        "analysis must precede elaboration:\n{stdout}"
    );
    ensure!(
        !stdout.contains("./sim"),
        "default goal must not run the simulation:\n{stdout}"
    );
    Ok(())
}

#[rstest]
#[case::installed(None, "verilator -f model.vc --trace")]
#[case::local_root(
    Some("/opt/verilator"),
    "/opt/verilator/bin/verilator -f model.vc --trace"
)]
fn verilator_root_selects_the_executable(
    #[case] root_var: Option<&str>,
    #[case] expected: &str,
) -> Result<()> {
    let Ok(workspace) = make_workspace() else {
        eprintln!("skipping test: make must be installed for integration tests");
        return Ok(());
    };
    let root = Utf8Path::from_path(workspace.path()).context("utf-8 workspace")?;
    prepare(root, VERILATOR_DESIGN, Tool::Verilator)?;

    // Only the verilate step: `make -n` still runs recipes that use $(MAKE).
    let mut cmd = Command::new("make");
    cmd.args(["-n", "Vtop.mk"])
        .current_dir(root)
        .env_remove("VERILATOR_ROOT")
        .env_remove("VERILATOR");
    if let Some(value) = root_var {
        cmd.env("VERILATOR_ROOT", value);
    }
    let output = cmd.output().context("run make -n")?;
    ensure!(
        output.status.success(),
        "make -n failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).context("make output is utf-8")?;
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| l.contains("-f model.vc"))
        .context("verilate step not scheduled")?;
    ensure!(line == expected, "unexpected verilate step {line:?}");
    Ok(())
}
