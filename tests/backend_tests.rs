//! Integration tests for the tool backends.
//!
//! Designs are parsed from YAML and pushed through the public backend API so
//! the option files, leftovers, and run stages are checked as a user of the
//! library would see them.

use anyhow::{Context, Result, ensure};
use camino::Utf8Path;
use edagraph::backend::{ConfigError, RunStage, SetupError, Tool, ToolSetup};
use edagraph::design;
use edagraph::ir::Variable;
use edagraph::param::ParameterSet;
use rstest::rstest;
use test_support::design::{VCS_DESIGN, VERILATOR_DESIGN};

fn setup(yaml: &str, tool: Tool) -> Result<ToolSetup> {
    let design = design::from_str(yaml)?;
    let params = ParameterSet::from_declarations(&design.parameters)?;
    Ok(tool.setup(&design, &params)?)
}

fn content<'a>(setup: &'a ToolSetup, name: &str) -> Result<&'a str> {
    setup
        .config_file(name)
        .map(|f| f.content.as_str())
        .with_context(|| format!("missing config file {name}"))
}

#[rstest]
#[case("synopsys_sim.setup", "WORK > DEFAULT\nDEFAULT : ./work\nip : ./ip\n")]
#[case("work.1.f", "-sverilog +define+X=1 +incdir+rtl\n")]
#[case("work.2.f", "-sverilog +incdir+rtl\n")]
#[case("ip.1.f", "\n")]
#[case("vcs.f", "-top tb -debug_access+all\n")]
#[case("parameters.txt", "assign 8 WIDTH\n")]
fn vcs_writes_option_files(#[case] name: &str, #[case] expected: &str) -> Result<()> {
    let vcs = setup(VCS_DESIGN, Tool::Vcs)?;
    let actual = content(&vcs, name)?;
    ensure!(actual == expected, "{name}: expected {expected:?}, got {actual:?}");
    Ok(())
}

#[test]
fn string_default_is_quoted_like_an_override() -> Result<()> {
    let yaml = VCS_DESIGN.replace(
        "  WIDTH:\n    datatype: int\n    paramtype: vlogparam\n    default: 8\n",
        "  NAME:\n    datatype: str\n    paramtype: generic\n    default: 1\n",
    );
    let vcs = setup(&yaml, Tool::Vcs)?;
    let actual = content(&vcs, "parameters.txt")?;
    ensure!(
        actual == "assign \"1\" NAME\n",
        "unexpected parameters file {actual:?}"
    );
    Ok(())
}

#[test]
fn mismatched_default_fails_before_setup() -> Result<()> {
    let yaml = VCS_DESIGN.replace("    default: 8\n", "    default: wide\n");
    let parsed = design::from_str(&yaml)?;
    let err = ParameterSet::from_declarations(&parsed.parameters)
        .err()
        .context("a non-integer default must be rejected")?;
    ensure!(
        err.to_string().contains("`WIDTH`"),
        "unexpected error {err}"
    );
    Ok(())
}

#[test]
fn vcs_config_files_keep_write_order() -> Result<()> {
    let vcs = setup(VCS_DESIGN, Tool::Vcs)?;
    let names: Vec<&str> = vcs.config_files().iter().map(|f| f.name.as_str()).collect();
    ensure!(
        names
            == [
                "synopsys_sim.setup",
                "work.1.f",
                "work.2.f",
                "ip.1.f",
                "vcs.f",
                "parameters.txt"
            ],
        "unexpected order {names:?}"
    );
    Ok(())
}

#[rstest]
#[case(VCS_DESIGN, Tool::Vcs, &["timing.sdc"])]
#[case(VERILATOR_DESIGN, Tool::Verilator, &[])]
fn leftover_lists_unconsumed_files(
    #[case] yaml: &str,
    #[case] tool: Tool,
    #[case] expected: &[&str],
) -> Result<()> {
    let built = setup(yaml, tool)?;
    let leftover: Vec<&str> = built.leftover().iter().map(|f| f.name.as_str()).collect();
    ensure!(leftover == expected, "unexpected leftover {leftover:?}");
    Ok(())
}

#[test]
fn verilator_setup_builds_the_model() -> Result<()> {
    let model = setup(VERILATOR_DESIGN, Tool::Verilator)?;
    let vc = content(&model, "model.vc")?;
    ensure!(
        vc == "--Mdir .\n--cc\nrtl/top.sv\n--top-module top\n--exe\ntb/main.cpp\n",
        "unexpected argument file {vc:?}"
    );
    let graph = model.graph();
    ensure!(
        graph.default_target() == Some(Utf8Path::new("Vtop")),
        "default should be the model executable"
    );
    let exe = graph
        .producer(Utf8Path::new("Vtop"))
        .context("Vtop target")?;
    let deps: Vec<&str> = exe.dependencies.iter().map(|d| d.as_str()).collect();
    ensure!(
        deps == ["Vtop.mk", "tb/main.cpp"],
        "unexpected model deps {deps:?}"
    );
    ensure!(
        graph.variables().get("VERILATOR_OPTIONS").and_then(Variable::as_plain) == Some("--trace"),
        "verilator options should land in a make variable"
    );
    ensure!(
        model.run_stage() == RunStage::Managed { cmdline_args: true },
        "managed parser forwards command-line args"
    );
    Ok(())
}

#[test]
fn verilator_lint_only_has_no_run_stage() -> Result<()> {
    let yaml = VERILATOR_DESIGN.replace("mode: cc", "mode: lint-only");
    let lint = setup(&yaml, Tool::Verilator)?;
    ensure!(lint.run_stage() == RunStage::Disabled, "lint-only cannot run");
    ensure!(
        lint.graph().default_target() == Some(Utf8Path::new("Vtop.mk")),
        "lint-only stops after verilation"
    );
    ensure!(
        lint.graph().producer(Utf8Path::new("run")).is_none(),
        "no run target expected"
    );
    Ok(())
}

#[test]
fn illegal_mode_is_rejected_before_anything_is_built() -> Result<()> {
    let yaml = VERILATOR_DESIGN.replace("mode: cc", "mode: fast");
    let design = design::from_str(&yaml)?;
    let err = Tool::Verilator
        .setup(&design, &ParameterSet::default())
        .err()
        .context("setup should fail")?;
    ensure!(
        matches!(
            err,
            SetupError::Config(ConfigError::IllegalMode { ref mode, .. }) if mode == "fast"
        ),
        "unexpected error {err}"
    );
    Ok(())
}

#[rstest]
#[case(Some("verilator"), Tool::Verilator)]
#[case(None, Tool::Vcs)]
fn tool_selection_prefers_the_command_line(
    #[case] cli: Option<&str>,
    #[case] expected: Tool,
) -> Result<()> {
    let design = design::from_str(VCS_DESIGN)?;
    let tool = Tool::select(cli, &design)?;
    ensure!(tool == expected, "selected {tool}, expected {expected}");
    Ok(())
}
