//! Design descriptions shared by the integration tests.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Mixed-language VCS design with a header, two define batches, a VHDL
/// library, a plusarg, and a constraints file no backend consumes.
pub const VCS_DESIGN: &str = r#"edagraph_version: "1.0.0"
name: sim
toplevel: tb
tool: vcs
files:
  - name: rtl/defs.vh
    file_type: verilogSource
    is_include_file: true
  - name: rtl/a.sv
    file_type: systemVerilogSource
    define:
      X: 1
  - name: rtl/b.sv
    file_type: systemVerilogSource
    define:
      X: 1
  - name: rtl/c.v
    file_type: verilogSource
  - name: ip/fifo.vhd
    file_type: vhdlSource
    logical_name: ip
  - name: timing.sdc
    file_type: SDC
parameters:
  seed:
    datatype: int
    paramtype: plusarg
    default: 1
  WIDTH:
    datatype: int
    paramtype: vlogparam
    default: 8
tool_options:
  vcs:
    vcs_options: [-debug_access+all]
    run_options: [-l, run.log]
"#;

/// Verilator design with a C++ testbench and a cmdline argument.
pub const VERILATOR_DESIGN: &str = r#"edagraph_version: "1.0.0"
name: model
toplevel: top
tool: verilator
files:
  - name: rtl/top.sv
    file_type: systemVerilogSource
  - name: tb/main.cpp
    file_type: cppSource
parameters:
  cycles:
    datatype: int
    paramtype: cmdlinearg
    default: 100
tool_options:
  verilator:
    mode: cc
    verilator_options: [--trace]
"#;

/// Write `yaml` as `design.yml` inside `dir` and return its path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_design(dir: &Utf8Path, yaml: &str) -> Result<Utf8PathBuf> {
    let path = dir.join("design.yml");
    fs::write(&path, yaml).with_context(|| format!("write {path}"))?;
    Ok(path)
}
