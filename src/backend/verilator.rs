//! Verilator backend.
//!
//! Verilator reads a single `<name>.vc` argument file, generates
//! `V<top>.mk` in the work root, and that Makefile compiles the model into
//! `V<top>`. In `lint-only` mode only the first step runs and there is no
//! executable, so no run stage exists.

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use itertools::Itertools;
use make_env::EXTRA_OPTIONS_VAR;
use tracing::debug;

use super::{
    Backend, ConfigError, ConfigFile, RUN_TARGET, RunStage, SetupError, Tool, ToolSetup,
    require_toplevel,
};
use crate::ast::{Design, VerilatorOptions};
use crate::classify::{AnalysisKind, Classified, Language, Role, classify};
use crate::ir::{BuildGraph, Command};
use crate::makefile::{MakefileError, quote_word};
use crate::param::{ParamType, ParameterSet, TokenStyle};

/// Make variable naming the verilator executable.
pub const VERILATOR_VAR: &str = "VERILATOR";
/// Variable pointing at a local Verilator installation.
pub const VERILATOR_ROOT_VAR: &str = "VERILATOR_ROOT";
/// Make variable carrying extra verilator options.
pub const VERILATOR_OPTIONS_VAR: &str = "VERILATOR_OPTIONS";
/// Make variable carrying extra options for the model build.
pub const MAKE_OPTIONS_VAR: &str = "MAKE_OPTIONS";

/// Compilation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerilatorMode {
    /// SystemC testbench.
    Sc,
    /// C++ testbench.
    #[default]
    Cc,
    /// Lint the Verilog sources only.
    LintOnly,
}

impl VerilatorMode {
    const ALL: [Self; 3] = [Self::Sc, Self::Cc, Self::LintOnly];

    /// Name as written on the verilator command line without the dashes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sc => "sc",
            Self::Cc => "cc",
            Self::LintOnly => "lint-only",
        }
    }
}

impl fmt::Display for VerilatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerilatorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ConfigError::IllegalMode {
                mode: s.to_owned(),
                allowed: Self::ALL.iter().join(", "),
            })
    }
}

/// Handling of run-time arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CliParser {
    /// Typed plusargs and command-line args are serialised.
    #[default]
    Managed,
    /// Arguments reach the model untouched.
    Raw,
}

impl FromStr for CliParser {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "managed" => Ok(Self::Managed),
            "raw" => Ok(Self::Raw),
            other => Err(ConfigError::IllegalCliParser {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validated Verilator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    mode: VerilatorMode,
    cli_parser: CliParser,
}

impl Settings {
    fn from_options(options: &VerilatorOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            mode: options
                .mode
                .as_deref()
                .map_or(Ok(VerilatorMode::default()), str::parse)?,
            cli_parser: options
                .cli_parser
                .as_deref()
                .map_or(Ok(CliParser::default()), str::parse)?,
        })
    }

    const fn run_stage(self) -> RunStage {
        match (self.mode, self.cli_parser) {
            (VerilatorMode::LintOnly, _) => RunStage::Disabled,
            (_, CliParser::Managed) => RunStage::Managed { cmdline_args: true },
            (_, CliParser::Raw) => RunStage::Raw,
        }
    }
}

/// The Verilator backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verilator;

impl Backend for Verilator {
    fn setup(&self, design: &Design, params: &ParameterSet) -> Result<ToolSetup, SetupError> {
        let toplevel = require_toplevel(design)?;
        let options = &design.tool_options.verilator;
        let settings = Settings::from_options(options)?;
        let classification = classify(&design.files, params.of(ParamType::Vlogdefine));

        let vc_file = Utf8PathBuf::from(format!("{}.vc", design.name));
        let model = format!("V{toplevel}");
        let model_mk = format!("{model}.mk");

        let verilog: Vec<Utf8PathBuf> = classification
            .compiled()
            .filter(|src| {
                let keep = src.kind == AnalysisKind::Verilog;
                if !keep {
                    debug!(file = %src.path, "verilator skips non-Verilog source");
                }
                keep
            })
            .map(|src| src.path.to_owned())
            .collect();
        let includes: Vec<Utf8PathBuf> = classification
            .include_files()
            .map(|f| f.name.clone())
            .collect();
        let foreign: Vec<Utf8PathBuf> = classification
            .foreign_sources()
            .map(|f| f.name.clone())
            .collect();

        let mut vc = String::new();
        vc.push_str("--Mdir .\n");
        vc.push_str(&format!("--{}\n", settings.mode));
        for lib in &options.libs {
            vc.push_str(&format!("-LDFLAGS {lib}\n"));
        }
        for dir in classification.include_dirs() {
            vc.push_str(&format!("+incdir+{dir}\n-CFLAGS -I{dir}\n"));
        }
        for src in &verilog {
            vc.push_str(&format!("{src}\n"));
        }
        vc.push_str(&format!("--top-module {toplevel}\n--exe\n"));
        for src in &foreign {
            vc.push_str(&format!("{src}\n"));
        }
        for (key, value) in params.of(ParamType::Vlogparam) {
            vc.push_str(&format!("-G{key}={}\n", value.render(TokenStyle::BARE)));
        }
        for (key, value) in params.of(ParamType::Vlogdefine) {
            vc.push_str(&format!("-D{key}={}\n", value.render(TokenStyle::BARE)));
        }

        let mut graph = BuildGraph::default();
        graph.set_switched_variable(
            VERILATOR_VAR,
            VERILATOR_ROOT_VAR,
            "verilator",
            format!("$({VERILATOR_ROOT_VAR})/bin/verilator"),
        )?;
        graph.set_variable(VERILATOR_OPTIONS_VAR, quoted(&options.verilator_options)?)?;
        graph.set_variable(MAKE_OPTIONS_VAR, quoted(&options.make_options)?)?;
        graph.declare_input(vc_file.clone());
        graph.declare_inputs(verilog.iter().cloned());
        graph.declare_inputs(includes.iter().cloned());
        graph.declare_inputs(foreign.iter().cloned());

        let verilate = Command::from_variable(VERILATOR_VAR)
            .args(["-f", vc_file.as_str()])
            .variable(VERILATOR_OPTIONS_VAR);
        let mk_deps: Vec<Utf8PathBuf> = std::iter::once(vc_file.clone())
            .chain(verilog)
            .chain(includes)
            .collect();
        graph.add_target(vec![verilate], [model_mk.as_str()], mk_deps)?;

        if settings.mode == VerilatorMode::LintOnly {
            graph.set_default(model_mk.as_str())?;
        } else {
            let compile = Command::from_variable("MAKE")
                .variable(MAKE_OPTIONS_VAR)
                .args(["-f", model_mk.as_str()]);
            let deps: Vec<Utf8PathBuf> = std::iter::once(Utf8PathBuf::from(&model_mk))
                .chain(foreign)
                .collect();
            graph.add_target(vec![compile], [model.as_str()], deps)?;
            let run = Command::program(format!("./{model}")).variable(EXTRA_OPTIONS_VAR);
            graph.add_phony_target(vec![run], RUN_TARGET, [model.as_str()])?;
            graph.set_default(model.as_str())?;
        }

        let leftover = classification
            .entries()
            .iter()
            .filter(|entry| !consumed(entry))
            .map(|entry| entry.file.clone())
            .collect();
        Ok(ToolSetup::new(
            Tool::Verilator,
            graph,
            vec![ConfigFile::new(vc_file, vc)],
            leftover,
            settings.run_stage(),
        ))
    }
}

/// Quote each option and join them into a make variable value.
fn quoted(options: &[String]) -> Result<String, MakefileError> {
    let words = options
        .iter()
        .map(|opt| quote_word(opt))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(words.join(" "))
}

/// Whether the Verilator flow reads `entry` through the argument file.
fn consumed(entry: &Classified<'_>) -> bool {
    match &entry.role {
        Role::Include => true,
        Role::Compile { kind, .. } => *kind == AnalysisKind::Verilog,
        Role::Passthrough => entry.language == Language::CFamily,
        Role::Excluded => false,
    }
}
