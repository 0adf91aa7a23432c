//! Tool backends.
//!
//! A backend turns a [`Design`] into a populated [`BuildGraph`] plus the
//! option files its commands read. Setup moves through a fixed sequence of
//! states, each its own type, so a stage cannot be skipped or revisited:
//!
//! 1. [`Design`]: unconfigured input.
//! 2. [`Classification`]: files partitioned by role.
//! 3. `Vec<`[`LibraryGroups`]`>`: analysis commands grouped per library.
//! 4. [`ToolSetup`]: graph built and option files rendered in memory.
//! 5. [`WrittenSetup`]: everything written to the work root. Produced by
//!    consuming the [`ToolSetup`].
//! 6. [`MakeInvocation`]: arguments for one `make` call.
//!
//! [`Classification`]: crate::classify::Classification
//! [`LibraryGroups`]: crate::group::LibraryGroups

mod error;
mod vcs;
mod verilator;

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result as AnyResult};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use itertools::Itertools;
use make_env::EXTRA_OPTIONS_VAR;
use tracing::{info, warn};

use crate::ast::{Design, SourceFile};
use crate::ir::BuildGraph;
use crate::makefile::{self, MakefileError};
use crate::param::{ParamType, ParameterSet, TokenStyle};
use crate::runner::file_io::write_file_utf8;

pub use error::{ConfigError, SetupError};
pub use vcs::Vcs;
pub use verilator::{CliParser, Verilator, VerilatorMode};

/// Name of the generated Makefile inside the work root.
pub const MAKEFILE: &str = "Makefile";

/// Phony target that runs the simulation.
pub const RUN_TARGET: &str = "run";

/// Supported tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Synopsys VCS.
    Vcs,
    /// Verilator.
    Verilator,
}

impl Tool {
    /// Lower-case tool name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vcs => "vcs",
            Self::Verilator => "verilator",
        }
    }

    /// Pick the tool from the command line, falling back to the design.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when neither source names a tool or the name is
    /// unknown.
    pub fn select(cli: Option<&str>, design: &Design) -> Result<Self, ConfigError> {
        cli.or(design.tool.as_deref())
            .ok_or(ConfigError::MissingTool)?
            .parse()
    }

    /// Run this tool's backend over `design`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] on invalid configuration or graph construction
    /// failure.
    pub fn setup(self, design: &Design, params: &ParameterSet) -> Result<ToolSetup, SetupError> {
        match self {
            Self::Vcs => Vcs.setup(design, params),
            Self::Verilator => Verilator.setup(design, params),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vcs" => Ok(Self::Vcs),
            "verilator" => Ok(Self::Verilator),
            other => Err(ConfigError::UnknownTool {
                tool: other.to_owned(),
            }),
        }
    }
}

/// Behaviour shared by every tool backend.
pub trait Backend {
    /// Build the graph, option files, and run stage for `design`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] on invalid configuration or graph construction
    /// failure. Nothing is written in either case.
    fn setup(&self, design: &Design, params: &ParameterSet) -> Result<ToolSetup, SetupError>;
}

/// Return the design's top-level module or fail.
pub(crate) fn require_toplevel(design: &Design) -> Result<&str, ConfigError> {
    design
        .toplevel
        .as_deref()
        .filter(|top| !top.is_empty())
        .ok_or_else(|| ConfigError::MissingToplevel {
            design: design.name.clone(),
        })
}

/// An auxiliary file written verbatim next to the Makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Path relative to the work root.
    pub name: Utf8PathBuf,
    /// Full file content.
    pub content: String,
}

impl ConfigFile {
    /// Pair a file name with its content.
    #[must_use]
    pub fn new(name: impl Into<Utf8PathBuf>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// How the `run` stage receives its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// The backend has nothing to run.
    Disabled,
    /// Typed plusargs, and optionally command-line args, are serialised.
    Managed {
        /// Whether `--key=value` command-line arguments are forwarded.
        cmdline_args: bool,
    },
    /// Raw arguments are forwarded verbatim.
    Raw,
}

/// A configured backend whose files have not been written yet.
#[derive(Debug, Clone)]
pub struct ToolSetup {
    tool: Tool,
    graph: BuildGraph,
    config_files: Vec<ConfigFile>,
    leftover: Vec<SourceFile>,
    run: RunStage,
}

impl ToolSetup {
    pub(crate) const fn new(
        tool: Tool,
        graph: BuildGraph,
        config_files: Vec<ConfigFile>,
        leftover: Vec<SourceFile>,
        run: RunStage,
    ) -> Self {
        Self {
            tool,
            graph,
            config_files,
            leftover,
            run,
        }
    }

    /// Tool that produced this setup.
    #[must_use]
    pub const fn tool(&self) -> Tool {
        self.tool
    }

    /// The populated build graph.
    #[must_use]
    pub const fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    /// Option and setup files in write order.
    #[must_use]
    pub fn config_files(&self) -> &[ConfigFile] {
        &self.config_files
    }

    /// Look up a config file by name.
    #[must_use]
    pub fn config_file(&self, name: &str) -> Option<&ConfigFile> {
        self.config_files.iter().find(|f| f.name == name)
    }

    /// Files no generated command consumed, unmodified and in input order.
    #[must_use]
    pub fn leftover(&self) -> &[SourceFile] {
        &self.leftover
    }

    /// How the run stage is driven.
    #[must_use]
    pub const fn run_stage(&self) -> RunStage {
        self.run
    }

    /// Render the Makefile text.
    ///
    /// # Errors
    ///
    /// Returns [`MakefileError`] if the graph cannot be serialised.
    pub fn makefile(&self) -> Result<String, MakefileError> {
        makefile::generate(&self.graph)
    }

    /// Write the Makefile and every option file into `dir`.
    ///
    /// Existing files are overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or any write fails.
    pub fn write(self, dir: &Dir) -> AnyResult<WrittenSetup> {
        let text = self.makefile().context("render Makefile")?;
        write_file_utf8(dir, Utf8Path::new(MAKEFILE), &text)?;
        let mut files = vec![Utf8PathBuf::from(MAKEFILE)];
        for file in &self.config_files {
            write_file_utf8(dir, &file.name, &file.content)?;
            files.push(file.name.clone());
        }
        info!(tool = %self.tool, files = files.len(), "wrote build files");
        Ok(WrittenSetup {
            tool: self.tool,
            files,
            run: self.run,
        })
    }
}

/// A setup whose files are on disk and ready for `make`.
#[derive(Debug, Clone)]
pub struct WrittenSetup {
    tool: Tool,
    files: Vec<Utf8PathBuf>,
    run: RunStage,
}

impl WrittenSetup {
    /// Tool that produced this setup.
    #[must_use]
    pub const fn tool(&self) -> Tool {
        self.tool
    }

    /// Files written, Makefile first.
    #[must_use]
    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }

    /// Invocation that builds the default goal.
    #[must_use]
    pub const fn build_invocation(&self) -> MakeInvocation {
        MakeInvocation { args: Vec::new() }
    }

    /// Invocation that runs the simulation, or `None` when the backend has no
    /// run stage.
    ///
    /// Managed stages serialise `+key=value` plusargs and, when enabled,
    /// `--key=value` command-line arguments; `raw` arguments follow them.
    /// Raw stages forward only `raw`.
    #[must_use]
    pub fn run_invocation(&self, params: &ParameterSet, raw: &[String]) -> Option<MakeInvocation> {
        let mut extra: Vec<String> = Vec::new();
        match self.run {
            RunStage::Disabled => return None,
            RunStage::Managed { cmdline_args } => {
                extra.extend(params.of(ParamType::Plusarg).iter().map(|(key, value)| {
                    format!("+{key}={}", value.render(TokenStyle::BARE))
                }));
                if cmdline_args {
                    extra.extend(params.of(ParamType::Cmdlinearg).iter().map(
                        |(key, value)| format!("--{key}={}", value.render(TokenStyle::BARE)),
                    ));
                }
            }
            RunStage::Raw => {
                if !params.of(ParamType::Plusarg).is_empty()
                    || !params.of(ParamType::Cmdlinearg).is_empty()
                {
                    warn!("cli_parser is raw; typed run arguments are not forwarded");
                }
            }
        }
        extra.extend(raw.iter().cloned());
        let mut args = vec![RUN_TARGET.to_owned()];
        if !extra.is_empty() {
            args.push(format!("{EXTRA_OPTIONS_VAR}={}", extra.iter().join(" ")));
        }
        Some(MakeInvocation { args })
    }
}

/// Arguments for a single `make` call inside the work root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeInvocation {
    args: Vec<String>,
}

impl MakeInvocation {
    /// Goals and variable assignments passed to `make`.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}
