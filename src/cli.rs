//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. It only
//! depends on `clap` and the standard library because `build.rs` includes it
//! to render the manual page.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Maximum number of jobs accepted by the CLI.
const MAX_JOBS: usize = 64;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number"))?;
    if (1..=MAX_JOBS).contains(&value) {
        Ok(value)
    } else {
        Err(format!("jobs must be between 1 and {MAX_JOBS}"))
    }
}

fn parse_assignment(s: &str) -> Result<String, String> {
    match s.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("'{s}' has an empty name")),
        _ if s.is_empty() => Err("assignment must not be empty".to_owned()),
        _ => Ok(s.to_owned()),
    }
}

/// Generate Makefile-driven builds for HDL simulators.
#[derive(Debug, Parser)]
#[command(name = "edagraph", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the design description.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "design.yml",
        env = "EDAGRAPH_FILE"
    )]
    pub file: PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Set the number of parallel make jobs.
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Tool backend to use; overrides the design's `tool` field.
    #[arg(long, value_name = "TOOL", env = "EDAGRAPH_TOOL")]
    pub tool: Option<String>,

    /// Directory receiving the Makefile and option files.
    ///
    /// Design file names are relative to this directory.
    #[arg(
        long,
        value_name = "DIR",
        default_value = ".",
        env = "EDAGRAPH_WORK_ROOT"
    )]
    pub work_root: PathBuf,

    /// Optional subcommand to execute; defaults to `build` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `build` as the default command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Parse the provided arguments, applying the default command when needed.
    ///
    /// # Errors
    ///
    /// Returns the clap error when parsing fails.
    pub fn try_parse_from_with_default<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map(Self::with_default_command)
    }

    /// Apply the default command if none was specified.
    #[must_use]
    fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Build);
        }
        self
    }
}

/// Arguments accepted by the `run` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct RunArgs {
    /// Override a plusarg parameter (`NAME=VALUE`, or `NAME` for booleans).
    #[arg(long = "plusarg", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub plusargs: Vec<String>,

    /// Override a command-line argument parameter.
    #[arg(long = "cmdlinearg", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub cmdlineargs: Vec<String>,

    /// Arguments forwarded verbatim to the simulation.
    #[arg(last = true, value_name = "ARGS")]
    pub raw: Vec<String>,
}

/// Available top-level commands for edagraph.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Write the Makefile and option files into the work root.
    Configure,

    /// Configure, then build the default goal with make `default`.
    Build,

    /// Configure, build, then run the simulation.
    Run(RunArgs),

    /// Write only the Makefile to the specified file without invoking make.
    Makefile {
        /// Output path for the generated Makefile.
        ///
        /// Use `-` to write to stdout.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}
