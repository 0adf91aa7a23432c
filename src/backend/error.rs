//! Error types for the backend module.
//!
//! This submodule isolates derive-macro-affected code to scope lint suppressions
//! narrowly.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. FIXME: remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

use crate::ir::GraphError;
use crate::makefile::MakefileError;

/// Invalid or incomplete tool configuration.
///
/// Raised before any file is written.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigError {
    /// The design does not name a top-level module.
    #[error("'{design}' is missing the mandatory parameter 'toplevel'")]
    #[diagnostic(code(edagraph::config::missing_toplevel))]
    MissingToplevel {
        /// Design name.
        design: String,
    },

    /// The Verilator mode is not one of the supported values.
    #[error("illegal verilator mode {mode}. Allowed values are {allowed}")]
    #[diagnostic(code(edagraph::config::illegal_mode))]
    IllegalMode {
        /// Requested mode.
        mode: String,
        /// Comma-separated list of legal modes.
        allowed: String,
    },

    /// The argument parser selection is not `managed` or `raw`.
    #[error("illegal cli_parser {value}. Allowed values are managed, raw")]
    #[diagnostic(code(edagraph::config::illegal_cli_parser))]
    IllegalCliParser {
        /// Requested parser.
        value: String,
    },

    /// Neither the design nor the command line selects a tool.
    #[error("no tool selected")]
    #[diagnostic(
        code(edagraph::config::missing_tool),
        help("set 'tool' in the design or pass --tool")
    )]
    MissingTool,

    /// The selected tool has no backend.
    #[error("unknown tool '{tool}'. Supported tools are vcs, verilator")]
    #[diagnostic(code(edagraph::config::unknown_tool))]
    UnknownTool {
        /// Requested tool.
        tool: String,
    },
}

/// Failure while turning a design into a tool setup.
#[derive(Debug, Error, Diagnostic)]
pub enum SetupError {
    /// Configuration was rejected.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// The build graph could not be constructed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// A tool option cannot be written into the Makefile.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Makefile(#[from] MakefileError),
}
