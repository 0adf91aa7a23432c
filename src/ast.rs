//! Design description Abstract Syntax Tree structures.
//!
//! These types mirror the YAML design description consumed by every tool
//! backend: an ordered list of source files, a top-level module, typed
//! parameters, and per-tool option blocks. They are deserialised with
//! `serde-saphyr` by [`crate::design`].
//!
//! ```rust
//! use edagraph::ast::Design;
//!
//! let yaml = concat!(
//!     "edagraph_version: \"1.0.0\"\n",
//!     "name: design\n",
//!     "toplevel: top\n",
//!     "files:\n",
//!     "  - name: rtl/top.sv\n",
//!     "    file_type: systemVerilogSource\n",
//! );
//! let design: Design = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(design.files[0].library(), "work");
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::param::{ParamValue, Parameter};

/// Logical library used when a file does not name one.
pub const DEFAULT_LIBRARY: &str = "work";

/// Tag marking a file as part of the simulation file set.
pub const SIMULATION_TAG: &str = "simulation";

/// Top-level design description.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Design {
    /// Semantic version of the description format.
    pub edagraph_version: Version,

    /// Name of the build; used for the elaborated executable and option files.
    pub name: String,

    /// Top-level module or entity. Every backend requires it.
    #[serde(default)]
    pub toplevel: Option<String>,

    /// Tool backend to use when the command line does not select one.
    #[serde(default)]
    pub tool: Option<String>,

    /// Ordered design files.
    #[serde(default)]
    pub files: Vec<SourceFile>,

    /// Typed parameters keyed by name, in declaration order.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,

    /// Tool-specific option blocks.
    #[serde(default)]
    pub tool_options: ToolOptions,
}

/// One design file as declared in the description.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceFile {
    /// Path of the file, relative to the work root.
    pub name: Utf8PathBuf,

    /// File type tag such as `verilogSource-2005` or `vhdlSource`.
    #[serde(default)]
    pub file_type: Option<String>,

    /// Flow tags. A missing list implies membership of `simulation`.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Logical library the file is analysed into.
    #[serde(default)]
    pub logical_name: Option<String>,

    /// Per-file defines, applied on top of the global defines.
    #[serde(default)]
    pub define: IndexMap<String, ParamValue>,

    /// Marks a Verilog header that is only pulled in by an include directive.
    #[serde(default)]
    pub is_include_file: bool,

    /// Include directory to register instead of the file's parent directory.
    #[serde(default)]
    pub include_path: Option<Utf8PathBuf>,
}

impl SourceFile {
    /// Create an untagged file of the given type in the default library.
    #[must_use]
    pub fn new(name: impl Into<Utf8PathBuf>, file_type: &str) -> Self {
        Self {
            name: name.into(),
            file_type: Some(file_type.to_owned()),
            tags: None,
            logical_name: None,
            define: IndexMap::new(),
            is_include_file: false,
            include_path: None,
        }
    }

    /// Set the logical library.
    #[must_use]
    pub fn in_library(mut self, library: &str) -> Self {
        self.logical_name = Some(library.to_owned());
        self
    }

    /// Add a per-file define.
    #[must_use]
    pub fn with_define(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.define.insert(key.to_owned(), value.into());
        self
    }

    /// Replace the tag list.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Flag the file as an include-only header.
    #[must_use]
    pub const fn as_include(mut self) -> Self {
        self.is_include_file = true;
        self
    }

    /// Logical library, falling back to [`DEFAULT_LIBRARY`] when unset or
    /// empty.
    #[must_use]
    pub fn library(&self) -> &str {
        self.logical_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_LIBRARY)
    }

    /// Whether the file takes part in simulation.
    #[must_use]
    pub fn in_simulation(&self) -> bool {
        self.tags
            .as_ref()
            .is_none_or(|tags| tags.iter().any(|t| t == SIMULATION_TAG))
    }

    /// Declared file type, if any.
    #[must_use]
    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }

    /// File path as a borrowed UTF-8 path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.name
    }
}

/// Option blocks for each supported tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolOptions {
    /// Synopsys VCS options.
    #[serde(default)]
    pub vcs: VcsOptions,
    /// Verilator options.
    #[serde(default)]
    pub verilator: VerilatorOptions,
}

/// Options understood by the VCS backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VcsOptions {
    /// Disable 64-bit mode.
    #[serde(default, rename = "32bit")]
    pub bits32: bool,
    /// Additional options for analysis with `vlogan`.
    #[serde(default)]
    pub vlogan_options: Vec<String>,
    /// Additional options for analysis with `vhdlan`.
    #[serde(default)]
    pub vhdlan_options: Vec<String>,
    /// Additional options for elaboration with `vcs`.
    #[serde(default)]
    pub vcs_options: Vec<String>,
    /// Additional run-time options for the simulation.
    #[serde(default)]
    pub run_options: Vec<String>,
}

/// Options understood by the Verilator backend.
///
/// `mode` and `cli_parser` stay as raw strings so an illegal value surfaces as
/// a configuration error naming the offending value rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VerilatorOptions {
    /// Compilation mode: `cc`, `sc`, or `lint-only`.
    #[serde(default)]
    pub mode: Option<String>,
    /// `managed` or `raw` handling of run-time arguments.
    #[serde(default)]
    pub cli_parser: Option<String>,
    /// Extra libraries for the verilated model to link against.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Additional options for verilator.
    #[serde(default)]
    pub verilator_options: Vec<String>,
    /// Additional arguments passed to make when compiling the model.
    #[serde(default)]
    pub make_options: Vec<String>,
}
