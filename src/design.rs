//! Design description loading.
//!
//! The YAML is parsed once with `serde-saphyr` straight into
//! [`Design`](crate::ast::Design); there is no templating pass. The loader
//! checks the format version before anything else looks at the content so
//! later stages can rely on the schema.

// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. FIXME: remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use semver::Version;
use thiserror::Error;
use tracing::debug;

use crate::ast::Design;

/// Major format version understood by this release.
pub const SUPPORTED_MAJOR: u64 = 1;

/// Errors raised while loading a design description.
#[derive(Debug, Error, Diagnostic)]
pub enum DesignError {
    /// The description could not be read from disk.
    #[error("failed to read design description {path}")]
    #[diagnostic(code(edagraph::design::read))]
    Read {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The YAML did not match the schema.
    #[error("failed to parse design description {name}: {message}")]
    #[diagnostic(
        code(edagraph::design::parse),
        help("check the file against the documented design schema")
    )]
    Parse {
        /// Display name of the source.
        name: String,
        /// Parser message including the location.
        message: String,
    },

    /// The description targets a format this release cannot read.
    #[error("design format version {version} is not supported (expected 1.x)")]
    #[diagnostic(code(edagraph::design::version))]
    UnsupportedVersion {
        /// Declared version.
        version: Version,
    },
}

/// Parse a design description from a YAML string.
///
/// # Errors
///
/// Returns [`DesignError`] when the YAML is malformed or the format version
/// is unsupported.
pub fn from_str(yaml: &str) -> Result<Design, DesignError> {
    from_str_named(yaml, "<string>")
}

/// Parse a design description, labelling errors with `name`.
///
/// # Errors
///
/// Returns [`DesignError`] when the YAML is malformed or the format version
/// is unsupported.
pub fn from_str_named(yaml: &str, name: &str) -> Result<Design, DesignError> {
    let design: Design = serde_saphyr::from_str(yaml).map_err(|e| DesignError::Parse {
        name: name.to_owned(),
        message: e.to_string(),
    })?;
    if design.edagraph_version.major != SUPPORTED_MAJOR {
        return Err(DesignError::UnsupportedVersion {
            version: design.edagraph_version,
        });
    }
    debug!(
        name = %design.name,
        files = design.files.len(),
        parameters = design.parameters.len(),
        "loaded design description"
    );
    Ok(design)
}

/// Load a design description from `path`.
///
/// # Errors
///
/// Returns [`DesignError`] when the file cannot be read or parsed.
pub fn from_path(path: &Utf8Path) -> Result<Design, DesignError> {
    let yaml = fs::read_to_string(path).map_err(|source| DesignError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_str_named(&yaml, path.as_str())
}
