//! Helpers for working with the system `make` binary in integration tests.

use std::process::{Command, ExitStatus};
use tempfile::{TempDir, tempdir};
use thiserror::Error;

/// Errors that can occur when preparing make-backed integration tests.
#[derive(Error, Debug)]
pub enum MakeWorkspaceError {
    /// `make --version` failed to spawn, most likely because make is not in
    /// `PATH`.
    #[error("failed to spawn `make --version`: {0}")]
    ProbeSpawn(#[source] std::io::Error),
    /// `make --version` ran but returned a non-success status.
    #[error("`make --version` returned non-success status: {0}")]
    ProbeFailed(ExitStatus),
    /// Creating the temporary workspace failed.
    #[error("failed to create temporary make workspace: {0}")]
    Workspace(#[source] std::io::Error),
}

fn probe_make() -> Result<(), MakeWorkspaceError> {
    let output = Command::new("make")
        .arg("--version")
        .output()
        .map_err(MakeWorkspaceError::ProbeSpawn)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(MakeWorkspaceError::ProbeFailed(output.status))
    }
}

/// Ensure make is available and return a temporary directory for a test.
/// Callers should skip their scenario when this returns `Err`.
///
/// # Errors
///
/// Returns [`MakeWorkspaceError`] when make is missing or the directory
/// cannot be created.
pub fn make_workspace() -> Result<TempDir, MakeWorkspaceError> {
    probe_make()?;
    tempdir().map_err(MakeWorkspaceError::Workspace)
}
