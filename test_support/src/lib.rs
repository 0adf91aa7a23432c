//! Test utilities for process management and design fixtures.
//!
//! This crate provides a fake `make` executable that records how it was
//! invoked, a probe for the system `make`, and small design descriptions
//! shared by the integration tests.

pub mod design;
pub mod make;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fake `make` script and the log of its invocations.
#[derive(Debug)]
pub struct FakeMake {
    dir: TempDir,
    path: PathBuf,
}

impl FakeMake {
    /// Path to the executable script.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the invocation log.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("make.log")
    }

    /// One entry per invocation: the working directory followed by the
    /// space-joined arguments, separated by `|`.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|log| log.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

/// Create a fake `make` executable that logs its arguments and exits with
/// `exit_code`.
///
/// # Panics
///
/// Panics if the script cannot be created.
#[must_use]
pub fn fake_make(exit_code: i32) -> FakeMake {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("make");
    let log = dir.path().join("make.log");
    let mut file = File::create(&path).expect("script");
    writeln!(
        file,
        "#!/bin/sh\nprintf '%s|%s\\n' \"$(pwd -P)\" \"$*\" >> '{}'\nexit {exit_code}",
        log.display()
    )
    .expect("write script");
    drop(file);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("perms");
    }
    FakeMake { dir, path }
}
