//! Path resolution for the runner.
//!
//! Every path given on the command line is interpreted relative to the
//! `-C/--directory` option when it is relative.

use camino::Utf8PathBuf;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::RunnerError;
use crate::cli::Cli;

fn to_utf8(candidate: PathBuf) -> Result<Utf8PathBuf, RunnerError> {
    Utf8PathBuf::from_path_buf(candidate).map_err(|path| RunnerError::NonUtf8Path { path })
}

/// Resolve a CLI path against `-C`, leaving absolute paths untouched.
#[must_use]
pub(super) fn resolve_output_path<'a>(cli: &Cli, path: &'a Path) -> Cow<'a, Path> {
    match &cli.directory {
        Some(dir) if path.is_relative() => Cow::Owned(dir.join(path)),
        _ => Cow::Borrowed(path),
    }
}

/// Location of the design description.
pub(super) fn resolve_design_path(cli: &Cli) -> Result<Utf8PathBuf, RunnerError> {
    let path = to_utf8(resolve_output_path(cli, &cli.file).into_owned())?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(RunnerError::DesignNotFound {
            path: path.into_std_path_buf(),
        })
    }
}

/// Directory that receives the Makefile and in which `make` runs.
pub(super) fn resolve_work_root(cli: &Cli) -> Result<Utf8PathBuf, RunnerError> {
    to_utf8(resolve_output_path(cli, &cli.work_root).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from_with_default(std::iter::once("edagraph").chain(args.iter().copied()))
            .expect("parse cli")
    }

    #[rstest]
    #[case(&["--work-root", "build"], "build")]
    #[case(&["-C", "proj", "--work-root", "build"], "proj/build")]
    #[case(&["-C", "proj", "--work-root", "/abs/build"], "/abs/build")]
    #[case(&["-C", "proj"], "proj/.")]
    fn work_root_follows_directory(#[case] args: &[&str], #[case] expected: &str) {
        let root = resolve_work_root(&cli(args)).expect("work root");
        assert_eq!(root, Utf8PathBuf::from(expected));
    }

    #[rstest]
    fn missing_design_is_reported_with_its_path() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().to_str().expect("utf-8 temp dir");
        let err = resolve_design_path(&cli(&["-C", dir])).expect_err("no design");
        match err {
            RunnerError::DesignNotFound { path } => {
                assert_eq!(path, temp.path().join("design.yml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
