//! File creation helpers for the runner.
//! Writes generated files into capability-based directories or stdout.

use anyhow::{Context, Result as AnyResult, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

use super::RunnerError;

/// Return `true` when `path` is the CLI sentinel indicating "write to stdout".
#[must_use]
pub fn is_stdout_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Write `content` to `path` inside `dir`, creating parent directories.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written.
pub fn write_file_utf8(dir: &Dir, path: &Utf8Path, content: &str) -> AnyResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        dir.create_dir_all(parent)
            .with_context(|| format!("create parent directory {parent}"))?;
    }
    let mut file = dir
        .create(path)
        .with_context(|| format!("create {path}"))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("write {path}"))?;
    file.flush().with_context(|| format!("flush {path}"))?;
    file.sync_all().with_context(|| format!("sync {path}"))?;
    info!("Wrote {path}");
    Ok(())
}

/// Open `path` as a capability directory, creating it when missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or opened.
pub fn open_dir(path: &Utf8Path) -> AnyResult<Dir> {
    std::fs::create_dir_all(path).with_context(|| format!("create directory {path}"))?;
    Dir::open_ambient_dir(path, ambient_authority()).with_context(|| format!("open directory {path}"))
}

fn derive_dir_and_relative(path: &Utf8Path) -> AnyResult<(Dir, Utf8PathBuf)> {
    if path.is_relative() {
        let dir = Dir::open_ambient_dir(".", ambient_authority())
            .context("open current directory")?;
        return Ok((dir, path.to_owned()));
    }

    let mut ancestors = path.ancestors();
    ancestors.next();
    let (base, dir) = ancestors
        .find_map(|candidate| {
            Dir::open_ambient_dir(candidate, ambient_authority())
                .ok()
                .map(|dir| (candidate.to_owned(), dir))
        })
        .ok_or_else(|| anyhow!("no existing ancestor directory for {path}"))?;
    let relative = path
        .strip_prefix(&base)
        .context("derive path relative to ancestor")?
        .to_owned();
    Ok((dir, relative))
}

/// Write `content` to an arbitrary filesystem path.
///
/// # Errors
///
/// Returns an error if the path is not UTF-8 or the write fails.
pub fn write_file(path: &Path, content: &str) -> AnyResult<()> {
    let utf8_path = Utf8Path::from_path(path).ok_or_else(|| RunnerError::NonUtf8Path {
        path: path.to_path_buf(),
    })?;
    let (dir, relative) = derive_dir_and_relative(utf8_path)?;
    write_file_utf8(&dir, &relative, content)
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_all_ignoring_broken_pipe(writer: &mut impl Write, buf: &[u8]) -> io::Result<()> {
    match writer.write_all(buf) {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

fn flush_ignoring_broken_pipe(writer: &mut impl Write) -> io::Result<()> {
    match writer.flush() {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Write `content` to stdout, treating a closed pipe as success.
///
/// # Errors
///
/// Returns an error for any other write failure.
pub fn write_stdout(content: &str) -> AnyResult<()> {
    let mut stdout = io::stdout().lock();
    write_all_ignoring_broken_pipe(&mut stdout, content.as_bytes()).context("write to stdout")?;
    flush_ignoring_broken_pipe(&mut stdout).context("flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use rstest::rstest;

    #[rstest]
    #[case("-", true)]
    #[case("Makefile", false)]
    #[case("./-", false)]
    fn is_stdout_path_detects_dash(#[case] candidate: &str, #[case] expected: bool) {
        let path = Path::new(candidate);
        assert_eq!(
            is_stdout_path(path),
            expected,
            "unexpected result for {candidate}"
        );
    }

    #[test]
    fn write_file_utf8_creates_parent_directories() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf-8 temp dir")?;
        let dir = open_dir(root)?;
        write_file_utf8(&dir, Utf8Path::new("nested/work.1.f"), "-sverilog\n")?;

        let written = std::fs::read_to_string(temp.path().join("nested").join("work.1.f"))
            .context("read nested file")?;
        ensure!(written == "-sverilog\n", "unexpected content '{written}'");
        Ok(())
    }

    #[test]
    fn write_file_overwrites_existing_content() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let target = temp.path().join("Makefile");
        write_file(&target, "first\n")?;
        write_file(&target, "second\n")?;
        let written = std::fs::read_to_string(&target).context("read Makefile")?;
        ensure!(written == "second\n", "expected overwrite, got '{written}'");
        Ok(())
    }

    #[test]
    fn open_dir_creates_missing_work_root() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf-8 temp dir")?;
        let work = root.join("build/sim");
        open_dir(&work)?;
        ensure!(work.is_dir(), "expected {work} to exist");
        Ok(())
    }
}
