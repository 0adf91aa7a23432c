//! Spawning `make` and relaying its output.
//! Internal to `runner`; the public entry points are re-exported there.

use camino::{Utf8Path, Utf8PathBuf};
use make_env::MAKE_ENV;
use std::{
    env,
    ffi::OsString,
    io::{self, BufReader, Read, Write},
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
};
use tracing::{debug, info, warn};

use super::MAKE_PROGRAM;
use crate::backend::MakeInvocation;

fn resolve_make_program_with<F>(mut read_env: F) -> Utf8PathBuf
where
    F: FnMut(&str) -> Option<OsString>,
{
    read_env(MAKE_ENV)
        .filter(|value| !value.is_empty())
        .and_then(|value| Utf8PathBuf::from_path_buf(PathBuf::from(value)).ok())
        .unwrap_or_else(|| Utf8PathBuf::from(MAKE_PROGRAM))
}

/// The `make` executable, honouring the `EDAGRAPH_MAKE` override.
#[must_use]
pub fn resolve_make_program() -> Utf8PathBuf {
    resolve_make_program_with(|key| env::var_os(key))
}

fn make_command(program: &Utf8Path, work_root: &Utf8Path, jobs: Option<usize>) -> Command {
    let mut cmd = Command::new(program.as_std_path());
    cmd.current_dir(work_root.as_std_path());
    if let Some(count) = jobs {
        cmd.arg("-j").arg(count.to_string());
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

fn log_command_execution(cmd: &Command) {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
    info!("Running command: {} {}", program, args.join(" "));
}

/// Run `make` inside `work_root` with the goals and assignments of
/// `invocation`, streaming its output to ours.
///
/// # Errors
///
/// Returns an [`io::Error`] if `make` cannot be spawned, its pipes are
/// unavailable, or it exits unsuccessfully.
pub fn run_make(
    program: &Utf8Path,
    work_root: &Utf8Path,
    jobs: Option<usize>,
    invocation: &MakeInvocation,
) -> io::Result<()> {
    let mut cmd = make_command(program, work_root, jobs);
    cmd.args(invocation.args());
    log_command_execution(&cmd);
    let child = cmd.spawn()?;
    let status = stream_until_exit(child)?;
    check_exit_status(status)
}

fn stream_until_exit(mut child: Child) -> io::Result<ExitStatus> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(io::Error::other("make is missing its stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(io::Error::other("make is missing its stderr pipe"));
    };

    let out = thread::spawn(move || {
        forward_child_output(BufReader::new(stdout), io::stdout().lock(), "stdout")
    });
    let err = thread::spawn(move || {
        forward_child_output(BufReader::new(stderr), io::stderr().lock(), "stderr")
    });

    let status = child.wait()?;
    report_forwarding(out.join(), "stdout");
    report_forwarding(err.join(), "stderr");
    Ok(status)
}

fn report_forwarding(result: thread::Result<ForwardStats>, stream: &str) {
    match result {
        Ok(stats) if stats.write_failed => {
            debug!("{stream} closed while forwarding make output; output truncated");
        }
        Ok(_) => {}
        Err(err) => warn!("{stream} forwarding thread panicked: {err:?}"),
    }
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        debug!("failed to kill make after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        debug!("failed to reap make after {context}: {err}");
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ForwardStats {
    bytes_read: usize,
    bytes_written: usize,
    write_failed: bool,
}

/// Byte-counting wrapper used on both ends of the copy.
struct Counted<T> {
    inner: T,
    count: u64,
}

impl<T> Counted<T> {
    const fn new(inner: T) -> Self {
        Self { inner, count: 0 }
    }

    fn byte_count(&self) -> usize {
        usize::try_from(self.count).unwrap_or(usize::MAX)
    }
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

impl<W: Write> Write for Counted<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Copy `reader` into `writer`. When the writer fails the rest of the
/// stream is drained so the child never blocks on a full pipe.
fn forward_child_output<R: Read, W: Write>(
    reader: R,
    writer: W,
    stream: &'static str,
) -> ForwardStats {
    let mut source = Counted::new(reader);
    let mut sink = Counted::new(writer);
    let write_failed = match io::copy(&mut source, &mut sink) {
        Ok(_) => false,
        Err(err) => {
            debug!("failed to forward make {stream}: {err}; discarding remaining bytes");
            if let Err(drain_err) = io::copy(&mut source, &mut io::sink()) {
                debug!("failed to drain make {stream}: {drain_err}");
            }
            true
        }
    };
    ForwardStats {
        bytes_read: source.byte_count(),
        bytes_written: sink.byte_count(),
        write_failed,
    }
}

fn check_exit_status(status: ExitStatus) -> io::Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("make exited with {status}")))
    }
}
