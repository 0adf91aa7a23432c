#![forbid(unsafe_code)]

//! Environment variable names shared by the edagraph library, its tests, and
//! the test helpers crate.

/// Environment variable override for the `make` executable.
///
/// # Examples
///
/// ```
/// use make_env::MAKE_ENV;
/// assert_eq!(MAKE_ENV, "EDAGRAPH_MAKE");
/// ```
pub const MAKE_ENV: &str = "EDAGRAPH_MAKE";

/// Makefile variable prefixed to every generated recipe line.
///
/// Leaving it unset expands to nothing; setting it (for example to `time` or
/// a job-server wrapper) wraps each tool invocation.
pub const LAUNCHER_VAR: &str = "EDAGRAPH_LAUNCHER";

/// Makefile variable carrying runtime arguments for the `run` target.
pub const EXTRA_OPTIONS_VAR: &str = "EXTRA_OPTIONS";
