use crate::command::{Command, ExitCode};
use crate::env::Environment;
use crate::io_adapters::{CaptureBuffer, StageEndpoints};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{self, Child, ExitStatus};
use thiserror::Error;

/// Reasons a stage could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The stage had no tokens, e.g. the middle of `a || b`.
    #[error("empty command")]
    EmptyCommand,
    #[error("{0}: command not found")]
    NotFound(String),
    /// The OS refused to create the process.
    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A started child plus, for a captured stage, the reader draining its output.
pub struct Launched {
    pub child: Child,
    pub capture: Option<CaptureBuffer>,
}

/// Starts `command` with the given streams without waiting for it.
///
/// The endpoints are consumed: once the child is spawned it holds its own
/// copies, and the interpreter's copies are closed before this returns. On
/// failure the endpoints are closed as well, so neighbouring stages see
/// end-of-stream or a broken pipe instead of hanging.
pub fn launch(
    command: &Command,
    endpoints: StageEndpoints,
    env: &Environment,
) -> Result<Launched, LaunchError> {
    let program = command.program().ok_or(LaunchError::EmptyCommand)?;
    let executable = find_command_path(&env.search_paths(), Path::new(program))
        .ok_or_else(|| LaunchError::NotFound(program.to_owned()))?;

    let capture_stdout = endpoints.stdout.is_capture();
    let mut cmd = process::Command::new(executable.as_os_str());
    cmd.args(command.args())
        .stdin(endpoints.stdin.stdio())
        .stdout(endpoints.stdout.stdio())
        .stderr(endpoints.stderr.stdio())
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(program);
    }

    let spawned = cmd.spawn();
    drop(cmd);
    let mut child = spawned.map_err(|source| LaunchError::Spawn {
        program: program.to_owned(),
        source,
    })?;

    let capture = if capture_stdout {
        child.stdout.take().map(CaptureBuffer::drain)
    } else {
        None
    };
    Ok(Launched { child, capture })
}

/// Shell-style exit code for a finished child.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it names an executable file.
/// - Relative with multiple components (e.g., `bin/sh`, `./foo`): returns it
///   if it names an executable file relative to the current directory.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first executable match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
