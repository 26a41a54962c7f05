//! Pipeline execution: launch every stage, wait on them in order, then copy
//! the captured output of the terminal stage to the caller's output.

use crate::command::{Command, ExitCode, Pipeline};
use crate::env::Environment;
use crate::external::{self, LaunchError};
use crate::io_adapters::{CaptureBuffer, StageEndpoints};
use crate::signal::ForegroundSlot;
use crate::wiring;
use nix::unistd::Pid;
use std::fmt;
use std::io::{self, Write};
use std::process::Child;
use thiserror::Error;

/// Why a stage did not produce an exit code.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("wait failed: {0}")]
    Wait(#[source] io::Error),
}

/// Lifecycle of one stage.
#[derive(Debug)]
pub enum StageStatus {
    NotStarted,
    Running,
    Exited(ExitCode),
    Failed(StageError),
}

/// Errors that prevent a pipeline from starting at all.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to create pipe: {0}")]
    Wiring(#[source] io::Error),
}

/// Runtime state of one launched command.
///
/// Owns the child process and, for the terminal stage of a pipeline, the
/// buffer collecting its output. Link endpoints are not stored here: they are
/// moved into the child at launch and the interpreter's copies are closed
/// right away.
pub struct StageHandle {
    index: usize,
    program: String,
    pid: Option<Pid>,
    child: Option<Child>,
    capture: Option<CaptureBuffer>,
    status: StageStatus,
}

impl StageHandle {
    /// Launch `command` without blocking. A launch failure is recorded in the
    /// handle instead of being returned.
    pub fn start(
        index: usize,
        command: &Command,
        endpoints: StageEndpoints,
        env: &Environment,
    ) -> Self {
        let mut handle = Self {
            index,
            program: command.program().unwrap_or_default().to_owned(),
            pid: None,
            child: None,
            capture: None,
            status: StageStatus::NotStarted,
        };
        match external::launch(command, endpoints, env) {
            Ok(launched) => {
                handle.pid = i32::try_from(launched.child.id()).ok().map(Pid::from_raw);
                handle.child = Some(launched.child);
                handle.capture = launched.capture;
                handle.status = StageStatus::Running;
            }
            Err(e) => handle.status = StageStatus::Failed(e.into()),
        }
        handle
    }

    /// Process identifier while the stage runs; `None` if it never started.
    pub fn pid(&self) -> Option<Pid> {
        self.child.as_ref().and(self.pid)
    }

    pub fn status(&self) -> &StageStatus {
        &self.status
    }

    /// Block until the child exits and record its exit code.
    ///
    /// `foreground` keeps naming this child for as long as it runs. Where the
    /// platform can wait without reaping, the slot is cleared between exit and
    /// reaping; elsewhere it is cleared right after reaping. Calling this on a
    /// stage that never started does nothing.
    pub fn wait(&mut self, foreground: &ForegroundSlot) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Some(pid) = self.pid {
            // On failure the slot stays set until the reaping wait below returns.
            if wait_until_exited(pid).is_ok() {
                foreground.clear_if(pid);
            }
        }
        let waited = child.wait();
        if let Some(pid) = self.pid {
            foreground.clear_if(pid);
        }
        self.status = match waited {
            Ok(status) => StageStatus::Exited(external::exit_code(status)),
            Err(e) => StageStatus::Failed(StageError::Wait(e)),
        };
    }

    /// Everything the stage wrote to a captured stdout, once it reached end-of-stream.
    pub fn take_output(&mut self) -> Option<io::Result<Vec<u8>>> {
        self.capture.take().map(CaptureBuffer::collect)
    }

    fn into_report(self) -> StageReport {
        StageReport {
            index: self.index,
            program: self.program,
            status: self.status,
        }
    }
}

/// Wait for `pid` to exit without reaping it.
#[cfg(any(
    target_os = "android",
    target_os = "freebsd",
    target_os = "haiku",
    all(target_os = "linux", not(target_env = "uclibc")),
))]
fn wait_until_exited(pid: Pid) -> nix::Result<()> {
    use nix::errno::Errno;
    use nix::sys::wait::{Id, WaitPidFlag, waitid};

    loop {
        match waitid(Id::Pid(pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Err(Errno::EINTR) => continue,
            other => return other.map(|_| ()),
        }
    }
}

/// No non-reaping wait here; the caller keeps the child tracked until it is reaped.
#[cfg(not(any(
    target_os = "android",
    target_os = "freebsd",
    target_os = "haiku",
    all(target_os = "linux", not(target_env = "uclibc")),
)))]
fn wait_until_exited(_pid: Pid) -> nix::Result<()> {
    Err(nix::errno::Errno::ENOSYS)
}

/// Final state of one stage after the pipeline finished.
#[derive(Debug)]
pub struct StageReport {
    pub index: usize,
    pub program: String,
    pub status: StageStatus,
}

impl StageReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, StageStatus::Exited(0))
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.index + 1)?;
        if !self.program.is_empty() {
            write!(f, " ({})", self.program)?;
        }
        match &self.status {
            StageStatus::NotStarted => write!(f, ": not started"),
            StageStatus::Running => write!(f, ": still running"),
            StageStatus::Exited(code) => write!(f, ": exited with status {code}"),
            StageStatus::Failed(StageError::Launch(e)) => write!(f, ": failed to start: {e}"),
            StageStatus::Failed(e) => write!(f, ": {e}"),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    /// Set when the captured output could not be collected or copied out.
    pub output_error: Option<io::Error>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.output_error.is_none() && self.stages.iter().all(StageReport::succeeded)
    }

    /// Stages that failed to start, failed to be waited on or exited non-zero.
    pub fn failures(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter().filter(|s| !s.succeeded())
    }
}

/// Runs pipelines against a launch environment.
///
/// The foreground slot names the most recently started stage from the moment
/// it is spawned. Once every stage is launched that is the last stage that
/// started (the terminal stage when it launched), and it stays tracked until
/// it exits.
pub struct PipelineExecutor<'a> {
    env: &'a Environment,
    foreground: &'a ForegroundSlot,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(env: &'a Environment, foreground: &'a ForegroundSlot) -> Self {
        Self { env, foreground }
    }

    /// Launch every stage, wait on each in order, then copy the terminal
    /// stage's captured output into `out`.
    ///
    /// A single command shares the interpreter's streams and writes nothing to
    /// `out`. Stage failures never stop the remaining stages; they are
    /// collected in the returned report.
    pub fn run(&self, pipeline: &Pipeline, out: &mut dyn Write) -> Result<RunReport, ExecError> {
        let endpoints = wiring::wire(pipeline.len()).map_err(ExecError::Wiring)?;

        let mut stages = self.launch_all(pipeline, endpoints);

        for stage in &mut stages {
            stage.wait(self.foreground);
        }
        self.foreground.clear();

        let output_error = match stages.last_mut().and_then(StageHandle::take_output) {
            Some(output) => output
                .and_then(|bytes| {
                    out.write_all(&bytes)?;
                    out.flush()
                })
                .err(),
            None => None,
        };

        Ok(RunReport {
            stages: stages.into_iter().map(StageHandle::into_report).collect(),
            output_error,
        })
    }

    /// Start every stage left to right. Each stage that launches becomes the
    /// foreground process as soon as it is spawned, so the last one started
    /// stays tracked.
    fn launch_all(&self, pipeline: &Pipeline, endpoints: Vec<StageEndpoints>) -> Vec<StageHandle> {
        let mut stages = Vec::with_capacity(pipeline.len());
        for (index, (command, ends)) in pipeline.stages().iter().zip(endpoints).enumerate() {
            let stage = StageHandle::start(index, command, ends, self.env);
            if let Some(pid) = stage.pid() {
                self.foreground.set(pid);
            }
            stages.push(stage);
        }
        stages
    }
}
