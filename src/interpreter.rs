use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Pipeline};
use crate::env::Environment;
use crate::executor::{PipelineExecutor, RunReport};
use crate::parser;
use crate::reader::{LineReader, ReadLine};
use crate::signal::ForegroundSlot;
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;

/// Prompt printed before each line unless overridden.
pub const DEFAULT_PROMPT: &str = "🔥 ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// What happened to one input line.
#[derive(Debug)]
pub enum LineOutcome {
    /// Empty or all-whitespace line; nothing was launched.
    Blank,
    /// A builtin ran with this exit code.
    Builtin(ExitCode),
    /// External processes ran.
    Ran(RunReport),
    /// The pipeline could not be set up; the message was reported.
    Aborted,
    /// `quit` was requested.
    Quit,
}

/// An interactive command interpreter running pipelines of external programs.
///
/// Each line is split into pipeline stages, builtins are recognized on the
/// first word, and everything else is launched as child processes. Interrupts
/// are routed to the child named by [`Interpreter::foreground`] once a router
/// is installed with [`crate::install_router`].
///
/// Example
/// ```
/// use pipeline_shell::{Interpreter, LineOutcome};
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// assert!(matches!(sh.execute_line("help", &mut out), LineOutcome::Builtin(0)));
/// assert!(String::from_utf8(out).unwrap().starts_with("help"));
/// assert!(matches!(sh.execute_line("quit", &mut Vec::new()), LineOutcome::Quit));
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
    foreground: Arc<ForegroundSlot>,
    prompt: String,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of builtin factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>, foreground: Arc<ForegroundSlot>) -> Self {
        Self {
            env: Environment::new(),
            builtins,
            foreground,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// The slot naming the child that should receive forwarded interrupts.
    pub fn foreground(&self) -> Arc<ForegroundSlot> {
        Arc::clone(&self.foreground)
    }

    /// Read-eval-print loop.
    ///
    /// Returns `Ok` on `quit` or end-of-input and an error when reading input
    /// fails. Builtin output and the captured output of multi-stage pipelines
    /// go to `out`; single commands write to the inherited standard streams.
    pub fn repl(&mut self, reader: &mut dyn LineReader, out: &mut dyn Write) -> Result<()> {
        loop {
            let line = match reader
                .read_line(&self.prompt)
                .context("Error reading user input")?
            {
                ReadLine::Line(line) => line,
                ReadLine::Interrupted => continue,
                ReadLine::Eof => return Ok(()),
            };
            if let LineOutcome::Quit = self.execute_line(&line, out) {
                return Ok(());
            }
        }
    }

    /// Interpret one input line. Failures are reported on stderr and never
    /// end the loop; only `quit` does.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> LineOutcome {
        let pipeline = parser::parse_line(line);
        if pipeline.is_blank() {
            return LineOutcome::Blank;
        }

        if let Some(builtin) = self.find_builtin(&pipeline) {
            let code = match builtin.execute(out, &mut self.env) {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("pipeline_shell: {e:#}");
                    1
                }
            };
            return if self.env.should_exit {
                LineOutcome::Quit
            } else {
                LineOutcome::Builtin(code)
            };
        }

        let executor = PipelineExecutor::new(&self.env, &self.foreground);
        match executor.run(&pipeline, out) {
            Ok(report) => {
                report_failures(&report);
                LineOutcome::Ran(report)
            }
            Err(e) => {
                eprintln!("pipeline_shell: {e}");
                LineOutcome::Aborted
            }
        }
    }

    fn find_builtin(&self, pipeline: &Pipeline) -> Option<Box<dyn ExecutableCommand>> {
        let first = pipeline.first();
        let name = first.program()?;
        let args: Vec<&str> = first.args().iter().map(String::as_str).collect();
        self.builtins
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, &args))
    }
}

fn report_failures(report: &RunReport) {
    for stage in report.failures() {
        eprintln!("pipeline_shell: {stage}");
    }
    if let Some(e) = &report.output_error {
        eprintln!("pipeline_shell: failed to copy pipeline output: {e}");
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default builtins, `help` and `quit`,
    /// and a fresh foreground slot.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(
            vec![
                Box::new(Factory::<Help>::default()),
                Box::new(Factory::<Quit>::default()),
            ],
            Arc::new(ForegroundSlot::default()),
        )
    }
}
