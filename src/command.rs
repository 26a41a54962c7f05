use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children terminated by a signal are reported as `128 + signal`, the way
/// POSIX shells do.
pub type ExitCode = i32;

/// One pipeline stage: the program name followed by its arguments.
///
/// A `Command` is produced by the tokenizer and never changes afterwards.
/// It may be empty when the user typed nothing between two pipe separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// All tokens, program name first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The program to launch, or `None` for an empty stage.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the program name.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Commands connected left to right, each stage's output feeding the next
/// stage's input.
///
/// A pipeline always holds at least one command; a single-element pipeline is
/// a plain command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Command>,
}

impl Pipeline {
    pub fn new(mut stages: Vec<Command>) -> Self {
        if stages.is_empty() {
            stages.push(Command::default());
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[Command] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// First stage; the only place where builtins are recognized.
    pub fn first(&self) -> &Command {
        &self.stages[0]
    }

    pub fn is_single(&self) -> bool {
        self.stages.len() == 1
    }

    /// True for a line that was empty or all whitespace.
    pub fn is_blank(&self) -> bool {
        self.is_single() && self.first().is_empty()
    }
}

/// Object-safe trait for commands the interpreter runs in-process.
pub trait ExecutableCommand {
    /// Executes the command, writing any output to `stdout`.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
