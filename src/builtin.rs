use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process. They are only recognized as the first word of a line;
/// the rest of the line is not executed.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "help".
    fn name() -> &'static str;

    /// Executes the command, writing any output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Rows printed by `help`: name column, then description.
pub(crate) const SUMMARY: [(&str, &str); 2] =
    [("help", "Help"), ("quit, Ctrl + D", "Kill Shell")];

#[derive(FromArgs)]
/// Print the list of shell builtins.
pub struct Help {
    #[argh(positional, greedy)]
    /// ignored; the rest of the line is never executed
    pub _args: Vec<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        for (name, description) in SUMMARY {
            writeln!(stdout, "{name:<20} - {description}")?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Quit {
    #[argh(positional, greedy)]
    /// ignored; the shell always exits with status 0
    pub _args: Vec<String>,
}

impl BuiltinCommand for Quit {
    fn name() -> &'static str {
        "quit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}
