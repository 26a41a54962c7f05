//! Line-reading front ends for the REPL.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Result of asking the user for one line.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
    /// A complete line, without its terminator.
    Line(String),
    /// The user pressed Ctrl-C at the prompt.
    Interrupted,
    /// Input is exhausted; treated as `quit`.
    Eof,
}

/// Source of input lines. Errors are input-read failures and end the REPL.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine>;
}

impl LineReader for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.add_history_entry(line.as_str())
                        .map_err(|e| io::Error::other(e.to_string()))?;
                }
                Ok(ReadLine::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadLine::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadLine::Eof),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e.to_string())),
        }
    }
}

/// Reads newline-terminated lines from any buffered source, writing the
/// prompt to `prompt_out` first.
///
/// A final line that is not newline-terminated counts as end-of-input, and
/// input that is not UTF-8 is a read error.
pub struct PlainReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> PlainReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.prompt_out)
    }
}

impl PlainReader<StdinLock<'static>, Stdout> {
    /// The interpreter's own standard input and output.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LineReader for PlainReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        match line.strip_suffix('\n') {
            Some(body) => Ok(ReadLine::Line(body.strip_suffix('\r').unwrap_or(body).to_owned())),
            None => Ok(ReadLine::Eof),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, ErrorKind};

    fn reader(input: &[u8]) -> PlainReader<Cursor<Vec<u8>>, Vec<u8>> {
        PlainReader::new(Cursor::new(input.to_vec()), Vec::new())
    }

    #[test]
    fn test_lines_then_eof() {
        let mut r = reader(b"ls -l\r\necho hi | cat\n");
        assert_eq!(r.read_line("> ").unwrap(), ReadLine::Line("ls -l".into()));
        assert_eq!(r.read_line("> ").unwrap(), ReadLine::Line("echo hi | cat".into()));
        assert_eq!(r.read_line("> ").unwrap(), ReadLine::Eof);
        assert_eq!(r.prompt_out, b"> > > ");
    }

    #[test]
    fn test_empty_stream_is_eof() {
        assert_eq!(reader(b"").read_line("$ ").unwrap(), ReadLine::Eof);
    }

    #[test]
    fn test_unterminated_last_line_is_eof() {
        let mut r = reader(b"help\nquit");
        assert_eq!(r.read_line("$ ").unwrap(), ReadLine::Line("help".into()));
        assert_eq!(r.read_line("$ ").unwrap(), ReadLine::Eof);
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let err = reader(b"\xff\xfe\n").read_line("$ ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
