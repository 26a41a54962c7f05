use argh::FromArgs;
use pipeline_shell::{DEFAULT_PROMPT, Interpreter, LineReader, PlainReader, install_router};
use rustyline::DefaultEditor;
use std::io::{self, IsTerminal};
use std::process::exit;

#[derive(FromArgs)]
/// Interactive command interpreter: runs programs and `|` pipelines of programs.
struct Options {
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// text printed before each input line
    prompt: String,

    #[argh(switch)]
    /// read plain lines from standard input instead of using the line editor
    plain: bool,
}

fn main() {
    let options: Options = argh::from_env();

    let mut sh = Interpreter::default().with_prompt(options.prompt);
    if let Err(e) = install_router(sh.foreground()) {
        eprintln!("pipeline_shell: failed to install SIGINT handler: {e}");
        exit(1);
    }

    let mut reader: Box<dyn LineReader> = if options.plain || !io::stdin().is_terminal() {
        Box::new(PlainReader::stdio())
    } else {
        match DefaultEditor::new() {
            Ok(editor) => Box::new(editor),
            Err(e) => {
                eprintln!("pipeline_shell: line editor unavailable ({e}), reading plain lines");
                Box::new(PlainReader::stdio())
            }
        }
    };

    match sh.repl(reader.as_mut(), &mut io::stdout()) {
        Ok(()) => exit(0),
        Err(e) => {
            eprintln!("{e:#}");
            exit(1);
        }
    }
}
