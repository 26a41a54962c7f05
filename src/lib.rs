//! An interactive command interpreter for pipelines of external programs.
//!
//! A line such as `cat notes.txt | grep todo | wc -l` is split on `|` into
//! stages and on whitespace into arguments. Every stage is started as a child
//! process, consecutive stages are connected with anonymous pipes, and the
//! interpreter waits for each stage in order. The last stage's output is
//! buffered and written out once the whole pipeline has finished. A single
//! command shares the interpreter's terminal directly.
//!
//! Interrupts delivered to the interpreter never terminate it; the router
//! installed by [`install_router`] forwards them to the tracked foreground
//! child instead.
//!
//! The main entry point is [`Interpreter`]. The modules [`command`] and [`env`]
//! expose the data model and the launch environment.

mod builtin;
pub mod command;
pub mod env;
mod executor;
mod external;
mod interpreter;
mod io_adapters;
mod parser;
mod reader;
mod signal;
mod wiring;

pub use executor::{
    ExecError, PipelineExecutor, RunReport, StageError, StageHandle, StageReport, StageStatus,
};
pub use external::LaunchError;
pub use interpreter::{DEFAULT_PROMPT, Interpreter, LineOutcome};
pub use parser::parse_line;
pub use reader::{LineReader, PlainReader, ReadLine};
pub use signal::{ForegroundSlot, install_router};
