//! Command-line front end for the stack machine.
//!
//! # Usage
//! ```text
//! stackemu [OPTIONS] build <source> [-o <output>]
//! stackemu [OPTIONS] run <image> [--prompt <text>]
//! ```
//!
//! `build` assembles a source file into a program image (by default next to
//! the source, with `.emu` appended). `run` loads an image and executes it,
//! reading `IN` values from stdin and writing `OUT` values to stdout.

use stackemu::config::{Command, Config};
use stackemu::virtual_machine::assembler::build_file;
use stackemu::virtual_machine::console::StreamConsole;
use stackemu::virtual_machine::errors::{ErrorKind, VMError};
use stackemu::virtual_machine::program::Program;
use stackemu::virtual_machine::vm::VM;
use stackemu::{debug, error};
use std::path::Path;
use std::process;

fn main() {
    let config = match Config::from_env_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}\n");
            print_usage();
            process::exit(1);
        }
    };
    config.apply_logging();

    match &config.command {
        Command::Help => print_usage(),
        Command::Build { input, output } => {
            if let Err(e) = build_file(input, output.as_deref()) {
                // assembly failures were already reported with their source line
                if e.kind() == ErrorKind::Io {
                    error!("{e}");
                }
                process::exit(1);
            }
        }
        Command::Run { image } => {
            if let Err(e) = run_image(image, config.prompt.clone()) {
                error!("{}: {e}", image.display());
                process::exit(1);
            }
        }
    }
}

/// Loads the image at `path` and runs it on the process console.
fn run_image(path: &Path, prompt: Option<String>) -> Result<(), VMError> {
    let program = Program::load_file(path)?;
    debug!(
        "loaded {} ({} lines, entry at line {})",
        path.display(),
        program.len(),
        program.entry() + 1
    );

    let mut vm = VM::new(program);
    let mut console = StreamConsole::stdio().with_prompt(prompt);
    vm.run(&mut console)
}

const USAGE: &str = "\
Stack machine assembler and VM

USAGE:
    {program} [OPTIONS] build <source> [-o <output>]
    {program} [OPTIONS] run <image> [--prompt <text>]

COMMANDS:
    build    Assemble <source> into a program image
    run      Execute a program image

OPTIONS:
    -o, --output <path>    Image path for build (default: <source>.emu)
    --prompt <text>        Text written before each IN
    -v, --verbose          Log every executed instruction
    -q, --quiet            Only log errors
    --no-timestamp         Omit timestamps from log lines
    -h, --help             Print this help message

ENVIRONMENT:
    STACKEMU_LOG       Default log level (debug, info, warn, error)
    STACKEMU_PROMPT    Default prompt for IN

EXAMPLES:
    {program} build demos/factorial_loop.asm
    echo 10 | {program} run demos/factorial_loop.asm.emu
";

/// Prints usage information to stderr.
fn print_usage() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "stackemu".to_string());
    eprintln!("{}", USAGE.replace("{program}", &program));
}
