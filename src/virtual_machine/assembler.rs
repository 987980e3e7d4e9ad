//! Assembly language parser and image builder.
//!
//! Converts source text into a configured [`Program`] and writes its binary
//! image. Building runs four phases and stops at the first failure:
//! tokenize, resolve mnemonics, configure, encode.
//!
//! # Syntax
//!
//! ```text
//! MNEMONIC [operand]   # optional comment
//! name:                ; label definition
//! ```
//!
//! - One instruction per line; blank lines are kept as `BLANK`
//! - Mnemonics are case-insensitive, operands are not
//! - Comments start with `#` or `;` and run to the end of the line
//! - `name:` is shorthand for `LABEL name`

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::program::{Program, RawInstruction, RawProgram};
use crate::{error, info, warn};
use std::fmt::Write;
use std::fs;
use std::iter::Enumerate;
use std::path::{Path, PathBuf};

const COMMENT_MARKERS: [char; 2] = ['#', ';'];
const LABEL_SUFFIX: char = ':';
/// Extension appended to the source path when no output path is given.
pub const IMAGE_EXTENSION: &str = "emu";

/// Formats a compiler-style diagnostic for assembly failures.
fn render_assembly_diagnostic(file: &str, source: &str, line: usize, message: &str) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> {file}:{line}");

    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let line_text = raw_line.trim_end_matches('\r');
        let _ = writeln!(diag, "  |");
        let _ = writeln!(diag, "{:>4} | {}", line, line_text);
        let _ = writeln!(diag, "  |");
    }

    diag
}

/// Emit a diagnostic for a failed build.
fn log_assembly_error(file: &str, source: &str, err: &VMError) {
    match err {
        VMError::AssemblyError { line, source: cause } => {
            error!(
                "{}",
                render_assembly_diagnostic(file, source, *line, &cause.to_string())
            );
        }
        other => error!("{file}: {other}"),
    }
}

/// One tokenized source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Upper-cased mnemonic.
    pub mnemonic: String,
    /// Operand text, empty when absent.
    pub operand: String,
}

impl SourceLine {
    fn new(mnemonic: impl Into<String>, operand: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            operand: operand.into(),
        }
    }

    fn blank() -> Self {
        Self::new(Opcode::Blank.mnemonic(), "")
    }

    /// Looks up the mnemonic in the opcode table.
    pub fn resolve(self) -> Result<RawInstruction, VMError> {
        let opcode = Opcode::from_mnemonic(&self.mnemonic).ok_or(VMError::UnknownCommand {
            name: self.mnemonic,
        })?;
        Ok(RawInstruction::new(opcode, self.operand))
    }
}

/// Drops everything from the first comment marker on.
fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKERS) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn too_many_arguments(extra: &str) -> VMError {
    VMError::TooManyArguments {
        token: extra.to_string(),
    }
}

/// Tokenize a single line of assembly.
///
/// Errors are untagged; [`tokenize`] attaches the line.
pub fn parse_line(line: &str) -> Result<SourceLine, VMError> {
    let mut tokens = strip_comment(line).split_whitespace();

    let Some(first) = tokens.next() else {
        return Ok(SourceLine::blank());
    };

    if let Some(name) = first.strip_suffix(LABEL_SUFFIX) {
        if let Some(extra) = tokens.next() {
            return Err(too_many_arguments(extra));
        }
        return Ok(SourceLine::new(Opcode::Label.mnemonic(), name));
    }

    let operand = tokens.next().unwrap_or_default();
    if let Some(extra) = tokens.next() {
        return Err(too_many_arguments(extra));
    }

    Ok(SourceLine::new(first.to_ascii_uppercase(), operand))
}

/// Lazy per-line tokenizer over a source string.
///
/// Yields exactly one item per input line. Cloning restarts from the clone
/// point without re-reading anything already consumed.
#[derive(Clone, Debug)]
pub struct Lines<'a> {
    inner: Enumerate<std::str::Lines<'a>>,
}

impl Iterator for Lines<'_> {
    type Item = Result<SourceLine, VMError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, line) = self.inner.next()?;
        Some(parse_line(line).map_err(|e| e.at_line(idx + 1)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Tokenizes `source`, one result per line.
pub fn tokenize(source: &str) -> Lines<'_> {
    Lines {
        inner: source.lines().enumerate(),
    }
}

/// Tokenizes and resolves mnemonics without configuring operands.
pub fn parse_source(source: &str) -> Result<RawProgram, VMError> {
    tokenize(source)
        .enumerate()
        .map(|(idx, line)| line.and_then(|l| l.resolve().map_err(|e| e.at_line(idx + 1))))
        .collect()
}

/// Assemble a full source string into a configured program.
pub fn assemble_source(source: &str) -> Result<Program, VMError> {
    Program::configure(parse_source(source)?)
}

/// Assembles source with an associated filename for diagnostics.
///
/// Failures are logged as a compiler-style diagnostic. Suspicious but valid
/// programs produce warnings.
fn assemble_source_with_name(source: &str, source_name: &str) -> Result<Program, VMError> {
    let program = assemble_source(source).inspect_err(|err| {
        log_assembly_error(source_name, source, err);
    })?;

    if program.end().is_none() {
        warn!("{source_name}: program has no END command");
    }
    for label in program.symbols().unresolved_labels() {
        warn!("{source_name}: label \"{label}\" is used but never defined");
    }

    Ok(program)
}

/// Convenience: assemble directly from file path
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Program, VMError> {
    let path_ref = path.as_ref();
    let name = path_ref.display().to_string();
    let source = fs::read_to_string(path_ref).map_err(|e| VMError::IoError {
        path: name.clone(),
        reason: e.to_string(),
    })?;
    assemble_source_with_name(&source, &name)
}

/// Returns `input` with [`IMAGE_EXTENSION`] appended.
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_os_string();
    path.push(".");
    path.push(IMAGE_EXTENSION);
    PathBuf::from(path)
}

/// Assembles `input` and writes its image, returning the output path.
///
/// Nothing is written unless assembly succeeds, and a failed write removes
/// whatever part of the file was created.
pub fn build_file(input: &Path, output: Option<&Path>) -> Result<PathBuf, VMError> {
    let program = assemble_file(input)?;
    let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
    let bytes = program.to_bytes();

    if let Err(e) = fs::write(&output, &bytes) {
        let _ = fs::remove_file(&output);
        return Err(VMError::IoError {
            path: output.display().to_string(),
            reason: e.to_string(),
        });
    }

    info!(
        "assembled {} ({} lines, {} bytes) into {}",
        input.display(),
        program.len(),
        bytes.len(),
        output.display()
    );
    Ok(output)
}
