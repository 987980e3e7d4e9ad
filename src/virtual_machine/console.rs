//! Console endpoints for `IN` and `OUT`.
//!
//! The VM talks to the outside world only through [`Console`], so tests can
//! script input and capture output without touching the process streams.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::operand::parse_i64;
use std::collections::VecDeque;
use std::io::{self, BufRead, Stdout, StdinLock, Write};

/// Integer I/O used by the VM.
pub trait Console {
    /// Reads the next integer.
    fn read_int(&mut self) -> Result<i64, VMError>;
    /// Writes one integer.
    fn write_int(&mut self, value: i64) -> Result<(), VMError>;
}

fn console_error(e: io::Error) -> VMError {
    VMError::ConsoleError {
        reason: e.to_string(),
    }
}

/// [`Console`] over a buffered reader and a writer.
///
/// Input is read as whitespace-separated tokens, so several integers may share
/// a line. Output is one value per line, flushed immediately.
pub struct StreamConsole<R, W> {
    reader: R,
    writer: W,
    pending: VecDeque<String>,
    prompt: Option<String>,
}

impl StreamConsole<StdinLock<'static>, Stdout> {
    /// Console bound to the process stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StreamConsole<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: VecDeque::new(),
            prompt: None,
        }
    }

    /// Writes `prompt` before every read.
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Returns the underlying reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn next_token(&mut self) -> Result<String, VMError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).map_err(console_error)?;
            if n == 0 {
                return Err(VMError::InputExhausted);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
    }
}

impl<R: BufRead, W: Write> Console for StreamConsole<R, W> {
    fn read_int(&mut self) -> Result<i64, VMError> {
        if let Some(prompt) = &self.prompt {
            self.writer
                .write_all(prompt.as_bytes())
                .and_then(|_| self.writer.flush())
                .map_err(console_error)?;
        }
        let token = self.next_token()?;
        parse_i64(&token)
    }

    fn write_int(&mut self, value: i64) -> Result<(), VMError> {
        writeln!(self.writer, "{value}")
            .and_then(|_| self.writer.flush())
            .map_err(console_error)
    }
}
