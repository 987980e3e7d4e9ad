use crate::types::encoding::DecodeError;
use stackemu_derive::Error;

/// Broad classification of a [`VMError`], independent of the stage it was raised in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed operand, unknown name, wrong arity or unresolved label.
    InvalidArgument,
    /// Duplicate BEGIN, END or label definition.
    Uniqueness,
    /// Pop or return against an empty stack.
    EmptyAccess,
    /// Division by zero.
    Arithmetic,
    /// File or console I/O failure.
    Io,
    /// Malformed program image.
    Decode,
}

/// Errors that can occur during assembly, loading or execution.
#[derive(Debug, Error)]
pub enum VMError {
    /// Operand is not a decimal integer in range.
    #[error("invalid integer \"{token}\"")]
    InvalidInteger { token: String },
    /// Operand is not one of the available register names.
    #[error("incorrect register name \"{token}\"")]
    InvalidRegister { token: String },
    /// Operand is not a valid label name.
    #[error("incorrect label name \"{token}\"")]
    InvalidLabel { token: String },
    /// Parameterless instruction was given an operand.
    #[error("{mnemonic} command does not take any arguments, got \"{token}\"")]
    UnexpectedOperand {
        mnemonic: &'static str,
        token: String,
    },
    /// Instruction requires an operand but none was given.
    #[error("{mnemonic} command requires an argument")]
    MissingOperand { mnemonic: &'static str },
    /// More than one operand on a source line.
    #[error("too many arguments: unexpected \"{token}\"")]
    TooManyArguments { token: String },
    /// Unrecognized mnemonic during assembly.
    #[error("unknown command \"{name}\"")]
    UnknownCommand { name: String },
    /// Jump to a label that no LABEL instruction defines.
    #[error("can not find label \"{label}\" to jump")]
    UnresolvedLabel { label: String },
    /// Second BEGIN in one program.
    #[error("BEGIN command must appear only once (first on line {first})")]
    DuplicateBegin { first: usize },
    /// Second END in one program.
    #[error("END command must appear only once (first on line {first})")]
    DuplicateEnd { first: usize },
    /// Label defined more than once.
    #[error("label \"{label}\" is already defined on line {first}")]
    DuplicateLabel { label: String, first: usize },
    /// Program has no entry point.
    #[error("program has no BEGIN command")]
    MissingBegin,
    /// Pop or peek on an empty operand stack.
    #[error("operand stack is empty")]
    EmptyStack,
    /// RET executed with an empty call stack.
    #[error("return without call")]
    ReturnWithoutCall,
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Console input ended before an integer could be read.
    #[error("input exhausted while reading an integer")]
    InputExhausted,
    /// Console stream failed.
    #[error("console error: {reason}")]
    ConsoleError { reason: String },
    /// File could not be read, created or written.
    #[error("io error on {path}: {reason}")]
    IoError { path: String, reason: String },
    /// Unknown opcode byte in a program image.
    #[error("invalid opcode {opcode:#04x} at offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },
    /// Program image could not be decoded.
    #[error("decoding error at offset {offset}: {reason}")]
    DecodeError { offset: usize, reason: DecodeError },
    /// Configure-time failure with 1-based source line.
    #[error("line {line}: {source}")]
    AssemblyError { line: usize, source: Box<VMError> },
    /// Execution failure with 1-based program line.
    #[error("line {line}: {source}")]
    RuntimeError { line: usize, source: Box<VMError> },
}

impl VMError {
    /// Tags a configure-time error with its 1-based line.
    ///
    /// Errors that already carry a line are returned unchanged.
    pub fn at_line(self, line: usize) -> VMError {
        if self.line().is_some() {
            return self;
        }
        VMError::AssemblyError {
            line,
            source: Box::new(self),
        }
    }

    /// Tags an execution error with its 1-based line.
    pub fn at_runtime_line(self, line: usize) -> VMError {
        if self.line().is_some() {
            return self;
        }
        VMError::RuntimeError {
            line,
            source: Box::new(self),
        }
    }

    /// Returns the line this error was tagged with, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            VMError::AssemblyError { line, .. } | VMError::RuntimeError { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns the underlying error, looking through line tags.
    pub fn root(&self) -> &VMError {
        match self {
            VMError::AssemblyError { source, .. } | VMError::RuntimeError { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    /// Classifies the underlying error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VMError::AssemblyError { source, .. } | VMError::RuntimeError { source, .. } => {
                source.kind()
            }
            VMError::InvalidInteger { .. }
            | VMError::InvalidRegister { .. }
            | VMError::InvalidLabel { .. }
            | VMError::UnexpectedOperand { .. }
            | VMError::MissingOperand { .. }
            | VMError::TooManyArguments { .. }
            | VMError::UnknownCommand { .. }
            | VMError::UnresolvedLabel { .. } => ErrorKind::InvalidArgument,
            VMError::DuplicateBegin { .. }
            | VMError::DuplicateEnd { .. }
            | VMError::DuplicateLabel { .. }
            | VMError::MissingBegin => ErrorKind::Uniqueness,
            VMError::EmptyStack | VMError::ReturnWithoutCall => ErrorKind::EmptyAccess,
            VMError::DivisionByZero => ErrorKind::Arithmetic,
            VMError::InputExhausted | VMError::ConsoleError { .. } | VMError::IoError { .. } => {
                ErrorKind::Io
            }
            VMError::InvalidOpcode { .. } | VMError::DecodeError { .. } => ErrorKind::Decode,
        }
    }
}
