//! Operand shapes and operand binding.
//!
//! Every opcode takes one of four operand shapes. Binding turns the raw
//! operand text into the shape's bound type, interning register and label
//! names in the [`SymbolTable`] on the way.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::symbols::{LabelId, RegisterId, SymbolTable};

/// Operand shape accepted by an opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand; the operand text must be empty.
    None,
    /// Decimal integer literal.
    Integer,
    /// Register name such as `ax`.
    Register,
    /// Label name such as `loop1`.
    Label,
}

/// Parse an i64 literal.
///
/// Only plain decimal with an optional sign is accepted; trailing text is an
/// error rather than being ignored.
pub(crate) fn parse_i64(tok: &str) -> Result<i64, VMError> {
    tok.parse::<i64>().map_err(|_| VMError::InvalidInteger {
        token: tok.to_string(),
    })
}

fn require<'a>(mnemonic: &'static str, raw: &'a str) -> Result<&'a str, VMError> {
    if raw.is_empty() {
        return Err(VMError::MissingOperand { mnemonic });
    }
    Ok(raw)
}

/// Checks that a parameterless instruction was given no operand.
pub(crate) fn bind_none(mnemonic: &'static str, raw: &str) -> Result<(), VMError> {
    if raw.is_empty() {
        Ok(())
    } else {
        Err(VMError::UnexpectedOperand {
            mnemonic,
            token: raw.to_string(),
        })
    }
}

pub(crate) fn bind_integer(mnemonic: &'static str, raw: &str) -> Result<i64, VMError> {
    parse_i64(require(mnemonic, raw)?)
}

pub(crate) fn bind_register(
    mnemonic: &'static str,
    raw: &str,
    symbols: &mut SymbolTable,
) -> Result<RegisterId, VMError> {
    symbols.register(require(mnemonic, raw)?)
}

pub(crate) fn bind_label(
    mnemonic: &'static str,
    raw: &str,
    symbols: &mut SymbolTable,
) -> Result<LabelId, VMError> {
    symbols.label(require(mnemonic, raw)?)
}
