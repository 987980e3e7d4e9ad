//! Program representation and the binary image format.
//!
//! A [`RawProgram`] is the unbound form shared by the assembler and the
//! image: one [`RawInstruction`] per source line. A [`Program`] is the bound
//! form the VM executes, built by configuring every raw instruction against a
//! fresh [`SymbolTable`].
//!
//! Symbols are not stored in the image. Loading re-runs configuration on the
//! decoded operand text, which rebuilds registers and label targets exactly as
//! the assembler saw them.

use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink, NulString};
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::instruction::Instruction;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::symbols::SymbolTable;
use stackemu_derive::BinaryCodec;
use std::fs;
use std::path::Path;

/// Opcode plus unparsed operand text.
///
/// Encoded as the opcode byte followed by the NUL-terminated operand.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct RawInstruction {
    pub opcode: Opcode,
    pub operand: NulString,
}

impl RawInstruction {
    pub fn new(opcode: Opcode, operand: impl Into<NulString>) -> Self {
        Self {
            opcode,
            operand: operand.into(),
        }
    }
}

/// Ordered raw instructions; index is the 0-based line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawProgram {
    pub instructions: Vec<RawInstruction>,
}

impl RawProgram {
    pub fn new(instructions: Vec<RawInstruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Decodes an image, reading records until the input is exhausted.
    ///
    /// Errors carry the byte offset of the record that failed.
    pub fn from_bytes(data: &[u8]) -> Result<Self, VMError> {
        let mut input = data;
        let mut instructions = Vec::new();

        while !input.is_empty() {
            let offset = data.len() - input.len();
            let instr = RawInstruction::decode(&mut input).map_err(|e| match e {
                DecodeError::UnknownOpcode(opcode) => VMError::InvalidOpcode { opcode, offset },
                reason => VMError::DecodeError { offset, reason },
            })?;
            instructions.push(instr);
        }

        Ok(Self { instructions })
    }
}

impl Encode for RawProgram {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        for instr in &self.instructions {
            instr.encode(out);
        }
    }
}

impl FromIterator<RawInstruction> for RawProgram {
    fn from_iter<I: IntoIterator<Item = RawInstruction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A configured program ready for execution.
#[derive(Clone, Debug)]
pub struct Program {
    instructions: Vec<Instruction>,
    raw: RawProgram,
    symbols: SymbolTable,
    entry: usize,
}

impl Program {
    /// Binds every raw instruction in order against a fresh symbol table.
    ///
    /// The first failure aborts configuration and is tagged with its 1-based
    /// line. A program without `BEGIN` is rejected.
    pub fn configure(raw: RawProgram) -> Result<Self, VMError> {
        let mut symbols = SymbolTable::new();
        let instructions = raw
            .instructions
            .iter()
            .enumerate()
            .map(|(line, ri)| {
                Instruction::bind(ri.opcode, ri.operand.as_str(), line, &mut symbols)
                    .map_err(|e| e.at_line(line + 1))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entry = symbols.begin().ok_or(VMError::MissingBegin)?;

        Ok(Self {
            instructions,
            raw,
            symbols,
            entry,
        })
    }

    /// Decodes and configures a program image.
    pub fn load(bytes: &[u8]) -> Result<Self, VMError> {
        Self::configure(RawProgram::from_bytes(bytes)?)
    }

    /// Reads, decodes and configures the image at `path`.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, VMError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| VMError::IoError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::load(&bytes)
    }

    /// Encodes the program image.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw.to_bytes()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the instruction on 0-based `line`.
    pub fn get(&self, line: usize) -> Option<Instruction> {
        self.instructions.get(line).copied()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn raw(&self) -> &RawProgram {
        &self.raw
    }

    /// Line of `BEGIN`.
    pub fn entry(&self) -> usize {
        self.entry
    }

    /// Line of `END`, if the program has one.
    pub fn end(&self) -> Option<usize> {
        self.symbols.end()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::errors::ErrorKind;

    fn raw(records: &[(Opcode, &str)]) -> RawProgram {
        records
            .iter()
            .map(|(op, text)| RawInstruction::new(*op, *text))
            .collect()
    }

    #[test]
    fn image_layout() {
        let program = raw(&[
            (Opcode::Begin, ""),
            (Opcode::Push, "7"),
            (Opcode::Jmp, "top"),
        ]);
        assert_eq!(
            program.to_bytes(),
            vec![0x00, 0x00, 0x02, b'7', 0x00, 0x31, b't', b'o', b'p', 0x00]
        );
    }

    #[test]
    fn decode_image() {
        let bytes = [0x00, 0x00, 0x04, b'a', b'x', 0x00, 0x3F, 0x00];
        let program = RawProgram::from_bytes(&bytes).unwrap();
        assert_eq!(
            program,
            raw(&[(Opcode::Begin, ""), (Opcode::PushR, "ax"), (Opcode::Blank, "")])
        );
        assert!(RawProgram::from_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn decode_unknown_opcode_reports_offset() {
        let bytes = [0x00, 0x00, 0x0A, 0x00];
        let err = RawProgram::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            VMError::InvalidOpcode {
                opcode: 0x0A,
                offset: 2
            }
        ));
    }

    #[test]
    fn decode_missing_terminator() {
        let bytes = [0x00, 0x00, 0x02, b'1', b'2'];
        let err = RawProgram::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            VMError::DecodeError {
                offset: 2,
                reason: DecodeError::UnexpectedEof
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn decode_invalid_utf8() {
        let bytes = [0x02, 0xFF, 0xFE, 0x00];
        assert!(matches!(
            RawProgram::from_bytes(&bytes),
            Err(VMError::DecodeError {
                offset: 0,
                reason: DecodeError::InvalidUtf8
            })
        ));
    }

    #[test]
    fn configure_records_entry() {
        let program = Program::configure(raw(&[
            (Opcode::Blank, ""),
            (Opcode::Begin, ""),
            (Opcode::End, ""),
        ]))
        .unwrap();
        assert_eq!(program.entry(), 1);
        assert_eq!(program.end(), Some(2));
        assert_eq!(program.len(), 3);
        assert_eq!(program.get(1), Some(Instruction::Begin));
        assert_eq!(program.get(3), None);
    }

    #[test]
    fn configure_requires_begin() {
        let err = Program::configure(raw(&[(Opcode::Push, "1"), (Opcode::End, "")])).unwrap_err();
        assert!(matches!(err, VMError::MissingBegin));
    }

    #[test]
    fn configure_tags_line() {
        let err = Program::configure(raw(&[
            (Opcode::Begin, ""),
            (Opcode::Push, "1"),
            (Opcode::Begin, ""),
        ]))
        .unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert!(matches!(err.root(), VMError::DuplicateBegin { first: 1 }));
    }

    #[test]
    fn load_matches_configure() {
        let source = raw(&[
            (Opcode::Begin, ""),
            (Opcode::Label, "again"),
            (Opcode::PushR, "bx"),
            (Opcode::Jmp, "again"),
            (Opcode::End, ""),
        ]);
        let configured = Program::configure(source.clone()).unwrap();
        let loaded = Program::load(&configured.to_bytes()).unwrap();
        assert_eq!(loaded.raw(), &source);
        assert_eq!(loaded.instructions(), configured.instructions());
    }
}
