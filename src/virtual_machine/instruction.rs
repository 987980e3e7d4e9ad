//! Bound instructions.
//!
//! [`Instruction::bind`] is the configure half of the two-phase contract: it
//! turns an opcode plus raw operand text into an executable value, resolving
//! registers and labels through a [`SymbolTable`] and performing the one-time
//! setup of `BEGIN`, `END` and `LABEL`. Execution lives in [`vm`](super::vm).

use crate::for_each_instruction;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::operand::{bind_integer, bind_label, bind_none, bind_register};
use crate::virtual_machine::symbols::{LabelId, RegisterId, SymbolTable};

/// An instruction with its operand bound.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Begin,
    End,
    Push(i64),
    Pop,
    PushR(RegisterId),
    PopR(RegisterId),
    Add,
    Sub,
    Mul,
    Div,
    In,
    Out,
    Label(LabelId),
    Jmp(LabelId),
    Jeq(LabelId),
    Jne(LabelId),
    Ja(LabelId),
    Jae(LabelId),
    Jb(LabelId),
    Jbe(LabelId),
    Call(LabelId),
    Ret,
    Blank,
}

macro_rules! define_binding {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => $kind:ident
        ),* $(,)?
    ) => {
        /// Parses `raw` into the operand shape of `opcode`.
        fn bind_operand(
            opcode: Opcode,
            raw: &str,
            symbols: &mut SymbolTable,
        ) -> Result<Instruction, VMError> {
            match opcode {
                $(
                    Opcode::$name => define_binding!(@bind $name, $mnemonic, $kind, raw, symbols),
                )*
            }
        }

        impl Instruction {
            /// Returns the opcode this instruction was bound from.
            pub fn opcode(&self) -> Opcode {
                match self {
                    $( define_binding!(@pat $name, $kind) => Opcode::$name, )*
                }
            }
        }
    };

    // ---------- operand binding ----------
    (@bind $name:ident, $mnemonic:literal, None, $raw:ident, $symbols:ident) => {{
        bind_none($mnemonic, $raw)?;
        Ok(Instruction::$name)
    }};
    (@bind $name:ident, $mnemonic:literal, Integer, $raw:ident, $symbols:ident) => {
        Ok(Instruction::$name(bind_integer($mnemonic, $raw)?))
    };
    (@bind $name:ident, $mnemonic:literal, Register, $raw:ident, $symbols:ident) => {
        Ok(Instruction::$name(bind_register($mnemonic, $raw, $symbols)?))
    };
    (@bind $name:ident, $mnemonic:literal, Label, $raw:ident, $symbols:ident) => {
        Ok(Instruction::$name(bind_label($mnemonic, $raw, $symbols)?))
    };

    // ---------- patterns ----------
    (@pat $name:ident, None) => { Instruction::$name };
    (@pat $name:ident, $kind:ident) => { Instruction::$name(..) };
}

for_each_instruction!(define_binding);

impl Instruction {
    /// Binds `raw` as the operand of `opcode` on the 0-based `line`.
    ///
    /// Errors are returned untagged; callers attach the line.
    pub fn bind(
        opcode: Opcode,
        raw: &str,
        line: usize,
        symbols: &mut SymbolTable,
    ) -> Result<Instruction, VMError> {
        let instr = bind_operand(opcode, raw, symbols)?;
        match instr {
            Instruction::Begin => symbols.mark_begin(line)?,
            Instruction::End => symbols.mark_end(line)?,
            Instruction::Label(id) => symbols.define_label(id, line)?,
            _ => {}
        }
        Ok(instr)
    }

    /// Returns the assembly mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        self.opcode().mnemonic()
    }

    /// Returns the label a control-flow instruction refers to.
    pub fn label(&self) -> Option<LabelId> {
        match *self {
            Instruction::Label(id)
            | Instruction::Jmp(id)
            | Instruction::Jeq(id)
            | Instruction::Jne(id)
            | Instruction::Ja(id)
            | Instruction::Jae(id)
            | Instruction::Jb(id)
            | Instruction::Jbe(id)
            | Instruction::Call(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(opcode: Opcode, raw: &str, line: usize, symbols: &mut SymbolTable) -> Instruction {
        Instruction::bind(opcode, raw, line, symbols).unwrap()
    }

    #[test]
    fn opcode_roundtrip() {
        let mut symbols = SymbolTable::new();
        for &op in Opcode::ALL {
            // fresh table per opcode so BEGIN, END and LABEL never collide
            symbols.reset();
            let raw = match op.operand_kind() {
                crate::virtual_machine::operand::OperandKind::None => "",
                crate::virtual_machine::operand::OperandKind::Integer => "-3",
                crate::virtual_machine::operand::OperandKind::Register => "dx",
                crate::virtual_machine::operand::OperandKind::Label => "here",
            };
            let instr = bind(op, raw, 0, &mut symbols);
            assert_eq!(instr.opcode(), op);
            assert_eq!(instr.mnemonic(), op.mnemonic());
        }
    }

    #[test]
    fn begin_and_end_record_lines() {
        let mut symbols = SymbolTable::new();
        bind(Opcode::Begin, "", 2, &mut symbols);
        bind(Opcode::End, "", 7, &mut symbols);
        assert_eq!(symbols.begin(), Some(2));
        assert_eq!(symbols.end(), Some(7));

        let err = Instruction::bind(Opcode::Begin, "", 9, &mut symbols).unwrap_err();
        assert!(matches!(err, VMError::DuplicateBegin { first: 3 }));
    }

    #[test]
    fn label_defines_target() {
        let mut symbols = SymbolTable::new();
        let jump = bind(Opcode::Jmp, "loop", 1, &mut symbols);
        let def = bind(Opcode::Label, "loop", 4, &mut symbols);
        assert_eq!(jump.label(), def.label());

        let id = def.label().unwrap();
        assert_eq!(symbols.jump_target(id).unwrap(), 4);

        let err = Instruction::bind(Opcode::Label, "loop", 6, &mut symbols).unwrap_err();
        assert!(matches!(err, VMError::DuplicateLabel { first: 5, .. }));
    }

    #[test]
    fn operands_are_validated() {
        let mut symbols = SymbolTable::new();
        assert_eq!(bind(Opcode::Push, "10", 0, &mut symbols), Instruction::Push(10));
        assert!(matches!(
            Instruction::bind(Opcode::Push, "ten", 0, &mut symbols),
            Err(VMError::InvalidInteger { .. })
        ));
        assert!(matches!(
            Instruction::bind(Opcode::PopR, "zx", 0, &mut symbols),
            Err(VMError::InvalidRegister { .. })
        ));
        assert!(matches!(
            Instruction::bind(Opcode::Call, "9lives", 0, &mut symbols),
            Err(VMError::InvalidLabel { .. })
        ));
        assert!(matches!(
            Instruction::bind(Opcode::Ret, "now", 0, &mut symbols),
            Err(VMError::UnexpectedOperand { mnemonic: "RET", .. })
        ));
        assert!(matches!(
            Instruction::bind(Opcode::Jne, "", 0, &mut symbols),
            Err(VMError::MissingOperand { mnemonic: "JNE" })
        ));
    }

    #[test]
    fn failed_bind_has_no_side_effects() {
        let mut symbols = SymbolTable::new();
        assert!(Instruction::bind(Opcode::Begin, "x", 0, &mut symbols).is_err());
        assert_eq!(symbols.begin(), None);
    }
}
