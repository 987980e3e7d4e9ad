//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and invokes a callback macro for code
//! generation, so the opcode byte, mnemonic and operand shape of every
//! instruction are written down exactly once.
//!
//! This module generates:
//! - The [`Opcode`] enum with its image byte values
//! - `TryFrom<u8>` for decoding opcodes
//! - Mnemonic lookup in both directions
//!
//! See [`instruction`](super::instruction) for operand binding and
//! [`vm`](super::vm) for execution.
//!
//! # Image record format
//!
//! - Opcode: 1 byte
//! - Operand: source text of the operand, NUL-terminated (empty for
//!   parameterless instructions)

use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink};
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::operand::OperandKind;

/// Invokes a callback macro with the complete instruction definition list.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Program structure
            // =========================
            /// BEGIN ; entry point, must appear exactly once
            Begin = 0x00, "BEGIN" => None,
            /// END ; stops execution, may appear at most once
            End = 0x01, "END" => None,
            // =========================
            // Stack and registers
            // =========================
            /// PUSH n ; push integer literal n
            Push = 0x02, "PUSH" => Integer,
            /// POP ; discard the top value
            Pop = 0x03, "POP" => None,
            /// PUSHR r ; push the value of register r
            PushR = 0x04, "PUSHR" => Register,
            /// POPR r ; pop the top value into register r
            PopR = 0x05, "POPR" => Register,
            // =========================
            // Integer arithmetic
            // =========================
            /// ADD ; pop a, pop b, push b + a
            Add = 0x10, "ADD" => None,
            /// SUB ; pop a, pop b, push b - a
            Sub = 0x11, "SUB" => None,
            /// MUL ; pop a, pop b, push a * b
            Mul = 0x12, "MUL" => None,
            /// DIV ; pop a, pop b, push b / a (trap on division by zero)
            Div = 0x13, "DIV" => None,
            // =========================
            // Console
            // =========================
            /// IN ; read an integer and push it
            In = 0x20, "IN" => None,
            /// OUT ; pop the top value and print it
            Out = 0x21, "OUT" => None,
            // =========================
            // Control flow
            // =========================
            /// LABEL name ; bind name to this line
            Label = 0x30, "LABEL" => Label,
            /// JMP label ; unconditional jump
            Jmp = 0x31, "JMP" => Label,
            /// JEQ label ; jump if top == second
            Jeq = 0x32, "JEQ" => Label,
            /// JNE label ; jump if top != second
            Jne = 0x33, "JNE" => Label,
            /// JA label ; jump if top > second
            Ja = 0x34, "JA" => Label,
            /// JAE label ; jump if top >= second
            Jae = 0x35, "JAE" => Label,
            /// JB label ; jump if top < second
            Jb = 0x36, "JB" => Label,
            /// JBE label ; jump if top <= second
            Jbe = 0x37, "JBE" => Label,
            /// CALL label ; push this line onto the call stack and jump
            Call = 0x38, "CALL" => Label,
            /// RET ; resume after the most recent CALL
            Ret = 0x39, "RET" => None,
            /// BLANK ; empty or comment-only source line
            Blank = 0x3F, "BLANK" => None,
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => $kind:ident
        ),* $(,)?
    ) => {
        /// Instruction kind, stored as the first byte of every image record.
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = VMError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(VMError::InvalidOpcode {
                        opcode: value,
                        offset: 0,
                    }),
                }
            }
        }

        impl Opcode {
            /// Every opcode, in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the operand shape this opcode binds.
            pub const fn operand_kind(&self) -> OperandKind {
                match self {
                    $( Opcode::$name => OperandKind::$kind, )*
                }
            }

            /// Looks up an upper-case mnemonic.
            pub fn from_mnemonic(name: &str) -> Option<Opcode> {
                match name {
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Encode for Opcode {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        (*self as u8).encode(out);
    }
}

impl Decode for Opcode {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let byte = u8::decode(input)?;
        Opcode::try_from(byte).map_err(|_| DecodeError::UnknownOpcode(byte))
    }
}
