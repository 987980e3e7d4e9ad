//! Stack machine assembler and virtual machine.
//!
//! Source text is assembled into a compact binary image; the VM loads an
//! image, rebinds its operands and executes it.
//!
//! # Architecture
//!
//! - **Operand stack**: unbounded stack of `i64` values
//! - **Call stack**: return lines pushed by `CALL` and popped by `RET`
//! - **Registers**: five named cells (`ax` .. `ex`), created on first use
//! - **Program counter**: a line index; every source line is one instruction
//!
//! # Pipeline
//!
//! ```text
//! source --tokenize--> SourceLine --resolve--> RawInstruction --bind--> Instruction
//!                                                   |  ^
//!                                              encode  decode
//!                                                   v  |
//!                                               program image
//! ```
//!
//! # Modules
//!
//! - [`assembler`]: Tokenizer, diagnostics and image building
//! - [`console`]: Console trait for `IN`/`OUT`
//! - [`errors`]: Assembly and execution error types
//! - [`instruction`]: Bound instructions and the configure step
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`operand`]: Operand shapes and parsing
//! - [`program`]: Raw and configured programs, image format
//! - [`stack`]: Operand stack
//! - [`symbols`]: Register and label tables
//! - [`vm`]: Execution loop

pub mod assembler;
pub mod console;
pub mod errors;
pub mod instruction;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod stack;
pub mod symbols;
pub mod vm;
