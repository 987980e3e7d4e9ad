//! Stack machine toolchain library.
//!
//! Provides an assembler from mnemonic source to a compact binary image and a
//! virtual machine that executes those images.

pub mod config;
pub mod types;
pub mod utils;
pub mod virtual_machine;
