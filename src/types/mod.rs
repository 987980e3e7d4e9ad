//! Core type definitions.
//!
//! - `encoding`: `Encode`/`Decode` traits and the NUL-terminated string used
//!   by the program image

pub mod encoding;
