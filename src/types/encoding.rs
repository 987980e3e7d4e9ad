//! Binary encoding and decoding traits for the program image.
//!
//! The image format is deliberately simple: single bytes and NUL-terminated
//! text, with no length prefixes and no header.
//!
//! # Binary Format
//!
//! - `u8`: one byte
//! - [`NulString`]: UTF-8 bytes followed by a single `0x00` terminator
//! - structs deriving `BinaryCodec`: fields in declaration order
//!
//! # Example
//!
//! ```ignore
//! use crate::types::encoding::{Decode, Encode, NulString};
//!
//! let text = NulString::from("loop");
//! let bytes = text.to_bytes();
//! assert_eq!(bytes, b"loop\0");
//! assert_eq!(NulString::from_bytes(&bytes).unwrap(), text);
//! ```

use stackemu_derive::Error;
use std::fmt;
use std::ops::Deref;

/// Terminator written after every [`NulString`].
pub const NUL: u8 = 0x00;

/// Sink for writing encoded bytes.
pub trait EncodeSink {
    /// Writes the given bytes to the sink.
    fn write(&mut self, bytes: &[u8]);
}

/// Counter for computing encoded size without allocating memory.
///
/// Used by `Encode::to_bytes` to pre-allocate exact capacity before encoding.
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self { len: 0 }
    }

    /// Returns the total number of bytes counted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been counted yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SizeCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeSink for SizeCounter {
    fn write(&mut self, bytes: &[u8]) {
        self.len += bytes.len();
    }
}

impl EncodeSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Trait for types that can be serialized to binary format.
pub trait Encode {
    /// Writes the binary representation to the given sink.
    fn encode<S: EncodeSink>(&self, out: &mut S);

    /// Serializes to a new byte buffer with exact capacity.
    ///
    /// Performs two passes: first to count bytes, then to encode.
    fn to_bytes(&self) -> Vec<u8> {
        let mut counter = SizeCounter::new();
        self.encode(&mut counter);

        let mut out = Vec::with_capacity(counter.len());
        self.encode(&mut out);
        out
    }
}

/// Errors that can occur during decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before expected data was read.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// Byte does not name a known opcode.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    /// Text is not valid UTF-8.
    #[error("operand text is not valid utf-8")]
    InvalidUtf8,
    /// Input has bytes left after a complete value.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Trait for types that can be deserialized from binary format.
pub trait Decode: Sized {
    /// Reads and decodes a value from the input buffer.
    ///
    /// Advances the input slice past the consumed bytes.
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError>;

    /// Decodes a value from a byte slice, requiring all bytes to be consumed.
    fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let mut input = data;
        let value = Self::decode(&mut input)?;

        if !input.is_empty() {
            return Err(DecodeError::TrailingBytes(input.len()));
        }

        Ok(value)
    }
}

/// Reads exactly `n` bytes from the input, advancing the slice.
fn read_bytes<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if input.len() < n {
        return Err(DecodeError::UnexpectedEof);
    }
    let (bytes, rest) = input.split_at(n);
    *input = rest;
    Ok(bytes)
}

impl Encode for u8 {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&[*self]);
    }
}

impl Decode for u8 {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = read_bytes(input, 1)?;
        Ok(bytes[0])
    }
}

/// Owned text that is encoded with a trailing NUL instead of a length prefix.
///
/// The text itself must not contain `0x00`; operands that pass binding never
/// do, since registers, labels and integer literals are all printable ASCII.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NulString(String);

impl NulString {
    /// Returns the text without the terminator.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NulString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NulString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Deref for NulString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NulString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for NulString {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(self.0.as_bytes());
        out.write(&[NUL]);
    }
}

impl Decode for NulString {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let end = input
            .iter()
            .position(|&b| b == NUL)
            .ok_or(DecodeError::UnexpectedEof)?;
        let text = read_bytes(input, end)?;
        read_bytes(input, 1)?;
        let text = std::str::from_utf8(text).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(Self(text.to_string()))
    }
}
