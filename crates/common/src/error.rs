//! Decode errors for GML bytecode.

use thiserror::Error;

/// Errors that occur while decoding a binary bytecode image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The image does not start with the `GMBC` magic.
    #[error("missing GMBC header")]
    BadMagic,

    /// Opcode byte outside the instruction set. Only the strict
    /// `TryFrom<u8>` conversion reports this; image decoding maps such
    /// bytes to `Opcode::Invalid`.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// Operand kind tag outside the value kinds.
    #[error("unknown value kind: {0:#04x}")]
    UnknownValueKind(u8),

    /// The image ended in the middle of a field.
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// Bytes remain after the last declared block.
    #[error("{count} trailing byte(s) after last block")]
    TrailingBytes { count: usize },
}
