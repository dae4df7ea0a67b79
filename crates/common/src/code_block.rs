//! Code blocks: named, ordered instruction sequences.
//!
//! A bytecode image (`.gmb`) is the magic `GMBC`, a `u32` block count,
//! then each block as: name (`u32` length + UTF-8), `i32` id, `u32`
//! instruction count, instructions.

use crate::codec::{self, Reader};
use crate::error::DecodeError;
use crate::instruction::Instruction;

/// Leading bytes of every bytecode image.
pub const MAGIC: [u8; 4] = *b"GMBC";

/// A named sequence of instructions, loaded once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Name the host invokes the block by.
    pub name: String,
    /// Numeric identifier assigned by the extractor, `-1` if unassigned.
    pub id: i32,
    /// The instruction stream. Jump targets index into this vector.
    pub instructions: Vec<Instruction>,
}

impl CodeBlock {
    /// Create a block with no id.
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            id: -1,
            instructions,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// Number of instructions in the block.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the block has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        codec::write_str(out, &self.name);
        codec::write_i32(out, self.id);
        codec::write_u32(out, self.instructions.len() as u32);
        for instr in &self.instructions {
            instr.write_to(out);
        }
    }

    fn read_from(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let name = reader.read_str()?;
        let id = reader.read_i32()?;
        let count = reader.read_u32()? as usize;

        // Every instruction takes at least 11 bytes; cap the reservation so a
        // corrupt count cannot request an absurd allocation.
        let mut instructions = Vec::with_capacity(count.min(reader.remaining() / 11));
        for _ in 0..count {
            instructions.push(Instruction::read_from(reader)?);
        }

        Ok(Self {
            name,
            id,
            instructions,
        })
    }
}

/// Encode a set of blocks into a bytecode image.
pub fn encode_blocks(blocks: &[CodeBlock]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    codec::write_u32(&mut out, blocks.len() as u32);
    for block in blocks {
        block.write_to(&mut out);
    }
    out
}

/// Decode a bytecode image into its blocks, in image order.
pub fn decode_blocks(bytes: &[u8]) -> Result<Vec<CodeBlock>, DecodeError> {
    if !bytes.starts_with(&MAGIC) {
        return Err(DecodeError::BadMagic);
    }

    let mut reader = Reader::new(&bytes[MAGIC.len()..]);
    let count = reader.read_u32()? as usize;
    let mut blocks = Vec::with_capacity(count.min(reader.remaining() / 12));
    for _ in 0..count {
        blocks.push(CodeBlock::read_from(&mut reader)?);
    }
    reader.finish()?;

    Ok(blocks)
}
