//! Verification errors for GML code blocks.

use thiserror::Error;

/// A static finding. Instruction-level variants carry the owning block's
/// name and the instruction index (`at`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Block holds more instructions than the limit.
    #[error("block `{block}` has {len} instructions (limit {max})")]
    BlockTooLarge {
        block: String,
        len: usize,
        max: usize,
    },

    /// Block at position `index` in the image has an empty name.
    #[error("block {index} has an empty name")]
    EmptyBlockName { index: usize },

    /// Two blocks share a name; the later one would replace the earlier.
    #[error("duplicate block name `{name}` (blocks {first} and {second})")]
    DuplicateBlockName {
        name: String,
        first: usize,
        second: usize,
    },

    /// A jump target does not index into the block.
    #[error("jump target {target} out of range (block `{block}` has {len} instructions) at instruction {at}")]
    JumpOutOfRange {
        block: String,
        at: usize,
        target: u32,
        len: usize,
    },

    /// A branch instruction without a target.
    #[error("{opcode} without jump target in `{block}` at instruction {at}")]
    MissingJumpTarget {
        block: String,
        at: usize,
        opcode: &'static str,
    },

    /// An instruction that needs a name operand has none.
    #[error("{opcode} without name operand in `{block}` at instruction {at}")]
    MissingName {
        block: String,
        at: usize,
        opcode: &'static str,
    },

    /// An opcode the executor does not implement.
    #[error("unsupported opcode {opcode} in `{block}` at instruction {at}")]
    UnsupportedOpcode {
        block: String,
        at: usize,
        opcode: &'static str,
    },

    /// CONV names something other than a value kind.
    #[error("unknown conversion kind `{kind}` in `{block}` at instruction {at}")]
    UnknownConversion {
        block: String,
        at: usize,
        kind: String,
    },

    /// CALL/CALLV argument count is not a small non-negative integer.
    #[error("invalid argument count {count} in `{block}` at instruction {at}")]
    InvalidArgumentCount {
        block: String,
        at: usize,
        count: String,
    },
}
