//! GML verifier: static checks for code blocks.
//!
//! The verifier checks a set of [`CodeBlock`]s before they are loaded into
//! the executor. It collects ALL findings (not just the first) and returns
//! them. Verification is advisory: the executor degrades gracefully on
//! unverified input, but verified input never hits a jump, name or
//! conversion fault.
//!
//! # Usage
//!
//! ```
//! use gml_common::{CodeBlock, Instruction, Opcode};
//! use gml_verifier::verify;
//!
//! let blocks = vec![CodeBlock::new(
//!     "main",
//!     vec![
//!         Instruction::new(Opcode::PushI).with_operand(42),
//!         Instruction::new(Opcode::Ret),
//!     ],
//! )];
//!
//! assert!(verify(&blocks).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Names**: block names are non-empty and unique
//! 2. **Limits**: block size, CALL argument counts
//! 3. **Structural**: jump targets, name operands, CONV kinds, unsupported opcodes

pub mod error;
pub mod limits;
pub mod structural;

pub use error::VerifyError;

use gml_common::CodeBlock;

/// Verify a set of code blocks.
///
/// Returns `Ok(())` if every block passes all checks, or
/// `Err(Vec<VerifyError>)` with all findings, in block order.
pub fn verify(blocks: &[CodeBlock]) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = structural::check_block_names(blocks);

    for block in blocks {
        all_errors.extend(verify_block(block));
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

/// Run the per-block passes on a single block.
pub fn verify_block(block: &CodeBlock) -> Vec<VerifyError> {
    let mut errors = limits::check_limits(block);
    errors.extend(structural::check_structural(block));
    errors
}
