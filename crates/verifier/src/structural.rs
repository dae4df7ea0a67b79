//! Structural validation of code blocks.
//!
//! Checks jump targets, required name operands, CONV kinds and opcodes the
//! executor does not implement, per block; then block naming across the
//! whole image.

use std::collections::HashMap;

use crate::error::VerifyError;
use gml_common::{CodeBlock, Opcode, ValueKind};

/// Run the per-instruction structural checks on one block.
pub fn check_structural(block: &CodeBlock) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let len = block.len();
    let name = || block.name.clone();

    for (at, instr) in block.instructions.iter().enumerate() {
        let opcode = instr.opcode;

        if opcode.is_unsupported() {
            errors.push(VerifyError::UnsupportedOpcode {
                block: name(),
                at,
                opcode: opcode.mnemonic(),
            });
            continue;
        }

        if opcode.is_branch() {
            match instr.target {
                None => errors.push(VerifyError::MissingJumpTarget {
                    block: name(),
                    at,
                    opcode: opcode.mnemonic(),
                }),
                Some(target) if target as usize >= len => {
                    errors.push(VerifyError::JumpOutOfRange {
                        block: name(),
                        at,
                        target,
                        len,
                    })
                }
                Some(_) => {}
            }
        }

        if opcode.requires_name() {
            match instr.name.as_deref() {
                None => errors.push(VerifyError::MissingName {
                    block: name(),
                    at,
                    opcode: opcode.mnemonic(),
                }),
                Some(kind) if opcode == Opcode::Conv => {
                    if ValueKind::from_name(kind).is_none() {
                        errors.push(VerifyError::UnknownConversion {
                            block: name(),
                            at,
                            kind: kind.to_owned(),
                        });
                    }
                }
                Some(_) => {}
            }
        }
    }

    errors
}

/// Check block names across an image: non-empty and unique.
pub fn check_block_names(blocks: &[CodeBlock]) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (index, block) in blocks.iter().enumerate() {
        if block.name.is_empty() {
            errors.push(VerifyError::EmptyBlockName { index });
            continue;
        }
        if let Some(&first) = seen.get(block.name.as_str()) {
            errors.push(VerifyError::DuplicateBlockName {
                name: block.name.clone(),
                first,
                second: index,
            });
        } else {
            seen.insert(block.name.as_str(), index);
        }
    }

    errors
}
