//! Size limits for code blocks.

use crate::error::VerifyError;
use gml_common::{CodeBlock, Opcode, Value};

/// Maximum block size in instructions.
pub const MAX_BLOCK_SIZE: usize = 65_536;

/// Maximum argument count for CALL and CALLV.
pub const MAX_CALL_ARGS: f64 = 255.0;

/// Run the limits check on one block.
pub fn check_limits(block: &CodeBlock) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    if block.len() > MAX_BLOCK_SIZE {
        errors.push(VerifyError::BlockTooLarge {
            block: block.name.clone(),
            len: block.len(),
            max: MAX_BLOCK_SIZE,
        });
    }

    for (i, instr) in block.instructions.iter().enumerate() {
        if !matches!(instr.opcode, Opcode::Call | Opcode::CallV) {
            continue;
        }
        if !valid_argument_count(&instr.operand1) {
            errors.push(VerifyError::InvalidArgumentCount {
                block: block.name.clone(),
                at: i,
                count: format!("{:?}", instr.operand1),
            });
        }
    }

    errors
}

/// Undefined (no arguments) or an integral Number in `0..=MAX_CALL_ARGS`.
fn valid_argument_count(operand: &Value) -> bool {
    match operand {
        Value::Undefined => true,
        Value::Number(n) => n.fract() == 0.0 && (0.0..=MAX_CALL_ARGS).contains(n),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gml_common::Instruction;

    fn call(argc: impl Into<Value>) -> Instruction {
        Instruction::new(Opcode::Call)
            .with_name("f")
            .with_operand(argc)
    }

    #[test]
    fn small_block_passes() {
        let block = CodeBlock::new("main", vec![Instruction::new(Opcode::Nop)]);
        assert!(check_limits(&block).is_empty());
    }

    #[test]
    fn block_too_large() {
        let block = CodeBlock::new(
            "huge",
            vec![Instruction::new(Opcode::Nop); MAX_BLOCK_SIZE + 1],
        );
        let errors = check_limits(&block);
        assert_eq!(
            errors,
            vec![VerifyError::BlockTooLarge {
                block: "huge".into(),
                len: MAX_BLOCK_SIZE + 1,
                max: MAX_BLOCK_SIZE,
            }]
        );
    }

    #[test]
    fn block_at_limit_passes() {
        let block = CodeBlock::new("big", vec![Instruction::new(Opcode::Nop); MAX_BLOCK_SIZE]);
        assert!(check_limits(&block).is_empty());
    }

    #[test]
    fn argument_counts() {
        let ok = CodeBlock::new(
            "main",
            vec![call(0), call(3), call(255), Instruction::new(Opcode::Call).with_name("f")],
        );
        assert!(check_limits(&ok).is_empty());

        let bad = CodeBlock::new("main", vec![call(-1), call(1.5), call(256), call("two")]);
        let errors = check_limits(&bad);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| matches!(e, VerifyError::InvalidArgumentCount { .. })));
    }
}
