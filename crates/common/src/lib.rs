//! GML common types and bytecode encoding.
//!
//! This crate provides the foundational data structures shared by the VM,
//! verifier, assembler and CLI:
//!
//! - [`Value`]: the dynamically-typed runtime scalar and its coercions
//! - [`ValueKind`]: the four value kinds, also used as operand tags
//! - [`Opcode`]: the instruction set, in wire enumerant order
//! - [`Instruction`]: one instruction with typed operands, name and target
//! - [`CodeBlock`]: a named instruction sequence, plus the `.gmb` image codec
//! - [`DecodeError`]: errors from decoding byte streams
//!
//! # Dependencies
//!
//! This crate uses `thiserror` and has no other dependencies.

mod codec;

pub mod code_block;
pub mod error;
pub mod instruction;
pub mod kind;
pub mod opcode;
pub mod value;

// Re-export commonly used types at the crate root.
pub use code_block::{decode_blocks, encode_blocks, CodeBlock};
pub use error::DecodeError;
pub use instruction::Instruction;
pub use kind::ValueKind;
pub use opcode::Opcode;
pub use value::Value;

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_opcode() -> impl Strategy<Value = Opcode> {
        prop::sample::select(&opcode::ALL_OPCODES[..])
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Undefined),
            any::<f64>().prop_map(Value::Number),
            "[a-z0-9 _]{0,12}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Boolean),
        ]
    }

    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        (
            arb_opcode(),
            arb_value(),
            arb_value(),
            "[a-z_][a-z0-9_]{0,10}",
            prop::option::of(0u32..=i32::MAX as u32),
        )
            .prop_map(|(op, a, b, name, target)| {
                let mut instr = Instruction::new(op)
                    .with_operand(a)
                    .with_operand2(b)
                    .with_name(name);
                instr.target = target;
                instr
            })
    }

    proptest! {
        /// Numbers report truthiness exactly when non-zero.
        #[test]
        fn number_truthiness(n in any::<f64>()) {
            prop_assert_eq!(Value::Number(n).as_boolean(), n != 0.0);
        }

        /// Integral numbers in i32 range print as plain decimal integers.
        #[test]
        fn integral_numbers_print_without_point(n in any::<i32>()) {
            let value = Value::Number(n as f64);
            prop_assert_eq!(value.as_string(), n.to_string());
        }

        /// Division by zero yields zero, never an error or infinity.
        #[test]
        fn division_by_zero_is_zero(n in any::<f64>()) {
            let quotient = Value::Number(n) / Value::Number(0.0);
            prop_assert_eq!(quotient, Value::Number(0.0));
        }

        /// Comparison results are mutually consistent for numbers.
        #[test]
        fn ordering_consistent(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let (x, y) = (Value::Number(a), Value::Number(b));
            prop_assert_eq!(x.less_than(&y), a < b);
            prop_assert_eq!(x.greater_equal(&y), !(a < b));
            prop_assert_eq!(x.equals(&y), a == b);
        }

        /// Instructions survive the wire encoding unchanged.
        #[test]
        fn instruction_roundtrip(instr in arb_instruction()) {
            let decoded = Instruction::decode(&instr.encode()).unwrap();
            prop_assert_eq!(instr, decoded);
        }

        /// Random bytes never panic the block decoder.
        #[test]
        fn random_bytes_decode(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut image = b"GMBC".to_vec();
            image.extend_from_slice(&bytes);
            if let Ok(blocks) = decode_blocks(&image) {
                let again = decode_blocks(&encode_blocks(&blocks)).unwrap();
                prop_assert_eq!(blocks, again);
            }
        }

        /// Whole images survive the wire encoding unchanged.
        #[test]
        fn image_roundtrip(
            instrs in prop::collection::vec(arb_instruction(), 0..20),
            id in any::<i32>(),
        ) {
            let blocks = vec![CodeBlock::new("block", instrs).with_id(id)];
            let decoded = decode_blocks(&encode_blocks(&blocks)).unwrap();
            prop_assert_eq!(blocks, decoded);
        }
    }
}
