//! Runtime faults for the GML VM.
//!
//! A fault stops the code block it occurred in. It never unwinds past the
//! block boundary: the caller (or the host) sees an ordinary completion.
//! Recoverable conditions such as stack underflow, lookup misses and
//! unknown opcodes are not faults; they are logged and execution goes on.

use gml_common::Opcode;
use thiserror::Error;

/// Faults raised while dispatching a single instruction.
///
/// Every variant carries the index (`at`) of the faulting instruction
/// within its code block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeFault {
    /// A push would exceed the configured operand stack depth.
    #[error("operand stack overflow (limit {limit}) at instruction {at}")]
    StackOverflow { at: usize, limit: usize },

    /// A CALL would exceed the configured call depth.
    #[error("recursion limit {limit} exceeded calling `{callee}` at instruction {at}")]
    RecursionLimitExceeded {
        at: usize,
        limit: usize,
        callee: String,
    },

    /// The top-level invocation used up its instruction budget.
    #[error("instruction budget of {budget} exhausted at instruction {at}")]
    BudgetExhausted { at: usize, budget: u64 },

    /// CONV named a kind that is not a value kind.
    #[error("cannot convert to `{target}` at instruction {at}")]
    InvalidConversion { at: usize, target: String },

    /// An opcode that needs a name operand has none.
    #[error("{opcode} requires a name operand at instruction {at}")]
    MissingOperand { at: usize, opcode: &'static str },

    /// A frame-relative instruction ran with an empty call stack.
    #[error("no active frame at instruction {at}")]
    NoActiveFrame { at: usize },
}

impl RuntimeFault {
    pub(crate) fn missing_operand(at: usize, opcode: Opcode) -> Self {
        RuntimeFault::MissingOperand {
            at,
            opcode: opcode.mnemonic(),
        }
    }

    /// Instruction index the fault occurred at.
    pub fn at(&self) -> usize {
        match self {
            RuntimeFault::StackOverflow { at, .. }
            | RuntimeFault::RecursionLimitExceeded { at, .. }
            | RuntimeFault::BudgetExhausted { at, .. }
            | RuntimeFault::InvalidConversion { at, .. }
            | RuntimeFault::MissingOperand { at, .. }
            | RuntimeFault::NoActiveFrame { at } => *at,
        }
    }
}
