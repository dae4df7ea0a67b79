//! GML virtual machine: executes named code blocks of bytecode.
//!
//! The VM is a stack-based machine with:
//! - A single operand stack shared by every frame
//! - A call stack of frames, each with its own locals and instruction pointer
//! - A process-wide global-variable table
//! - A built-in dispatcher consulted when CALL names no loaded block
//!
//! Execution never fails from the host's point of view: lookup misses and
//! stack underflow degrade to sentinel values, and a [`RuntimeFault`] stops
//! only the block it occurred in.
//!
//! # Usage
//!
//! ```
//! use gml_common::{CodeBlock, Instruction, Opcode, Value};
//! use gml_vm::Vm;
//!
//! let mut vm = Vm::new();
//! vm.add_code_block(CodeBlock::new(
//!     "TestAdd",
//!     vec![
//!         Instruction::new(Opcode::PushI).with_operand(5),
//!         Instruction::new(Opcode::PushI).with_operand(3),
//!         Instruction::new(Opcode::Add),
//!         Instruction::new(Opcode::Ret),
//!     ],
//! ));
//!
//! assert_eq!(vm.execute_function("TestAdd"), Value::Number(8.0));
//! ```

pub mod builtins;
pub mod config;
pub mod error;
pub mod execute;
pub mod machine;

pub use builtins::{BuiltinFn, Builtins};
pub use config::{CallResultPolicy, VmConfig};
pub use error::RuntimeFault;
pub use execute::{Completion, Execution};
pub use machine::{Frame, Vm};

use gml_common::CodeBlock;

/// Load `blocks` into a fresh VM with the given configuration and run
/// `entry`.
pub fn run(blocks: Vec<CodeBlock>, entry: &str, config: VmConfig) -> Execution {
    let mut vm = Vm::with_config(config);
    vm.load_code_blocks(blocks);
    vm.run_function(entry)
}
