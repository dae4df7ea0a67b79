//! VM state management: code-block table, globals, operand stack, call stack.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use gml_common::{CodeBlock, Value};
use tracing::{debug, warn};

use crate::builtins::Builtins;
use crate::config::VmConfig;
use crate::error::RuntimeFault;

/// Per-invocation execution state.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Name of the code block this frame executes.
    pub function: String,
    /// Index of the instruction being executed.
    pub ip: usize,
    /// Local-variable table.
    pub locals: HashMap<String, Value>,
    /// Value set by RET. Undefined until then.
    pub return_value: Value,
}

impl Frame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            ip: 0,
            locals: HashMap::new(),
            return_value: Value::Undefined,
        }
    }
}

/// The GML virtual machine.
///
/// Owns every piece of interpreter state, so independent instances can
/// coexist. Not internally synchronized.
#[derive(Debug, Default)]
pub struct Vm {
    pub(crate) config: VmConfig,
    /// Loaded code blocks by name. Shared with running frames so a block
    /// can be replaced while an older version is still executing.
    pub(crate) code_blocks: HashMap<String, Arc<CodeBlock>>,
    pub(crate) globals: HashMap<String, Value>,
    /// Operand stack, shared by every frame.
    pub(crate) stack: Vec<Value>,
    pub(crate) call_stack: Vec<Frame>,
    pub(crate) builtins: Builtins,
    /// Instructions executed by the current top-level invocation.
    pub(crate) executed: u64,
    pub(crate) exit_requested: bool,
}

impl Vm {
    /// Create a VM with the default configuration and built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    // ---- Code blocks ----

    /// Insert a code block, replacing any block with the same name.
    pub fn add_code_block(&mut self, block: CodeBlock) {
        let name = block.name.clone();
        let len = block.len();
        if self.code_blocks.insert(name.clone(), Arc::new(block)).is_some() {
            debug!(block = %name, len, "replaced code block");
        } else {
            debug!(block = %name, len, "loaded code block");
        }
    }

    /// Insert every block in order. Later blocks win on name collisions.
    pub fn load_code_blocks(&mut self, blocks: impl IntoIterator<Item = CodeBlock>) {
        for block in blocks {
            self.add_code_block(block);
        }
    }

    pub fn code_block(&self, name: &str) -> Option<&CodeBlock> {
        self.code_blocks.get(name).map(Arc::as_ref)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.code_blocks.contains_key(name)
    }

    /// Number of loaded code blocks.
    pub fn code_block_count(&self) -> usize {
        self.code_blocks.len()
    }

    /// True once at least one code block is loaded.
    pub fn is_valid(&self) -> bool {
        !self.code_blocks.is_empty()
    }

    // ---- Globals ----

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }

    // ---- Built-ins ----

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn builtins_mut(&mut self) -> &mut Builtins {
        &mut self.builtins
    }

    // ---- Diagnostics ----

    /// Toggle per-instruction logging. Never affects semantics.
    pub fn set_debug_output(&mut self, enabled: bool) {
        self.config.debug_output = enabled;
    }

    pub fn debug_output(&self) -> bool {
        self.config.debug_output
    }

    /// Human-readable snapshot of the active frames, outermost first.
    pub fn call_stack(&self) -> String {
        let mut out = String::from("Call Stack:\n");
        for (i, frame) in self.call_stack.iter().enumerate() {
            let _ = writeln!(out, "  [{i}] {} @ {}", frame.function, frame.ip);
        }
        out
    }

    /// Active frames, outermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.call_stack
    }

    pub fn operand_stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn clear_operand_stack(&mut self) {
        self.stack.clear();
    }

    /// True if the last invocation chain was stopped by EXIT.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn clear_exit(&mut self) {
        self.exit_requested = false;
    }

    // ---- Operand stack ----

    /// Push a value, checking the configured depth.
    pub(crate) fn push(&mut self, value: Value, at: usize) -> Result<(), RuntimeFault> {
        if self.stack.len() >= self.config.max_stack_depth {
            return Err(RuntimeFault::StackOverflow {
                at,
                limit: self.config.max_stack_depth,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value. An empty stack yields Number `0`.
    pub(crate) fn pop(&mut self, at: usize) -> Value {
        self.stack.pop().unwrap_or_else(|| {
            warn!(at, "operand stack underflow");
            Value::Number(0.0)
        })
    }

    /// Copy of the top value. An empty stack yields Number `0`.
    pub(crate) fn peek(&self, at: usize) -> Value {
        match self.stack.last() {
            Some(value) => value.clone(),
            None => {
                warn!(at, "operand stack underflow on peek");
                Value::Number(0.0)
            }
        }
    }

    /// Pop `count` values, returned in push order.
    pub(crate) fn pop_args(&mut self, count: usize, at: usize) -> Vec<Value> {
        let mut args: Vec<Value> = (0..count).map(|_| self.pop(at)).collect();
        args.reverse();
        args
    }

    // ---- Frames ----

    pub(crate) fn frame_mut(&mut self, at: usize) -> Result<&mut Frame, RuntimeFault> {
        self.call_stack
            .last_mut()
            .ok_or(RuntimeFault::NoActiveFrame { at })
    }

    pub(crate) fn frame(&self, at: usize) -> Result<&Frame, RuntimeFault> {
        self.call_stack
            .last()
            .ok_or(RuntimeFault::NoActiveFrame { at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gml_common::{Instruction, Opcode};

    fn block(name: &str, len: usize) -> CodeBlock {
        CodeBlock::new(name, vec![Instruction::new(Opcode::Nop); len])
    }

    #[test]
    fn new_vm_is_empty() {
        let vm = Vm::new();
        assert!(!vm.is_valid());
        assert_eq!(vm.code_block_count(), 0);
        assert!(vm.operand_stack().is_empty());
        assert!(!vm.exit_requested());
        assert!(vm.builtins().contains("abs"));
    }

    #[test]
    fn add_code_block_is_upsert() {
        let mut vm = Vm::new();
        vm.add_code_block(block("step", 1));
        vm.add_code_block(block("step", 3));
        assert_eq!(vm.code_block_count(), 1);
        assert_eq!(vm.code_block("step").map(CodeBlock::len), Some(3));
        assert!(vm.has_function("step"));
        assert!(vm.is_valid());
    }

    #[test]
    fn load_code_blocks_last_wins() {
        let mut vm = Vm::new();
        vm.load_code_blocks(vec![block("a", 1), block("b", 2), block("a", 5)]);
        assert_eq!(vm.code_block_count(), 2);
        assert_eq!(vm.code_block("a").map(CodeBlock::len), Some(5));
    }

    #[test]
    fn pop_on_empty_stack_yields_zero() {
        let mut vm = Vm::new();
        assert_eq!(vm.pop(0), Value::Number(0.0));
        assert_eq!(vm.peek(0), Value::Number(0.0));
    }

    #[test]
    fn push_respects_max_stack_depth() {
        let mut vm = Vm::with_config(VmConfig::default().with_max_stack_depth(2));
        vm.push(Value::Number(1.0), 0).unwrap();
        vm.push(Value::Number(2.0), 1).unwrap();
        assert_eq!(
            vm.push(Value::Number(3.0), 2),
            Err(RuntimeFault::StackOverflow { at: 2, limit: 2 })
        );
        assert_eq!(vm.operand_stack().len(), 2);
    }

    #[test]
    fn pop_args_preserves_push_order() {
        let mut vm = Vm::new();
        vm.push(Value::Number(1.0), 0).unwrap();
        vm.push(Value::Number(2.0), 0).unwrap();
        vm.push(Value::Number(3.0), 0).unwrap();
        assert_eq!(
            vm.pop_args(2, 0),
            vec![Value::Number(2.0), Value::Number(3.0)]
        );
        assert_eq!(vm.operand_stack(), &[Value::Number(1.0)]);
    }

    #[test]
    fn pop_args_pads_underflow_with_zero() {
        let mut vm = Vm::new();
        vm.push(Value::Number(7.0), 0).unwrap();
        assert_eq!(
            vm.pop_args(2, 0),
            vec![Value::Number(0.0), Value::Number(7.0)]
        );
    }

    #[test]
    fn call_stack_format() {
        let mut vm = Vm::new();
        assert_eq!(vm.call_stack(), "Call Stack:\n");
        vm.call_stack.push(Frame::new("outer"));
        let mut inner = Frame::new("inner");
        inner.ip = 4;
        vm.call_stack.push(inner);
        assert_eq!(
            vm.call_stack(),
            "Call Stack:\n  [0] outer @ 0\n  [1] inner @ 4\n"
        );
    }

    #[test]
    fn frame_access_without_frames_faults() {
        let mut vm = Vm::new();
        assert_eq!(
            vm.frame(3).map(|_| ()),
            Err(RuntimeFault::NoActiveFrame { at: 3 })
        );
        assert!(vm.frame_mut(3).is_err());
    }

    #[test]
    fn globals_roundtrip() {
        let mut vm = Vm::new();
        vm.set_global("score", Value::Number(10.0));
        assert_eq!(vm.global("score"), Some(&Value::Number(10.0)));
        assert_eq!(vm.globals().len(), 1);
        assert_eq!(vm.global("lives"), None);
    }

    #[test]
    fn debug_output_toggle() {
        let mut vm = Vm::new();
        vm.set_debug_output(true);
        assert!(vm.debug_output());
        vm.set_debug_output(false);
        assert!(!vm.debug_output());
    }
}
