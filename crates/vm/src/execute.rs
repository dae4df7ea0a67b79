//! Main execution loop and opcode dispatch for the GML VM.

use std::collections::HashMap;
use std::sync::Arc;

use gml_common::{CodeBlock, Instruction, Opcode, Value, ValueKind};
use tracing::{debug, error, warn};

use crate::config::CallResultPolicy;
use crate::error::RuntimeFault;
use crate::machine::{Frame, Vm};

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// RET executed.
    Returned,
    /// The instruction pointer ran past the end of the block.
    FellThrough,
    /// EXIT executed in this block or in a callee.
    Exited,
    /// A fault stopped the block.
    Faulted(RuntimeFault),
    /// No code block with the requested name is loaded.
    NotFound,
}

impl Completion {
    pub fn fault(&self) -> Option<&RuntimeFault> {
        match self {
            Completion::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Result of invoking a function: the return value plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub value: Value,
    pub completion: Completion,
}

/// What the loop does after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Return,
    Exit,
}

impl Vm {
    /// Invoke a loaded code block by name and return its value.
    ///
    /// Never fails: an unknown name yields Number `0`, and a faulted or
    /// fallen-through block yields its frame's return value (Undefined
    /// unless RET ran).
    pub fn execute_function(&mut self, name: &str) -> Value {
        self.run_function(name).value
    }

    /// Like [`execute_function`](Self::execute_function), but also reports
    /// how the invocation ended.
    ///
    /// Starts a fresh instruction budget.
    pub fn run_function(&mut self, name: &str) -> Execution {
        self.executed = 0;
        self.invoke(name, HashMap::new())
    }

    /// Push a frame for `name`, run its block, pop the frame.
    fn invoke(&mut self, name: &str, locals: HashMap<String, Value>) -> Execution {
        let Some(block) = self.code_blocks.get(name).map(Arc::clone) else {
            warn!(name, "function not found");
            return Execution {
                value: Value::Number(0.0),
                completion: Completion::NotFound,
            };
        };

        let mut frame = Frame::new(name);
        frame.locals = locals;
        self.call_stack.push(frame);

        let completion = self.run_block(&block);

        let value = self
            .call_stack
            .pop()
            .map(|frame| frame.return_value)
            .unwrap_or_default();
        if completion == Completion::Exited {
            self.exit_requested = true;
        }

        Execution { value, completion }
    }

    /// Fetch-execute loop over one block, in the topmost frame.
    fn run_block(&mut self, block: &CodeBlock) -> Completion {
        let mut ip = 0;

        while let Some(instr) = block.instructions.get(ip) {
            if let Some(frame) = self.call_stack.last_mut() {
                frame.ip = ip;
            }

            if let Some(budget) = self.config.instruction_budget {
                if self.executed >= budget {
                    return self.fault(block, RuntimeFault::BudgetExhausted { at: ip, budget });
                }
            }
            self.executed += 1;

            if self.config.debug_output {
                debug!(
                    block = %block.name,
                    at = ip,
                    op = instr.opcode.mnemonic(),
                    depth = self.stack.len(),
                    "execute"
                );
            }

            match self.step(instr, ip) {
                Ok(Flow::Next) => ip += 1,
                Ok(Flow::Jump(target)) => ip = target,
                Ok(Flow::Return) => return Completion::Returned,
                Ok(Flow::Exit) => return Completion::Exited,
                Err(fault) => return self.fault(block, fault),
            }
        }

        Completion::FellThrough
    }

    fn fault(&self, block: &CodeBlock, fault: RuntimeFault) -> Completion {
        error!(block = %block.name, at = fault.at(), %fault, "runtime fault");
        if self.config.debug_output {
            debug!("{}", self.call_stack());
        }
        Completion::Faulted(fault)
    }

    /// Execute one instruction.
    fn step(&mut self, instr: &Instruction, at: usize) -> Result<Flow, RuntimeFault> {
        match instr.opcode {
            // Stack push
            Opcode::Push | Opcode::PushI | Opcode::PushF => {
                self.push(Value::Number(instr.operand1.as_number()), at)?
            }
            Opcode::PushS => self.push(Value::String(instr.name_str().to_owned()), at)?,
            // Truth of the numeric reading, so "0" and "abc" push false.
            Opcode::PushB => {
                self.push(Value::Boolean(instr.operand1.as_number() != 0.0), at)?
            }
            Opcode::PushU => self.push(Value::Undefined, at)?,

            // Variables
            Opcode::Pop => {
                let value = self.pop(at);
                if let Some(name) = &instr.name {
                    self.globals.insert(name.clone(), value);
                }
            }
            Opcode::PushVn => {
                let name = required_name(instr, at)?;
                let value = match self.frame(at)?.locals.get(name) {
                    Some(value) => value.clone(),
                    None => self.load_global(name, at),
                };
                self.push(value, at)?;
            }
            Opcode::PopVn => {
                let name = required_name(instr, at)?;
                let value = self.pop(at);
                if self.frame(at)?.locals.contains_key(name) {
                    self.frame_mut(at)?.locals.insert(name.to_owned(), value);
                } else {
                    self.globals.insert(name.to_owned(), value);
                }
            }
            Opcode::LdGlb => {
                let name = required_name(instr, at)?;
                let value = self.load_global(name, at);
                self.push(value, at)?;
            }
            Opcode::StGlb => {
                let name = required_name(instr, at)?;
                let value = self.pop(at);
                self.globals.insert(name.to_owned(), value);
            }
            Opcode::LdLoc => {
                let name = required_name(instr, at)?;
                let value = match self.frame(at)?.locals.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!(name, at, "undefined local variable");
                        Value::Undefined
                    }
                };
                self.push(value, at)?;
            }
            Opcode::StLoc => {
                let name = required_name(instr, at)?;
                let value = self.pop(at);
                self.frame_mut(at)?.locals.insert(name.to_owned(), value);
            }

            // Arithmetic
            Opcode::Add => self.binary(at, |a, b| a + b)?,
            Opcode::Sub => self.binary(at, |a, b| a - b)?,
            Opcode::Mul => self.binary(at, |a, b| a * b)?,
            Opcode::Div => self.binary(at, |a, b| a / b)?,
            Opcode::Mod => self.binary(at, |a, b| a % b)?,
            Opcode::Neg => self.unary(at, |a| -a)?,

            // Bitwise
            Opcode::And => self.binary(at, |a, b| a & b)?,
            Opcode::Or => self.binary(at, |a, b| a | b)?,
            Opcode::Xor => self.binary(at, |a, b| a ^ b)?,
            Opcode::Com => self.unary(at, Value::complement)?,
            Opcode::Shl => self.binary(at, |a, b| a << b)?,
            Opcode::Shr => self.binary(at, |a, b| a >> b)?,

            // Comparison
            Opcode::Teq => self.binary(at, |a, b| Value::from_truth(a.equals(b)))?,
            Opcode::Tne => self.binary(at, |a, b| Value::from_truth(a.not_equals(b)))?,
            Opcode::Tlt => self.binary(at, |a, b| Value::from_truth(a.less_than(b)))?,
            Opcode::Tle => self.binary(at, |a, b| Value::from_truth(a.less_equal(b)))?,
            Opcode::Tgt => self.binary(at, |a, b| Value::from_truth(a.greater_than(b)))?,
            Opcode::Tge => self.binary(at, |a, b| Value::from_truth(a.greater_equal(b)))?,

            // Logical: both operands are always evaluated.
            Opcode::Land => {
                self.binary(at, |a, b| Value::from_truth(a.as_boolean() && b.as_boolean()))?
            }
            Opcode::Lor => {
                self.binary(at, |a, b| Value::from_truth(a.as_boolean() || b.as_boolean()))?
            }
            Opcode::Not => self.unary(at, |a| Value::from_truth(!a.as_boolean()))?,

            // Control flow
            Opcode::Jmp => return Ok(jump(instr, at)),
            Opcode::Bt => {
                if self.pop(at).as_boolean() {
                    return Ok(jump(instr, at));
                }
            }
            Opcode::Bf => {
                if !self.pop(at).as_boolean() {
                    return Ok(jump(instr, at));
                }
            }
            Opcode::Ret => {
                let value = self.pop(at);
                self.frame_mut(at)?.return_value = value;
                return Ok(Flow::Return);
            }
            Opcode::Exit => return Ok(Flow::Exit),
            // A nameless CALL resolves to nothing, like an unknown name.
            Opcode::Call => match instr.name.as_deref() {
                Some(name) => return self.call(name, argument_count(instr), at),
                None => warn!(at, "CALL without a function name"),
            },
            Opcode::CallV => {
                let name = self.pop(at).as_string().into_owned();
                return self.call(&name, argument_count(instr), at);
            }

            // Stack manipulation
            Opcode::Dup => {
                let value = self.peek(at);
                self.push(value, at)?;
            }
            Opcode::Drop => {
                self.pop(at);
            }
            Opcode::Conv => {
                let target = required_name(instr, at)?;
                let kind = ValueKind::from_name(target).ok_or_else(|| {
                    RuntimeFault::InvalidConversion {
                        at,
                        target: target.to_owned(),
                    }
                })?;
                let value = self.pop(at);
                self.push(value.convert(kind), at)?;
            }

            Opcode::Nop => {}

            // Instance scope lives in the scene graph, outside the VM.
            Opcode::LdInst | Opcode::StInst | Opcode::Invalid => {
                warn!(op = instr.opcode.mnemonic(), at, "unsupported opcode ignored");
            }
        }

        Ok(Flow::Next)
    }

    /// Pop `b`, pop `a`, push `a OP b`.
    fn binary(
        &mut self,
        at: usize,
        op: impl FnOnce(&Value, &Value) -> Value,
    ) -> Result<(), RuntimeFault> {
        let b = self.pop(at);
        let a = self.pop(at);
        self.push(op(&a, &b), at)
    }

    fn unary(&mut self, at: usize, op: impl FnOnce(&Value) -> Value) -> Result<(), RuntimeFault> {
        let a = self.pop(at);
        self.push(op(&a), at)
    }

    fn load_global(&self, name: &str, at: usize) -> Value {
        match self.globals.get(name) {
            Some(value) => value.clone(),
            None => {
                warn!(name, at, "undefined global variable");
                Value::Undefined
            }
        }
    }

    /// Resolve `callee` against the code-block table, then the built-ins.
    fn call(&mut self, callee: &str, argc: usize, at: usize) -> Result<Flow, RuntimeFault> {
        if self.code_blocks.contains_key(callee) {
            if self.call_stack.len() >= self.config.max_call_depth {
                return Err(RuntimeFault::RecursionLimitExceeded {
                    at,
                    limit: self.config.max_call_depth,
                    callee: callee.to_owned(),
                });
            }

            let args = self.pop_args(argc, at);
            let mut locals = HashMap::with_capacity(argc + 1);
            locals.insert("argument_count".to_owned(), Value::Number(argc as f64));
            for (i, arg) in args.into_iter().enumerate() {
                locals.insert(format!("argument{i}"), arg);
            }

            let execution = self.invoke(callee, locals);
            if execution.completion == Completion::Exited {
                return Ok(Flow::Exit);
            }
            if self.config.call_results == CallResultPolicy::Push {
                self.push(execution.value, at)?;
            }
        } else if self.builtins.contains(callee) {
            let args = self.pop_args(argc, at);
            let result = self.builtins.invoke(callee, &args);
            self.push(result, at)?;
        } else {
            warn!(name = callee, at, "call to unknown function");
        }

        Ok(Flow::Next)
    }
}

fn required_name(instr: &Instruction, at: usize) -> Result<&str, RuntimeFault> {
    instr
        .name
        .as_deref()
        .ok_or_else(|| RuntimeFault::missing_operand(at, instr.opcode))
}

/// CALL's argument count lives in operand1. Negative or NaN counts are 0.
fn argument_count(instr: &Instruction) -> usize {
    instr.operand1.as_number() as usize
}

fn jump(instr: &Instruction, at: usize) -> Flow {
    match instr.target {
        Some(target) => Flow::Jump(target as usize),
        None => {
            warn!(op = instr.opcode.mnemonic(), at, "branch without target");
            Flow::Next
        }
    }
}
