//! Executor configuration.

/// Default bound on frames in the call stack.
///
/// Each nested CALL recurses on the native stack, so the bound must fit a
/// 2 MiB thread stack in an unoptimized build.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Default bound on operand stack slots.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 65_536;

/// What a nested code-block CALL does with the callee's return value.
///
/// Built-in results are always pushed regardless of this policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallResultPolicy {
    /// The return value is dropped; the caller's stack is unchanged.
    #[default]
    Discard,
    /// The return value is pushed onto the operand stack.
    Push,
}

/// Limits and switches for a [`Vm`](crate::Vm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Frames allowed on the call stack before CALL faults.
    pub max_call_depth: usize,
    /// Operand stack slots allowed before a push faults.
    pub max_stack_depth: usize,
    /// Instructions one top-level invocation may execute, including
    /// nested calls. `None` means unlimited.
    pub instruction_budget: Option<u64>,
    /// Emit a `debug!` event per executed instruction.
    pub debug_output: bool,
    pub call_results: CallResultPolicy,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            instruction_budget: None,
            debug_output: false,
            call_results: CallResultPolicy::Discard,
        }
    }
}

impl VmConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn with_instruction_budget(mut self, budget: u64) -> Self {
        self.instruction_budget = Some(budget);
        self
    }

    pub fn with_debug_output(mut self, enabled: bool) -> Self {
        self.debug_output = enabled;
        self
    }

    pub fn with_call_results(mut self, policy: CallResultPolicy) -> Self {
        self.call_results = policy;
        self
    }
}
