//! Opcode definitions for the GML instruction set.
//!
//! Discriminants are the wire enumerants produced by the bytecode
//! extractor, so their order must never change.

use crate::error::DecodeError;

/// Identifies the operation to perform.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack
    /// Push the first operand as a number.
    Push = 0,
    /// Pop the top of stack; store it in the global named by the name operand, if any.
    Pop = 1,
    /// Push an integer operand as a number.
    PushI = 2,
    /// Push a real operand as a number.
    PushF = 3,
    /// Push the name operand as a string.
    PushS = 4,
    /// Push the first operand coerced to a boolean.
    PushB = 5,
    /// Push undefined.
    PushU = 6,
    /// Push a variable by name: local first, then global.
    PushVn = 7,
    /// Pop into a variable by name: existing local, otherwise global.
    PopVn = 8,

    // Arithmetic
    /// Pop b, pop a, push a + b.
    Add = 9,
    /// Pop b, pop a, push a - b.
    Sub = 10,
    /// Pop b, pop a, push a * b.
    Mul = 11,
    /// Pop b, pop a, push a / b. A zero divisor yields 0.
    Div = 12,
    /// Pop b, pop a, push the floating remainder of a / b.
    Mod = 13,
    /// Pop one value, push its negation.
    Neg = 14,

    // Bitwise
    /// Bitwise AND on 64-bit integers.
    And = 15,
    /// Bitwise OR on 64-bit integers.
    Or = 16,
    /// Bitwise XOR on 64-bit integers.
    Xor = 17,
    /// Bitwise complement of one value.
    Com = 18,
    /// Shift a left by b.
    Shl = 19,
    /// Arithmetic shift of a right by b.
    Shr = 20,

    // Comparison and logic
    /// Push 1 if a == b, else 0.
    Teq = 21,
    /// Push 1 if a != b, else 0.
    Tne = 22,
    /// Push 1 if a < b, else 0.
    Tlt = 23,
    /// Push 1 if a <= b, else 0.
    Tle = 24,
    /// Push 1 if a > b, else 0.
    Tgt = 25,
    /// Push 1 if a >= b, else 0.
    Tge = 26,
    /// Push 1 if both operands are truthy, else 0.
    Land = 27,
    /// Push 1 if either operand is truthy, else 0.
    Lor = 28,
    /// Pop one value, push 1 if it is falsy, else 0.
    Not = 29,

    // Control flow
    /// Jump to the instruction's jump target.
    Jmp = 30,
    /// Pop a value; jump if it is truthy.
    Bt = 31,
    /// Pop a value; jump if it is falsy.
    Bf = 32,
    /// Pop the return value and leave the current block.
    Ret = 33,
    /// Call a code block or built-in by name. operand1 = argument count.
    Call = 34,
    /// Pop a function name, then call it like CALL.
    CallV = 35,
    /// No operation.
    Nop = 36,
    /// Stop the whole invocation chain.
    Exit = 37,

    // Variables
    /// Push a global variable.
    LdGlb = 38,
    /// Pop into a global variable.
    StGlb = 39,
    /// Push a local variable of the active frame.
    LdLoc = 40,
    /// Pop into a local variable of the active frame.
    StLoc = 41,
    /// Load an instance variable. Instance scope lives in the host.
    LdInst = 42,
    /// Store an instance variable. Instance scope lives in the host.
    StInst = 43,

    // Conversion
    /// Pop a value, push it converted to the kind named by the name operand.
    Conv = 44,

    // Stack manipulation
    /// Duplicate the top of stack.
    Dup = 45,
    /// Discard the top of stack.
    Drop = 46,

    // End marker
    /// Placeholder emitted for unrecognised source instructions.
    Invalid = 47,
}

/// All opcodes, in enumerant order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 48] = [
    Opcode::Push,
    Opcode::Pop,
    Opcode::PushI,
    Opcode::PushF,
    Opcode::PushS,
    Opcode::PushB,
    Opcode::PushU,
    Opcode::PushVn,
    Opcode::PopVn,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Neg,
    Opcode::And,
    Opcode::Or,
    Opcode::Xor,
    Opcode::Com,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::Teq,
    Opcode::Tne,
    Opcode::Tlt,
    Opcode::Tle,
    Opcode::Tgt,
    Opcode::Tge,
    Opcode::Land,
    Opcode::Lor,
    Opcode::Not,
    Opcode::Jmp,
    Opcode::Bt,
    Opcode::Bf,
    Opcode::Ret,
    Opcode::Call,
    Opcode::CallV,
    Opcode::Nop,
    Opcode::Exit,
    Opcode::LdGlb,
    Opcode::StGlb,
    Opcode::LdLoc,
    Opcode::StLoc,
    Opcode::LdInst,
    Opcode::StInst,
    Opcode::Conv,
    Opcode::Dup,
    Opcode::Drop,
    Opcode::Invalid,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ALL_OPCODES
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownOpcode(value))
    }
}

impl Opcode {
    /// Lenient byte conversion used by the image decoder. Bytes past the
    /// instruction set become [`Opcode::Invalid`], which executes as a no-op.
    pub fn from_byte(byte: u8) -> Self {
        Self::try_from(byte).unwrap_or(Opcode::Invalid)
    }

    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::PushI => "PUSHI",
            Opcode::PushF => "PUSHF",
            Opcode::PushS => "PUSHS",
            Opcode::PushB => "PUSHB",
            Opcode::PushU => "PUSHU",
            Opcode::PushVn => "PUSHVN",
            Opcode::PopVn => "POPVN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Com => "COM",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Teq => "TEQ",
            Opcode::Tne => "TNE",
            Opcode::Tlt => "TLT",
            Opcode::Tle => "TLE",
            Opcode::Tgt => "TGT",
            Opcode::Tge => "TGE",
            Opcode::Land => "LAND",
            Opcode::Lor => "LOR",
            Opcode::Not => "NOT",
            Opcode::Jmp => "JMP",
            Opcode::Bt => "BT",
            Opcode::Bf => "BF",
            Opcode::Ret => "RET",
            Opcode::Call => "CALL",
            Opcode::CallV => "CALLV",
            Opcode::Nop => "NOP",
            Opcode::Exit => "EXIT",
            Opcode::LdGlb => "LDGLB",
            Opcode::StGlb => "STGLB",
            Opcode::LdLoc => "LDLOC",
            Opcode::StLoc => "STLOC",
            Opcode::LdInst => "LDINST",
            Opcode::StInst => "STINST",
            Opcode::Conv => "CONV",
            Opcode::Dup => "DUP",
            Opcode::Drop => "DROP",
            Opcode::Invalid => "INVALID",
        }
    }

    /// Looks up an opcode by mnemonic, case-insensitively.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
            .copied()
    }

    /// JMP, BT and BF: the opcodes that consume a jump target.
    pub fn is_branch(&self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::Bt | Opcode::Bf)
    }

    /// Opcodes that cannot do anything without a name operand.
    pub fn requires_name(&self) -> bool {
        matches!(
            self,
            Opcode::PushVn
                | Opcode::PopVn
                | Opcode::Call
                | Opcode::LdGlb
                | Opcode::StGlb
                | Opcode::LdLoc
                | Opcode::StLoc
                | Opcode::Conv
        )
    }

    /// Opcodes the executor has no semantics for. They execute as a logged
    /// no-op.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Opcode::LdInst | Opcode::StInst | Opcode::Invalid)
    }
}
