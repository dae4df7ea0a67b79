//! Instruction records and their binary encoding.
//!
//! Every instruction is encoded little-endian as:
//! ```text
//! u8        opcode enumerant
//! operand   operand1: u8 kind tag, then f64 / u32-length UTF-8 / u8
//! operand   operand2: same layout
//! u32 + N   name: byte length then UTF-8 (length 0 = no name)
//! i32       jump target (negative = no target)
//! ```

use crate::codec::{self, Reader};
use crate::error::DecodeError;
use crate::opcode::Opcode;
use crate::value::Value;

/// A single instruction. Immutable once loaded into a code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// First typed operand. `Undefined` if unused.
    pub operand1: Value,
    /// Second typed operand. `Undefined` if unused.
    pub operand2: Value,
    /// Variable, function or global-store name, or the PUSHS literal.
    pub name: Option<String>,
    /// Absolute instruction index within the owning code block.
    pub target: Option<u32>,
}

impl Instruction {
    /// Create an instruction with no operands.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            operand1: Value::Undefined,
            operand2: Value::Undefined,
            name: None,
            target: None,
        }
    }

    pub fn with_operand(mut self, value: impl Into<Value>) -> Self {
        self.operand1 = value.into();
        self
    }

    pub fn with_operand2(mut self, value: impl Into<Value>) -> Self {
        self.operand2 = value.into();
        self
    }

    /// Sets the name operand. An empty name means no name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn with_target(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }

    /// The name operand, or `""` when absent.
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Encode this instruction to bytes.
    ///
    /// Targets beyond `i32::MAX` are not representable on the wire and
    /// encode as "no target".
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Decode exactly one instruction from `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let instr = Self::read_from(&mut reader)?;
        reader.finish()?;
        Ok(instr)
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.opcode as u8);
        codec::write_value(out, &self.operand1);
        codec::write_value(out, &self.operand2);
        codec::write_str(out, self.name_str());
        let target = self
            .target
            .and_then(|t| i32::try_from(t).ok())
            .unwrap_or(-1);
        codec::write_i32(out, target);
    }

    pub(crate) fn read_from(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let opcode = Opcode::from_byte(reader.read_u8()?);
        let operand1 = reader.read_value()?;
        let operand2 = reader.read_value()?;
        let name = reader.read_str()?;
        let target = reader.read_i32()?;

        Ok(Self {
            opcode,
            operand1,
            operand2,
            name: (!name.is_empty()).then_some(name),
            target: u32::try_from(target).ok(),
        })
    }
}
