//! Disassembler: code blocks → canonical assembly text.
//!
//! One `.block` header per block, one instruction per line, no
//! indentation, no comments. Blocks are separated by a blank line.
//! Fields an opcode's positional syntax does not cover are written as
//! trailing `key=value` pairs so that nothing is lost.

use std::fmt::Write;

use crate::parser::{shape, Shape};
use gml_common::{CodeBlock, Instruction, Value};

/// Disassemble blocks into canonical assembly text.
///
/// `assemble(disassemble(blocks)) == blocks` for every image whose block
/// names are unique.
pub fn disassemble(blocks: &[CodeBlock]) -> String {
    let mut out = String::new();

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(".block ");
        out.push_str(&format_name(&block.name));
        if block.id != -1 {
            let _ = write!(out, " {}", block.id);
        }
        out.push('\n');

        for instr in &block.instructions {
            out.push_str(&disassemble_instruction(instr));
            out.push('\n');
        }
    }

    out
}

/// Render a single instruction as one line of text (no newline).
pub fn disassemble_instruction(instr: &Instruction) -> String {
    let shape = shape(instr.opcode);
    let mut line = instr.opcode.mnemonic().to_string();

    match shape {
        Shape::Bare => {}
        Shape::Value => {
            line.push(' ');
            line.push_str(&format_value(&instr.operand1));
        }
        Shape::Text => {
            line.push(' ');
            line.push_str(&quote(instr.name_str()));
        }
        // A missing required name is written as `""`, which reads back as
        // no name.
        Shape::Name => {
            line.push(' ');
            line.push_str(&format_name(instr.name_str()));
        }
        Shape::OptionalName => {
            if let Some(name) = &instr.name {
                line.push(' ');
                line.push_str(&format_name(name));
            }
        }
        Shape::Target => {
            if let Some(target) = instr.target {
                let _ = write!(line, " {target}");
            }
        }
        Shape::Call => {
            line.push(' ');
            line.push_str(&format_name(instr.name_str()));
            if !instr.operand1.is_undefined() {
                line.push(' ');
                line.push_str(&format_value(&instr.operand1));
            }
        }
        Shape::CallV => {
            if !instr.operand1.is_undefined() {
                line.push(' ');
                line.push_str(&format_value(&instr.operand1));
            }
        }
    }

    if !shape.covers_operand1() && !instr.operand1.is_undefined() {
        let _ = write!(line, " op1={}", format_value(&instr.operand1));
    }
    if !instr.operand2.is_undefined() {
        let _ = write!(line, " op2={}", format_value(&instr.operand2));
    }
    if !shape.covers_name() {
        if let Some(name) = &instr.name {
            let _ = write!(line, " name={}", format_name(name));
        }
    }
    if !shape.covers_target() {
        if let Some(target) = instr.target {
            let _ = write!(line, " target={target}");
        }
    }

    line
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Number(n) => format_literal(*n),
        Value::String(s) => quote(s),
        Value::Boolean(b) => b.to_string(),
    }
}

/// Shortest text that reads back to the same `f64`.
fn format_literal(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = n.abs();
    if magnitude == 0.0 || (1e-5..1e16).contains(&magnitude) {
        format!("{n}")
    } else {
        format!("{n:e}")
    }
}

/// Names that lex as a single identifier are written bare.
fn format_name(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'));
    if bare {
        name.to_string()
    } else {
        quote(name)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
