//! GML assembler: bidirectional text ↔ code block translation.
//!
//! The assembler is a mechanical 1:1 translation. No optimization, no
//! labels, no macros. A source file is a sequence of `.block` sections:
//!
//! ```text
//! .block TestAdd        ; header: name, optional numeric id
//! PUSHI 5
//! PUSHI 3
//! ADD
//! RET
//! ```
//!
//! Each instruction line is a mnemonic (case-insensitive), its positional
//! arguments, then any `op1=`, `op2=`, `name=` or `target=` fields.
//!
//! # Usage
//!
//! ```
//! use gml_assembler::{assemble, disassemble};
//!
//! let text = ".block TestAdd\nPUSHI 5\nPUSHI 3\nADD\nRET\n";
//! let blocks = assemble(text).unwrap();
//! assert_eq!(blocks[0].instructions.len(), 4);
//! assert_eq!(disassemble(&blocks), text);
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(disassemble(blocks)) == blocks` holds for every image with
//! unique block names. The disassembler outputs canonical text; the
//! assembler also accepts non-canonical input (hex numbers, lowercase
//! mnemonics, quoted names that could be bare).

pub mod error;

mod disassembler;
mod lexer;
mod parser;

pub use disassembler::disassemble_instruction;
pub use error::AsmError;

use gml_common::CodeBlock;
use lexer::tokenize_line;
use parser::{parse_line, Line};

/// Assemble text into code blocks, in source order.
///
/// Returns the first error encountered. Fix one error at a time.
pub fn assemble(text: &str) -> Result<Vec<CodeBlock>, AsmError> {
    let mut blocks: Vec<CodeBlock> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let tokens = tokenize_line(line, line_num)?;
        match parse_line(&tokens, line_num)? {
            None => {}
            Some(Line::Header { name, id }) => {
                if blocks.iter().any(|b| b.name == name) {
                    return Err(AsmError::DuplicateBlock {
                        line: line_num,
                        name,
                    });
                }
                blocks.push(CodeBlock::new(name, Vec::new()).with_id(id));
            }
            Some(Line::Instruction(instr)) => match blocks.last_mut() {
                Some(block) => block.instructions.push(instr),
                None => return Err(AsmError::InstructionOutsideBlock { line: line_num }),
            },
        }
    }

    Ok(blocks)
}

/// Disassemble code blocks into canonical assembly text.
pub fn disassemble(blocks: &[CodeBlock]) -> String {
    disassembler::disassemble(blocks)
}
