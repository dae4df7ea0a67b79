//! Error types for the GML assembler.

use thiserror::Error;

/// Errors produced while assembling text into code blocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An unrecognized opcode mnemonic or directive was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// An opcode is missing a required argument.
    #[error("line {line}: {opcode} expects {expected}")]
    MissingArgument {
        line: usize,
        opcode: &'static str,
        expected: &'static str,
    },

    /// A numeric literal could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// A string literal runs to the end of the line.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    /// A backslash escape other than `\" \\ \n \t \r`.
    #[error("line {line}: invalid escape '\\{escape}'")]
    InvalidEscape { line: usize, escape: char },

    /// A `key=` field with an unknown key.
    #[error("line {line}: unknown field '{field}'")]
    UnknownField { line: usize, field: String },

    /// An instruction appeared before the first `.block` header.
    #[error("line {line}: instruction outside of a .block")]
    InstructionOutsideBlock { line: usize },

    /// A `.block` header reuses an earlier block's name.
    #[error("line {line}: duplicate block '{name}'")]
    DuplicateBlock { line: usize, name: String },
}

impl AsmError {
    /// Line number (1-based) the error was reported on.
    pub fn line(&self) -> usize {
        match self {
            AsmError::UnknownOpcode { line, .. }
            | AsmError::MissingArgument { line, .. }
            | AsmError::InvalidNumber { line, .. }
            | AsmError::UnexpectedToken { line, .. }
            | AsmError::UnterminatedString { line }
            | AsmError::InvalidEscape { line, .. }
            | AsmError::UnknownField { line, .. }
            | AsmError::InstructionOutsideBlock { line }
            | AsmError::DuplicateBlock { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_opcode() {
        let e = AsmError::UnknownOpcode {
            line: 3,
            token: "FOO".to_string(),
        };
        assert_eq!(e.to_string(), "line 3: unknown opcode 'FOO'");
    }

    #[test]
    fn error_display_missing_argument() {
        let e = AsmError::MissingArgument {
            line: 7,
            opcode: "LDGLB",
            expected: "a name",
        };
        assert_eq!(e.to_string(), "line 7: LDGLB expects a name");
    }

    #[test]
    fn error_display_invalid_escape() {
        let e = AsmError::InvalidEscape {
            line: 2,
            escape: 'q',
        };
        assert_eq!(e.to_string(), "line 2: invalid escape '\\q'");
    }

    #[test]
    fn error_display_outside_block() {
        let e = AsmError::InstructionOutsideBlock { line: 1 };
        assert_eq!(e.to_string(), "line 1: instruction outside of a .block");
    }

    #[test]
    fn error_line() {
        assert_eq!(AsmError::UnterminatedString { line: 9 }.line(), 9);
        assert_eq!(
            AsmError::DuplicateBlock {
                line: 4,
                name: "a".into()
            }
            .line(),
            4
        );
    }
}
