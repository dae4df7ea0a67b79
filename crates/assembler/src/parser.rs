//! Parser for GML assembly tokens → block headers and instructions.
//!
//! Dispatches on the opcode's [`Shape`] to read its positional arguments,
//! then reads any trailing `key=value` fields.

use crate::error::AsmError;
use crate::lexer::Token;
use gml_common::{Instruction, Opcode, Value};

/// The positional argument pattern of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// No arguments.
    Bare,
    /// One value literal → operand1.
    Value,
    /// One string literal → name.
    Text,
    /// One name → name.
    Name,
    /// An optional name → name.
    OptionalName,
    /// An optional jump target.
    Target,
    /// A name, then an optional argument count → operand1.
    Call,
    /// An optional argument count → operand1.
    CallV,
}

impl Shape {
    pub(crate) fn covers_operand1(self) -> bool {
        matches!(self, Shape::Value | Shape::Call | Shape::CallV)
    }

    pub(crate) fn covers_name(self) -> bool {
        matches!(
            self,
            Shape::Text | Shape::Name | Shape::OptionalName | Shape::Call
        )
    }

    pub(crate) fn covers_target(self) -> bool {
        self == Shape::Target
    }
}

pub(crate) fn shape(opcode: Opcode) -> Shape {
    match opcode {
        Opcode::Push | Opcode::PushI | Opcode::PushF | Opcode::PushB => Shape::Value,
        Opcode::PushS => Shape::Text,
        Opcode::Pop => Shape::OptionalName,
        Opcode::PushVn
        | Opcode::PopVn
        | Opcode::LdGlb
        | Opcode::StGlb
        | Opcode::LdLoc
        | Opcode::StLoc
        | Opcode::LdInst
        | Opcode::StInst
        | Opcode::Conv => Shape::Name,
        Opcode::Jmp | Opcode::Bt | Opcode::Bf => Shape::Target,
        Opcode::Call => Shape::Call,
        Opcode::CallV => Shape::CallV,
        Opcode::PushU
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::Neg
        | Opcode::And
        | Opcode::Or
        | Opcode::Xor
        | Opcode::Com
        | Opcode::Shl
        | Opcode::Shr
        | Opcode::Teq
        | Opcode::Tne
        | Opcode::Tlt
        | Opcode::Tle
        | Opcode::Tgt
        | Opcode::Tge
        | Opcode::Land
        | Opcode::Lor
        | Opcode::Not
        | Opcode::Ret
        | Opcode::Nop
        | Opcode::Exit
        | Opcode::Dup
        | Opcode::Drop
        | Opcode::Invalid => Shape::Bare,
    }
}

/// One meaningful line of assembly.
#[derive(Debug, PartialEq)]
pub(crate) enum Line {
    /// `.block <name> [id]`
    Header { name: String, id: i32 },
    Instruction(Instruction),
}

/// Parse the tokens of a single line.
///
/// Returns `Ok(None)` for blank lines (empty token list).
pub(crate) fn parse_line(tokens: &[Token], line_num: usize) -> Result<Option<Line>, AsmError> {
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    let word = match first {
        Token::Ident(word) => word.as_str(),
        other => {
            return Err(AsmError::UnexpectedToken {
                line: line_num,
                token: other.to_string(),
            })
        }
    };

    if word.eq_ignore_ascii_case(".block") {
        return parse_header(&tokens[1..], line_num).map(Some);
    }

    let opcode = Opcode::from_mnemonic(word).ok_or_else(|| AsmError::UnknownOpcode {
        line: line_num,
        token: word.to_string(),
    })?;

    parse_instruction(opcode, &tokens[1..], line_num).map(|instr| Some(Line::Instruction(instr)))
}

fn parse_header(args: &[Token], line_num: usize) -> Result<Line, AsmError> {
    let mut cursor = Cursor::new(args, line_num, ".block");
    let name = cursor.name("a block name")?;
    let id = match cursor.next_positional() {
        Some(token) => integer_in(token, i32::MIN as f64, i32::MAX as f64, line_num)? as i32,
        None => -1,
    };
    cursor.expect_end()?;
    Ok(Line::Header { name, id })
}

fn parse_instruction(
    opcode: Opcode,
    args: &[Token],
    line_num: usize,
) -> Result<Instruction, AsmError> {
    let mut cursor = Cursor::new(args, line_num, opcode.mnemonic());
    let mut instr = Instruction::new(opcode);

    match shape(opcode) {
        Shape::Bare => {}
        Shape::Value => instr.operand1 = cursor.value("a value")?,
        Shape::Text => instr = instr.with_name(cursor.string("a string literal")?),
        Shape::Name => instr = instr.with_name(cursor.name("a name")?),
        Shape::OptionalName => {
            if let Some(token) = cursor.next_positional() {
                instr = instr.with_name(name_from(token, line_num)?);
            }
        }
        Shape::Target => {
            if let Some(token) = cursor.next_positional() {
                instr.target = Some(target_from(token, line_num)?);
            }
        }
        Shape::Call => {
            instr = instr.with_name(cursor.name("a function name")?);
            if let Some(token) = cursor.next_positional() {
                instr.operand1 = value_from(token, line_num)?;
            }
        }
        Shape::CallV => {
            if let Some(token) = cursor.next_positional() {
                instr.operand1 = value_from(token, line_num)?;
            }
        }
    }

    // Trailing `key=value` fields.
    while let Some(token) = cursor.next() {
        let Token::Key(key) = token else {
            return Err(unexpected(token, line_num));
        };
        let value = cursor.required("a field value")?;
        match key.as_str() {
            "op1" => instr.operand1 = value_from(value, line_num)?,
            "op2" => instr.operand2 = value_from(value, line_num)?,
            "name" => instr = instr.with_name(name_from(value, line_num)?),
            "target" => instr.target = Some(target_from(value, line_num)?),
            _ => {
                return Err(AsmError::UnknownField {
                    line: line_num,
                    field: key.clone(),
                })
            }
        }
    }

    Ok(instr)
}

/// Walks the argument tokens of one line.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
    opcode: &'static str,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], line: usize, opcode: &'static str) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
            opcode,
        }
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// The next token unless it starts a `key=` field.
    fn next_positional(&mut self) -> Option<&'a Token> {
        match self.tokens.get(self.pos) {
            Some(Token::Key(_)) | None => None,
            Some(_) => self.next(),
        }
    }

    fn required(&mut self, expected: &'static str) -> Result<&'a Token, AsmError> {
        self.next().ok_or(AsmError::MissingArgument {
            line: self.line,
            opcode: self.opcode,
            expected,
        })
    }

    fn required_positional(&mut self, expected: &'static str) -> Result<&'a Token, AsmError> {
        self.next_positional().ok_or(AsmError::MissingArgument {
            line: self.line,
            opcode: self.opcode,
            expected,
        })
    }

    fn value(&mut self, expected: &'static str) -> Result<Value, AsmError> {
        let token = self.required_positional(expected)?;
        value_from(token, self.line)
    }

    fn name(&mut self, expected: &'static str) -> Result<String, AsmError> {
        let token = self.required_positional(expected)?;
        name_from(token, self.line)
    }

    fn string(&mut self, expected: &'static str) -> Result<String, AsmError> {
        match self.required_positional(expected)? {
            Token::Str(s) => Ok(s.clone()),
            other => Err(unexpected(other, self.line)),
        }
    }

    fn expect_end(&mut self) -> Result<(), AsmError> {
        match self.next() {
            None => Ok(()),
            Some(token) => Err(unexpected(token, self.line)),
        }
    }
}

fn unexpected(token: &Token, line: usize) -> AsmError {
    AsmError::UnexpectedToken {
        line,
        token: token.to_string(),
    }
}

/// Numbers, strings and the keyword literals `true false undefined nan
/// inf -inf`.
fn value_from(token: &Token, line: usize) -> Result<Value, AsmError> {
    match token {
        Token::Number(n) => Ok(Value::Number(*n)),
        Token::Str(s) => Ok(Value::String(s.clone())),
        Token::Ident(word) => match word.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            "undefined" => Ok(Value::Undefined),
            "nan" => Ok(Value::Number(f64::NAN)),
            "inf" | "+inf" => Ok(Value::Number(f64::INFINITY)),
            "-inf" => Ok(Value::Number(f64::NEG_INFINITY)),
            _ => Err(unexpected(token, line)),
        },
        Token::Key(_) => Err(unexpected(token, line)),
    }
}

/// A bare identifier or a string literal.
fn name_from(token: &Token, line: usize) -> Result<String, AsmError> {
    match token {
        Token::Ident(word) => Ok(word.clone()),
        Token::Str(s) => Ok(s.clone()),
        _ => Err(unexpected(token, line)),
    }
}

fn target_from(token: &Token, line: usize) -> Result<u32, AsmError> {
    integer_in(token, 0.0, i32::MAX as f64, line).map(|n| n as u32)
}

/// An integral number within `[min, max]`.
fn integer_in(token: &Token, min: f64, max: f64, line: usize) -> Result<f64, AsmError> {
    match token {
        Token::Number(n) if n.fract() == 0.0 && (min..=max).contains(n) => Ok(*n),
        Token::Number(_) => Err(AsmError::InvalidNumber {
            line,
            token: token.to_string(),
        }),
        _ => Err(unexpected(token, line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize_line;
    use gml_common::opcode::ALL_OPCODES;

    fn parse(src: &str) -> Result<Option<Line>, AsmError> {
        let tokens = tokenize_line(src, 1)?;
        parse_line(&tokens, 1)
    }

    fn instr(src: &str) -> Instruction {
        match parse(src).unwrap() {
            Some(Line::Instruction(instr)) => instr,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn blank_line() {
        assert_eq!(parse("   ; nothing").unwrap(), None);
    }

    #[test]
    fn every_opcode_has_a_shape() {
        // Branches must own their target; named opcodes must own their name.
        for op in ALL_OPCODES {
            let s = shape(op);
            assert_eq!(s.covers_target(), op.is_branch(), "{op:?}");
            if op.requires_name() {
                assert!(s.covers_name(), "{op:?}");
            }
        }
    }

    #[test]
    fn block_header() {
        assert_eq!(
            parse(".block main").unwrap(),
            Some(Line::Header {
                name: "main".into(),
                id: -1
            })
        );
        assert_eq!(
            parse(r#".BLOCK "gml_Script step" 42"#).unwrap(),
            Some(Line::Header {
                name: "gml_Script step".into(),
                id: 42
            })
        );
    }

    #[test]
    fn block_header_errors() {
        assert!(matches!(
            parse(".block"),
            Err(AsmError::MissingArgument {
                opcode: ".block",
                ..
            })
        ));
        assert!(matches!(
            parse(".block main 1.5"),
            Err(AsmError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse(".block main 1 2"),
            Err(AsmError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn bare_opcode() {
        assert_eq!(instr("add"), Instruction::new(Opcode::Add));
    }

    #[test]
    fn value_literals() {
        assert_eq!(instr("PUSHI 5").operand1, Value::Number(5.0));
        assert_eq!(instr("PUSH \"hi\"").operand1, Value::from("hi"));
        assert_eq!(instr("PUSHB true").operand1, Value::Boolean(true));
        assert_eq!(instr("PUSHB FALSE").operand1, Value::Boolean(false));
        assert_eq!(instr("PUSH undefined").operand1, Value::Undefined);
        assert_eq!(instr("PUSHF -inf").operand1, Value::Number(f64::NEG_INFINITY));
        assert!(instr("PUSHF nan").operand1.as_number().is_nan());
    }

    #[test]
    fn value_required() {
        assert_eq!(
            parse("PUSHI").unwrap_err(),
            AsmError::MissingArgument {
                line: 1,
                opcode: "PUSHI",
                expected: "a value"
            }
        );
        assert!(matches!(
            parse("PUSHI bogus"),
            Err(AsmError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn pushs_takes_a_string_literal() {
        assert_eq!(instr(r#"PUSHS "sqrt""#).name.as_deref(), Some("sqrt"));
        assert_eq!(instr(r#"PUSHS """#).name, None);
        assert!(matches!(
            parse("PUSHS sqrt"),
            Err(AsmError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn names() {
        assert_eq!(
            instr("LDGLB score"),
            Instruction::new(Opcode::LdGlb).with_name("score")
        );
        assert_eq!(
            instr(r#"STLOC "two words""#).name.as_deref(),
            Some("two words")
        );
        assert!(matches!(
            parse("STGLB"),
            Err(AsmError::MissingArgument { opcode: "STGLB", .. })
        ));
    }

    #[test]
    fn pop_name_is_optional() {
        assert_eq!(instr("POP"), Instruction::new(Opcode::Pop));
        assert_eq!(instr("POP x").name.as_deref(), Some("x"));
    }

    #[test]
    fn targets() {
        assert_eq!(instr("JMP 3"), Instruction::new(Opcode::Jmp).with_target(3));
        assert_eq!(instr("BF").target, None);
        assert!(matches!(
            parse("BT -1"),
            Err(AsmError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse("BT 2.5"),
            Err(AsmError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn calls() {
        assert_eq!(
            instr("CALL sqrt 1"),
            Instruction::new(Opcode::Call)
                .with_name("sqrt")
                .with_operand(1)
        );
        assert_eq!(
            instr("CALL helper"),
            Instruction::new(Opcode::Call).with_name("helper")
        );
        assert_eq!(instr("CALLV 2").operand1, Value::Number(2.0));
        assert_eq!(instr("CALLV").operand1, Value::Undefined);
    }

    #[test]
    fn keyed_fields() {
        let i = instr(r#"ADD op1=1 op2="x" name=tag target=7"#);
        assert_eq!(i.operand1, Value::Number(1.0));
        assert_eq!(i.operand2, Value::from("x"));
        assert_eq!(i.name.as_deref(), Some("tag"));
        assert_eq!(i.target, Some(7));
    }

    #[test]
    fn keyed_fields_follow_positionals() {
        let i = instr("CALL f 2 op2=true");
        assert_eq!(i.name.as_deref(), Some("f"));
        assert_eq!(i.operand1, Value::Number(2.0));
        assert_eq!(i.operand2, Value::Boolean(true));
    }

    #[test]
    fn unknown_field() {
        assert_eq!(
            parse("NOP colour=1").unwrap_err(),
            AsmError::UnknownField {
                line: 1,
                field: "colour".into()
            }
        );
    }

    #[test]
    fn field_without_value() {
        assert!(matches!(
            parse("NOP op1="),
            Err(AsmError::MissingArgument { .. })
        ));
    }

    #[test]
    fn trailing_garbage() {
        assert!(matches!(
            parse("ADD 1"),
            Err(AsmError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(
            parse("FROB").unwrap_err(),
            AsmError::UnknownOpcode {
                line: 1,
                token: "FROB".into()
            }
        );
        assert!(matches!(
            parse(".func main"),
            Err(AsmError::UnknownOpcode { .. })
        ));
    }

    #[test]
    fn line_must_start_with_a_word() {
        assert!(matches!(
            parse("5 ADD"),
            Err(AsmError::UnexpectedToken { .. })
        ));
    }
}
