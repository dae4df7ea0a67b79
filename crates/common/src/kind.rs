//! Value kind tags.
//!
//! The kind tag is the byte that precedes every encoded operand and the
//! name accepted by the CONV instruction.

use crate::error::DecodeError;

/// Identifies which of the four value kinds is active.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Undefined = 0x00,
    Number = 0x01,
    String = 0x02,
    Boolean = 0x03,
}

/// All value kinds, in tag order.
pub const ALL_VALUE_KINDS: [ValueKind; 4] = [
    ValueKind::Undefined,
    ValueKind::Number,
    ValueKind::String,
    ValueKind::Boolean,
];

impl TryFrom<u8> for ValueKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ValueKind::Undefined),
            0x01 => Ok(ValueKind::Number),
            0x02 => Ok(ValueKind::String),
            0x03 => Ok(ValueKind::Boolean),
            _ => Err(DecodeError::UnknownValueKind(value)),
        }
    }
}

impl ValueKind {
    /// Lowercase name, as written in assembly and CONV operands.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
        }
    }

    /// Looks up a kind by its name, case-insensitively.
    pub fn from_name(name: &str) -> Option<ValueKind> {
        ALL_VALUE_KINDS
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_kinds() {
        for &kind in &ALL_VALUE_KINDS {
            assert_eq!(ValueKind::try_from(kind as u8), Ok(kind));
        }
    }

    #[test]
    fn unknown_tags_rejected() {
        for byte in 0x04..=0xFFu8 {
            assert_eq!(
                ValueKind::try_from(byte),
                Err(DecodeError::UnknownValueKind(byte))
            );
        }
    }

    #[test]
    fn names_resolve() {
        assert_eq!(ValueKind::from_name("number"), Some(ValueKind::Number));
        assert_eq!(ValueKind::from_name("Boolean"), Some(ValueKind::Boolean));
        assert_eq!(ValueKind::from_name("real"), None);
    }
}
