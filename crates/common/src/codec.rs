//! Little-endian primitives shared by the instruction and block codecs.

use crate::error::DecodeError;
use crate::kind::ValueKind;
use crate::value::Value;

pub(crate) fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_str(out: &mut Vec<u8>, text: &str) {
    write_u32(out, text.len() as u32);
    out.extend_from_slice(text.as_bytes());
}

pub(crate) fn write_value(out: &mut Vec<u8>, value: &Value) {
    out.push(value.kind() as u8);
    match value {
        Value::Undefined => {}
        Value::Number(n) => out.extend_from_slice(&n.to_le_bytes()),
        Value::String(s) => write_str(out, s),
        Value::Boolean(b) => out.push(u8::from(*b)),
    }
}

/// Cursor over an encoded image.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.bytes.len(),
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_str(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u32()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    pub(crate) fn read_value(&mut self) -> Result<Value, DecodeError> {
        let kind = ValueKind::try_from(self.read_u8()?)?;
        Ok(match kind {
            ValueKind::Undefined => Value::Undefined,
            ValueKind::Number => Value::Number(self.read_f64()?),
            ValueKind::String => Value::String(self.read_str()?),
            ValueKind::Boolean => Value::Boolean(self.read_u8()? != 0),
        })
    }

    /// Fails unless every byte has been consumed.
    pub(crate) fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(DecodeError::TrailingBytes { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_roundtrip_each_kind() {
        let values = [
            Value::Undefined,
            Value::Number(-2.5),
            Value::String("héllo".to_string()),
            Value::Boolean(true),
        ];
        for value in &values {
            let mut out = Vec::new();
            write_value(&mut out, value);
            let mut reader = Reader::new(&out);
            assert_eq!(&reader.read_value().unwrap(), value);
            reader.finish().unwrap();
        }
    }

    #[test]
    fn truncated_number_reports_eof() {
        let bytes = [0x01, 0x00, 0x00];
        let mut reader = Reader::new(&bytes);
        assert_eq!(
            reader.read_value(),
            Err(DecodeError::UnexpectedEof { offset: 3 })
        );
    }

    #[test]
    fn oversized_string_length_reports_eof() {
        let bytes = [0x02, 0xFF, 0xFF, 0xFF, 0xFF, b'a'];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_value(),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let bytes = [0x02, 0x01, 0x00, 0x00, 0x00, 0xFF];
        let mut reader = Reader::new(&bytes);
        assert_eq!(
            reader.read_value(),
            Err(DecodeError::InvalidUtf8 { offset: 5 })
        );
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let bytes = [0x00, 0x00];
        let mut reader = Reader::new(&bytes);
        reader.read_u8().unwrap();
        assert_eq!(reader.finish(), Err(DecodeError::TrailingBytes { count: 1 }));
    }
}
