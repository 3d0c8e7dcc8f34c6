//! Byte cursor and sink for the BERT wire format.
//!
//! All multi-byte integers on the wire are unsigned big-endian.

use std::io;

use crate::error::DecodeError;

// =============================================================================
// READING
// =============================================================================

/// Sequential cursor over input bytes.
///
/// Supports look-ahead without consuming, used for tag dispatch before
/// committing to a parse path. Reading past the end of input is always an
/// error; there is no truncation or zero-fill.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader over a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek_byte(&self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        Ok(self.data[self.pos])
    }

    /// Returns the next n bytes without consuming them.
    pub fn peek_bytes(&self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads an unsigned big-endian u16.
    #[inline]
    pub fn read_u16_be(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2, context)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads an unsigned big-endian u32.
    #[inline]
    pub fn read_u32_be(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4, context)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

// =============================================================================
// WRITING
// =============================================================================

/// Append-only buffered output sink.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned big-endian u16.
    #[inline]
    pub fn write_u16_be(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes an unsigned big-endian u32.
    #[inline]
    pub fn write_u32_be(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Flushes the accumulated bytes to a destination.
    pub fn write_to<W: io::Write>(&self, dest: &mut W) -> io::Result<()> {
        dest.write_all(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.peek_byte("test").unwrap(), 1);
        assert_eq!(reader.peek_byte("test").unwrap(), 1);
        assert_eq!(reader.peek_bytes(2, "test").unwrap(), &[1, 2]);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_byte("test").unwrap(), 1);
        assert_eq!(reader.peek_byte("test").unwrap(), 2);
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_fixed_width_big_endian() {
        let data = [0x12u8, 0x34, 0x56, 0x78, 0x9A, 0xBC];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_u16_be("test").unwrap(), 0x1234);
        assert_eq!(reader.read_u32_be("test").unwrap(), 0x5678_9ABC);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_past_end_fails() {
        let data = [0u8; 3];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_bytes(4, "test"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
        // A failed read consumes nothing.
        assert_eq!(reader.remaining_len(), 3);
        assert!(reader.read_bytes(3, "test").is_ok());
        assert!(matches!(
            reader.read_byte("test"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_writer_roundtrip() {
        let mut writer = Writer::new();
        writer.write_byte(0xFF);
        writer.write_u16_be(0x0102);
        writer.write_u32_be(0x03040506);
        writer.write_bytes(b"xy");
        assert_eq!(writer.len(), 9);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_byte("test").unwrap(), 0xFF);
        assert_eq!(reader.read_u16_be("test").unwrap(), 0x0102);
        assert_eq!(reader.read_u32_be("test").unwrap(), 0x03040506);
        assert_eq!(reader.read_bytes(2, "test").unwrap(), b"xy");
    }

    #[test]
    fn test_write_to_destination() {
        let mut writer = Writer::with_capacity(4);
        writer.write_bytes(&[9, 8, 7]);
        let mut out = Vec::new();
        writer.write_to(&mut out).unwrap();
        assert_eq!(out, vec![9, 8, 7]);
        assert_eq!(writer.into_bytes(), vec![9, 8, 7]);
    }
}
