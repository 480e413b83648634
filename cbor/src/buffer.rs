use crate::error::{CborError, Result};

/// Owned, growable byte store with a read cursor used only by the streaming
/// primitives in [`crate::reader`] and [`crate::writer`].
///
/// Invariant: `cursor <= data.len()` always holds; every primitive that would
/// break it fails with [`CborError::Decoding`] instead of panicking.
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        ByteBuffer {
            data: Vec::new(),
            cursor: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CborError::PointerIsNull);
        }

        Ok(ByteBuffer {
            data: bytes.to_vec(),
            cursor: 0,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.is_empty() {
            return Err(CborError::PointerIsNull);
        }

        let bytes =
            hex::decode(hex_str).map_err(|e| CborError::decoding(format!("invalid hex: {e}")))?;

        Self::from_bytes(&bytes)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn remainder(&self) -> &[u8] {
        &self.data[self.cursor.min(self.data.len())..]
    }

    pub fn slice(&self, start: usize, end: usize) -> Result<&[u8]> {
        self.data
            .get(start..end)
            .ok_or_else(|| CborError::decoding("slice out of bounds"))
    }

    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.cursor)
            .copied()
            .ok_or_else(|| CborError::decoding("Unexpected end of buffer"))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek_byte()?;
        self.cursor += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        let end = self
            .cursor
            .checked_add(n)
            .ok_or_else(|| CborError::decoding("Unexpected end of buffer"))?;

        if end > self.data.len() {
            return Err(CborError::decoding("Unexpected end of buffer"));
        }

        let slice = &self.data[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn push_u8(&mut self, b: u8) {
        self.data.push(b);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn push_u16_be(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_u32_be(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_u64_be(&mut self, v: u64) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }
}
