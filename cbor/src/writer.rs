//! Append-only CBOR writer.
//!
//! The writer carries no parsing state: callers are responsible for
//! balancing `start_array`/`end_array` and `start_map`/`end_map` calls and
//! for emitting map keys in canonical order. [`Writer::write_type_value`] is
//! the single routine that all the integer-shaped encodings (unsigned int,
//! negative int, lengths, tags) funnel through, always choosing the
//! narrowest additional-info width that fits the value.

use num_bigint::{BigInt, Sign};

use crate::buffer::ByteBuffer;
use crate::reader::encode_half_float;

const BREAK: u8 = 0xFF;

pub struct Writer {
    buffer: ByteBuffer,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        Writer {
            buffer: ByteBuffer::new(),
        }
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
    }

    pub fn encode(&self) -> Vec<u8> {
        self.buffer.as_slice().to_vec()
    }

    pub fn encode_into_buffer(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.buffer.as_slice());
    }

    pub fn encode_hex(&self) -> String {
        self.buffer.to_hex()
    }

    pub fn get_encode_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn get_hex_size(&self) -> usize {
        self.buffer.len() * 2
    }

    /// Writes the initial byte(s) for `major_type` carrying `value`,
    /// choosing the smallest additional-info width that fits.
    fn write_type_value(&mut self, major_type: u8, value: u64) {
        let head = major_type << 5;

        if value < 24 {
            self.buffer.push_u8(head | value as u8);
        } else if value < 256 {
            self.buffer.push_u8(head | 24);
            self.buffer.push_u8(value as u8);
        } else if value < 65536 {
            self.buffer.push_u8(head | 25);
            self.buffer.push_u16_be(value as u16);
        } else if value < (1u64 << 32) {
            self.buffer.push_u8(head | 26);
            self.buffer.push_u32_be(value as u32);
        } else {
            self.buffer.push_u8(head | 27);
            self.buffer.push_u64_be(value);
        }
    }

    pub fn write_uint(&mut self, value: u64) {
        self.write_type_value(0, value);
    }

    pub fn write_int(&mut self, value: i64) {
        if value >= 0 {
            self.write_type_value(0, value as u64);
        } else {
            self.write_type_value(1, (-1 - value) as u64);
        }
    }

    pub fn write_bytestring(&mut self, bytes: &[u8]) {
        self.write_type_value(2, bytes.len() as u64);
        self.buffer.push_bytes(bytes);
    }

    pub fn write_textstring(&mut self, text: &str) {
        self.write_type_value(3, text.len() as u64);
        self.buffer.push_bytes(text.as_bytes());
    }

    pub fn write_start_array(&mut self, len: u64) {
        self.write_type_value(4, len);
    }

    pub fn write_start_array_indefinite(&mut self) {
        self.buffer.push_u8(0x9F);
    }

    /// Opens an indefinite-length byte string; each following chunk is a
    /// definite-length byte string of major type 2, closed with
    /// [`Writer::write_break`].
    pub fn write_start_bytestring_indefinite(&mut self) {
        self.buffer.push_u8(0x5F);
    }

    pub fn write_start_map(&mut self, len: u64) {
        self.write_type_value(5, len);
    }

    pub fn write_start_map_indefinite(&mut self) {
        self.buffer.push_u8(0xBF);
    }

    /// No-op for definite-length arrays: the element count is already fixed
    /// in the header written by [`Writer::write_start_array`]. Kept so call
    /// sites can bracket their fields symmetrically; indefinite-length
    /// arrays must close with [`Writer::write_break`] instead.
    pub fn write_end_array(&mut self) {}

    /// No-op for definite-length maps; see [`Writer::write_end_array`].
    pub fn write_end_map(&mut self) {}

    /// Writes the break stop-code that terminates an indefinite-length
    /// array, map, byte string, or text string opened with the matching
    /// `*_indefinite` starter.
    pub fn write_break(&mut self) {
        self.buffer.push_u8(BREAK);
    }

    pub fn write_null(&mut self) {
        self.buffer.push_u8(0xF6);
    }

    pub fn write_undefined(&mut self) {
        self.buffer.push_u8(0xF7);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push_u8(if value { 0xF5 } else { 0xF4 });
    }

    pub fn write_tag(&mut self, tag: u64) {
        self.write_type_value(6, tag);
    }

    pub fn write_simple_value(&mut self, value: u8) {
        if value < 24 {
            self.buffer.push_u8((7 << 5) | value);
        } else {
            self.buffer.push_u8((7 << 5) | 24);
            self.buffer.push_u8(value);
        }
    }

    /// Writes the narrowest of half/single/double precision that round
    /// trips exactly, falling back to double precision.
    pub fn write_double(&mut self, value: f64) {
        if let Some(half) = encode_half_float(value) {
            self.buffer.push_u8((7 << 5) | 25);
            self.buffer.push_u16_be(half);
        } else if value as f32 as f64 == value {
            self.buffer.push_u8((7 << 5) | 26);
            self.buffer.push_u32_be((value as f32).to_bits());
        } else {
            self.buffer.push_u8((7 << 5) | 27);
            self.buffer.push_u64_be(value.to_bits());
        }
    }

    pub fn write_bignum(&mut self, value: &BigInt) {
        match value.sign() {
            Sign::Minus => {
                let magnitude = -(value + BigInt::from(1));
                let (_, bytes) = magnitude.to_bytes_be();
                self.write_tag(3);
                self.write_bytestring(&bytes);
            }
            _ => {
                let (_, bytes) = value.to_bytes_be();
                self.write_tag(2);
                self.write_bytestring(&bytes);
            }
        }
    }

    /// Passthrough of already-serialized bytes, used to emit cached raw
    /// CBOR fragments verbatim.
    pub fn write_encoded_raw(&mut self, bytes: &[u8]) {
        self.buffer.push_bytes(bytes);
    }
}
