//! State-machine CBOR reader.
//!
//! The reader keeps a push-down stack of container frames so that nested
//! arrays, maps and indefinite-length strings can all be decoded by a single
//! cursor walking forward over the input. [`Reader::peek_state`] resolves
//! what the next data item looks like without consuming it; every `read_*`
//! method then consumes exactly one data item (which, for containers, means
//! everything up to and including the matching close).

use num_bigint::BigInt;

use crate::buffer::ByteBuffer;
use crate::error::{CborError, Result};

const BREAK: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    Array,
    Map,
    ByteStringChunks,
    TextStringChunks,
    Root,
}

/// Observable decoder state, as returned by [`Reader::peek_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeekState {
    UnsignedInteger,
    NegativeInteger,
    ByteString,
    StartIndefiniteByteString,
    EndIndefiniteByteString,
    TextString,
    StartIndefiniteTextString,
    EndIndefiniteTextString,
    StartArray,
    EndArray,
    StartMap,
    EndMap,
    Tag,
    SimpleValue,
    Boolean,
    Null,
    Undefined,
    HalfFloat,
    SingleFloat,
    DoubleFloat,
    Finished,
    /// Sentinel value held in the peek cache before the first lookahead of a
    /// cursor position, or after any cursor advance.
    Sentinel,
}

#[derive(Debug, Clone)]
struct Frame {
    container_type: ContainerType,
    frame_offset: usize,
    /// -1 means indefinite length.
    definite_length: i64,
    items_read: u64,
    /// -1 outside map context.
    current_key_offset: i64,
}

impl Frame {
    fn root() -> Self {
        Frame {
            container_type: ContainerType::Root,
            frame_offset: 0,
            definite_length: -1,
            items_read: 0,
            current_key_offset: -1,
        }
    }

    fn is_closed(&self) -> bool {
        self.definite_length >= 0 && self.items_read as i64 == self.definite_length
    }
}

/// Streaming CBOR decoder over an owned input buffer.
#[derive(Debug, Clone)]
pub struct Reader {
    buffer: ByteBuffer,
    frames: Vec<Frame>,
    current_frame: Frame,
    is_tag_context: bool,
    cached_peek: Option<PeekState>,
    last_error: Option<String>,
}

fn major_and_info(byte: u8) -> (u8, u8) {
    (byte >> 5, byte & 0x1F)
}

impl Reader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let buffer = ByteBuffer::from_bytes(bytes)?;
        Ok(Reader {
            buffer,
            frames: Vec::new(),
            current_frame: Frame::root(),
            is_tag_context: false,
            cached_peek: None,
            last_error: None,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let buffer = ByteBuffer::from_hex(hex_str)?;
        Ok(Reader {
            buffer,
            frames: Vec::new(),
            current_frame: Frame::root(),
            is_tag_context: false,
            cached_peek: None,
            last_error: None,
        })
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buffer.remaining()
    }

    pub fn remainder_bytes(&self) -> &[u8] {
        self.buffer.remainder()
    }

    pub fn offset(&self) -> usize {
        self.buffer.cursor()
    }

    fn fail(&mut self, msg: impl Into<String>) -> CborError {
        let msg = msg.into();
        self.last_error = Some(msg.clone());
        CborError::Decoding(msg)
    }

    /// Moves the cursor forward and resets the peek cache, per the cursor
    /// semantics in the spec ("any advance resets the cached peek state").
    fn advance_cursor_to(&mut self, pos: usize) {
        self.buffer.set_cursor(pos);
        self.cached_peek = None;
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    // ---------------------------------------------------------------
    // Peek protocol
    // ---------------------------------------------------------------

    pub fn peek_state(&mut self) -> Result<PeekState> {
        if let Some(state) = self.cached_peek {
            return Ok(state);
        }

        let state = self.compute_peek_state()?;
        self.cached_peek = Some(state);
        Ok(state)
    }

    fn compute_peek_state(&mut self) -> Result<PeekState> {
        if self.current_frame.is_closed() {
            return Ok(match self.current_frame.container_type {
                ContainerType::Array => PeekState::EndArray,
                ContainerType::Map => PeekState::EndMap,
                _ => PeekState::Finished,
            });
        }

        if self.buffer.cursor() >= self.buffer.len() {
            return if matches!(self.current_frame.container_type, ContainerType::Root) {
                Ok(PeekState::Finished)
            } else {
                Err(self.fail("Unexpected end of buffer"))
            };
        }

        let byte = self.buffer.peek_byte()?;

        if byte == BREAK {
            if self.current_frame.definite_length != -1 {
                return Err(self.fail("Not at end of indefinite length data item"));
            }
            if self.is_tag_context {
                return Err(self.fail("Tag not followed by value"));
            }

            return match self.current_frame.container_type {
                ContainerType::Array => Ok(PeekState::EndArray),
                ContainerType::Map => {
                    if self.current_frame.items_read % 2 != 0 {
                        return Err(self.fail("Key missing value"));
                    }
                    Ok(PeekState::EndMap)
                }
                ContainerType::ByteStringChunks => Ok(PeekState::EndIndefiniteByteString),
                ContainerType::TextStringChunks => Ok(PeekState::EndIndefiniteTextString),
                ContainerType::Root => Err(self.fail("Unexpected break byte at top level")),
            };
        }

        let (major, info) = major_and_info(byte);

        if matches!(
            self.current_frame.container_type,
            ContainerType::ByteStringChunks | ContainerType::TextStringChunks
        ) {
            let expected_major = if self.current_frame.container_type
                == ContainerType::ByteStringChunks
            {
                2
            } else {
                3
            };

            if major != expected_major || info == 31 {
                return Err(self.fail("Indefinite length string contains invalid data item"));
            }
        }

        match major {
            0 => Ok(PeekState::UnsignedInteger),
            1 => Ok(PeekState::NegativeInteger),
            2 => Ok(if info == 31 {
                PeekState::StartIndefiniteByteString
            } else {
                PeekState::ByteString
            }),
            3 => Ok(if info == 31 {
                PeekState::StartIndefiniteTextString
            } else {
                PeekState::TextString
            }),
            4 => Ok(PeekState::StartArray),
            5 => Ok(PeekState::StartMap),
            6 => Ok(PeekState::Tag),
            7 => match info {
                20 | 21 => Ok(PeekState::Boolean),
                22 => Ok(PeekState::Null),
                23 => Ok(PeekState::Undefined),
                25 => Ok(PeekState::HalfFloat),
                26 => Ok(PeekState::SingleFloat),
                27 => Ok(PeekState::DoubleFloat),
                0..=19 | 24 => Ok(PeekState::SimpleValue),
                _ => Err(self.fail("Reserved additional information value")),
            },
            _ => unreachable!("major type is masked to 3 bits"),
        }
    }

    // ---------------------------------------------------------------
    // Frame bookkeeping
    // ---------------------------------------------------------------

    /// Marks one fully consumed scalar item in the current frame: clears the
    /// tag context and bumps the item counter. Containers bump their
    /// enclosing frame's counter only when they close (see
    /// [`Reader::pop_frame`]), since the open/close pair is one logical
    /// element to the outer frame.
    fn complete_scalar(&mut self) {
        self.is_tag_context = false;
        self.current_frame.items_read += 1;
    }

    fn push_frame(&mut self, container_type: ContainerType, definite_length: i64) {
        self.is_tag_context = false;
        let frame_offset = self.buffer.cursor();
        let outer = std::mem::replace(
            &mut self.current_frame,
            Frame {
                container_type,
                frame_offset,
                definite_length,
                items_read: 0,
                current_key_offset: -1,
            },
        );
        self.frames.push(outer);
    }

    fn pop_frame(&mut self) -> Result<()> {
        let outer = self
            .frames
            .pop()
            .ok_or_else(|| CborError::decoding("frame stack underflow"))?;
        self.current_frame = outer;
        self.complete_scalar();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Initial byte consumption
    // ---------------------------------------------------------------

    /// Guards the direct (non-`peek_state`-routed) scalar readers against
    /// reading past a frame whose declared item count is already met.
    fn check_not_closed(&mut self) -> Result<()> {
        if self.current_frame.is_closed() {
            return Err(self.fail("attempted to read past end of container"));
        }
        Ok(())
    }

    fn expect_major(&mut self, expected: u8) -> Result<u8> {
        self.check_not_closed()?;
        let byte = self.buffer.peek_byte()?;
        let (major, info) = major_and_info(byte);
        if major != expected {
            return Err(self.fail(format!(
                "Major type mismatch: expected {expected}, got {major}"
            )));
        }
        self.advance_cursor_to(self.buffer.cursor() + 1);
        Ok(info)
    }

    fn read_length_field(&mut self, info: u8) -> Result<Option<u64>> {
        match info {
            0..=23 => Ok(Some(info as u64)),
            24 => Ok(Some(self.buffer.read_u8()? as u64)),
            25 => Ok(Some(self.buffer.read_u16_be()? as u64)),
            26 => Ok(Some(self.buffer.read_u32_be()? as u64)),
            27 => Ok(Some(self.buffer.read_u64_be()?)),
            31 => Ok(None),
            _ => Err(self.fail("Reserved additional information value")),
        }
    }

    // ---------------------------------------------------------------
    // Data item operations
    // ---------------------------------------------------------------

    pub fn read_uint(&mut self) -> Result<u64> {
        let byte = self.buffer.peek_byte()?;
        let (major, _) = major_and_info(byte);
        if major == 1 {
            return Err(self.fail("Integer overflow"));
        }

        let info = self.expect_major(0)?;
        let v = self
            .read_length_field(info)?
            .ok_or_else(|| self.fail("Indefinite length not allowed for integers"))?;
        self.cached_peek = None;
        self.complete_scalar();
        Ok(v)
    }

    pub fn read_int(&mut self) -> Result<i64> {
        self.check_not_closed()?;
        let byte = self.buffer.peek_byte()?;
        let (major, info) = major_and_info(byte);
        match major {
            0 => Ok(self.read_uint()? as i64),
            1 => {
                self.advance_cursor_to(self.buffer.cursor() + 1);
                let v = self
                    .read_length_field(info)?
                    .ok_or_else(|| self.fail("Indefinite length not allowed for integers"))?;
                self.cached_peek = None;
                self.complete_scalar();
                if v > i64::MAX as u64 {
                    return Err(self.fail("Integer overflow"));
                }
                Ok(-1 - v as i64)
            }
            _ => Err(self.fail(format!("Major type mismatch: expected 0 or 1, got {major}"))),
        }
    }

    pub fn read_bignum(&mut self) -> Result<BigInt> {
        let tag = self.read_tag()?;
        let bytes = self.read_bytestring()?;
        let magnitude = BigInt::from_bytes_be(num_bigint::Sign::Plus, &bytes);
        match tag {
            2 => Ok(magnitude),
            3 => Ok(-BigInt::from(1) - magnitude),
            _ => Err(self.fail(format!("Expected bignum tag 2 or 3, got {tag}"))),
        }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let info = self.expect_major(7)?;
        let result = match info {
            20 => false,
            21 => true,
            _ => return Err(self.fail("Major type mismatch: expected boolean")),
        };
        self.cached_peek = None;
        self.complete_scalar();
        Ok(result)
    }

    pub fn read_null(&mut self) -> Result<()> {
        let info = self.expect_major(7)?;
        if info != 22 {
            return Err(self.fail("Major type mismatch: expected null"));
        }
        self.cached_peek = None;
        self.complete_scalar();
        Ok(())
    }

    pub fn read_undefined(&mut self) -> Result<()> {
        let info = self.expect_major(7)?;
        if info != 23 {
            return Err(self.fail("Major type mismatch: expected undefined"));
        }
        self.cached_peek = None;
        self.complete_scalar();
        Ok(())
    }

    pub fn read_simple_value(&mut self) -> Result<u8> {
        let info = self.expect_major(7)?;
        let result = match info {
            0..=19 => info,
            24 => self.buffer.read_u8()?,
            _ => return Err(self.fail("Major type mismatch: expected simple value")),
        };
        self.cached_peek = None;
        self.complete_scalar();
        Ok(result)
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let info = self.expect_major(7)?;
        let result = match info {
            25 => {
                let bits = self.buffer.read_u16_be()?;
                decode_half_float(bits)
            }
            26 => {
                let bits = self.buffer.read_u32_be()?;
                f32::from_bits(bits) as f64
            }
            27 => {
                let bits = self.buffer.read_u64_be()?;
                f64::from_bits(bits)
            }
            _ => return Err(self.fail("Major type mismatch: expected float")),
        };
        self.cached_peek = None;
        self.complete_scalar();
        Ok(result)
    }

    pub fn read_bytestring(&mut self) -> Result<Vec<u8>> {
        match self.peek_state()? {
            PeekState::ByteString => {
                let info = self.expect_major(2)?;
                let len = self
                    .read_length_field(info)?
                    .expect("definite length guaranteed by peek_state");
                let bytes = self.buffer.read_bytes(len as usize)?.to_vec();
                self.cached_peek = None;
                self.complete_scalar();
                Ok(bytes)
            }
            PeekState::StartIndefiniteByteString => {
                self.expect_major(2)?;
                self.push_frame(ContainerType::ByteStringChunks, -1);
                let mut out = Vec::new();
                loop {
                    match self.peek_state()? {
                        PeekState::EndIndefiniteByteString => {
                            self.read_break()?;
                            break;
                        }
                        PeekState::ByteString => {
                            let info = self.expect_major(2)?;
                            let len = self
                                .read_length_field(info)?
                                .ok_or_else(|| self.fail("Indefinite chunk inside chunk frame"))?;
                            let chunk = self.buffer.read_bytes(len as usize)?;
                            out.extend_from_slice(chunk);
                            self.cached_peek = None;
                            self.complete_scalar();
                        }
                        _ => {
                            return Err(
                                self.fail("Indefinite length string contains invalid data item")
                            )
                        }
                    }
                }
                Ok(out)
            }
            _ => Err(self.fail("Major type mismatch: expected byte string")),
        }
    }

    pub fn read_textstring(&mut self) -> Result<String> {
        match self.peek_state()? {
            PeekState::TextString => {
                let info = self.expect_major(3)?;
                let len = self
                    .read_length_field(info)?
                    .expect("definite length guaranteed by peek_state");
                let bytes = self.buffer.read_bytes(len as usize)?.to_vec();
                self.cached_peek = None;
                self.complete_scalar();
                String::from_utf8(bytes).map_err(|e| self.fail(format!("invalid utf-8: {e}")))
            }
            PeekState::StartIndefiniteTextString => {
                self.expect_major(3)?;
                self.push_frame(ContainerType::TextStringChunks, -1);
                let mut out = String::new();
                loop {
                    match self.peek_state()? {
                        PeekState::EndIndefiniteTextString => {
                            self.read_break()?;
                            break;
                        }
                        PeekState::TextString => {
                            let info = self.expect_major(3)?;
                            let len = self
                                .read_length_field(info)?
                                .ok_or_else(|| self.fail("Indefinite chunk inside chunk frame"))?;
                            let bytes = self.buffer.read_bytes(len as usize)?;
                            let chunk = std::str::from_utf8(bytes)
                                .map_err(|e| CborError::decoding(format!("invalid utf-8: {e}")))?;
                            out.push_str(chunk);
                            self.cached_peek = None;
                            self.complete_scalar();
                        }
                        _ => {
                            return Err(
                                self.fail("Indefinite length string contains invalid data item")
                            )
                        }
                    }
                }
                Ok(out)
            }
            _ => Err(self.fail("Major type mismatch: expected text string")),
        }
    }

    fn read_break(&mut self) -> Result<()> {
        let byte = self.buffer.peek_byte()?;
        if byte != BREAK {
            return Err(self.fail("Not at end of indefinite length data item"));
        }
        self.advance_cursor_to(self.buffer.cursor() + 1);
        self.pop_frame()
    }

    /// Returns the declared length (or -1 if indefinite) and enters the
    /// array's frame.
    pub fn read_start_array(&mut self) -> Result<i64> {
        let info = self.expect_major(4)?;
        match self.read_length_field(info)? {
            Some(n) => {
                let n = n as i64;
                self.push_frame(ContainerType::Array, n);
                Ok(n)
            }
            None => {
                self.push_frame(ContainerType::Array, -1);
                Ok(-1)
            }
        }
    }

    pub fn read_end_array(&mut self) -> Result<()> {
        if self.current_frame.container_type != ContainerType::Array {
            return Err(self.fail("not inside an array frame"));
        }
        if self.is_tag_context {
            return Err(self.fail("Tag not followed by value"));
        }

        if self.current_frame.definite_length >= 0 {
            if self.current_frame.items_read as i64 != self.current_frame.definite_length {
                return Err(self.fail("array not fully consumed"));
            }
            self.pop_frame()
        } else {
            self.read_break()
        }
    }

    /// Returns the declared number of key/value pairs (or -1 if indefinite)
    /// and enters the map's frame. Internally the frame target is doubled
    /// since `items_read` counts keys and values individually.
    pub fn read_start_map(&mut self) -> Result<i64> {
        let info = self.expect_major(5)?;
        match self.read_length_field(info)? {
            Some(n) => {
                let pairs = n as i64;
                self.push_frame(ContainerType::Map, pairs * 2);
                self.current_frame.current_key_offset = self.buffer.cursor() as i64;
                Ok(pairs)
            }
            None => {
                self.push_frame(ContainerType::Map, -1);
                self.current_frame.current_key_offset = self.buffer.cursor() as i64;
                Ok(-1)
            }
        }
    }

    pub fn read_end_map(&mut self) -> Result<()> {
        if self.current_frame.container_type != ContainerType::Map {
            return Err(self.fail("not inside a map frame"));
        }
        if self.is_tag_context {
            return Err(self.fail("Tag not followed by value"));
        }

        if self.current_frame.definite_length >= 0 {
            if self.current_frame.items_read as i64 != self.current_frame.definite_length {
                return Err(self.fail("Key missing value"));
            }
            self.pop_frame()
        } else {
            if self.current_frame.items_read % 2 != 0 {
                return Err(self.fail("Key missing value"));
            }
            self.read_break()
        }
    }

    pub fn read_tag(&mut self) -> Result<u64> {
        let info = self.expect_major(6)?;
        let v = self
            .read_length_field(info)?
            .ok_or_else(|| self.fail("Indefinite length not allowed for tags"))?;
        self.cached_peek = None;
        self.is_tag_context = true;
        Ok(v)
    }

    /// Peeks the tag value without consuming it or entering tag context.
    /// Implemented via a savepoint so the original cursor is untouched.
    pub fn peek_tag(&self) -> Result<u64> {
        let mut probe = self.clone();
        probe.last_error = None;
        probe.read_tag()
    }

    /// Advances past exactly one complete data item using a depth counter
    /// and the primitive operations above. A tag is not itself a complete
    /// item, so the value it annotates is skipped immediately after.
    pub fn skip_value(&mut self) -> Result<()> {
        match self.peek_state()? {
            PeekState::UnsignedInteger => {
                self.read_uint()?;
            }
            PeekState::NegativeInteger => {
                self.read_int()?;
            }
            PeekState::ByteString | PeekState::StartIndefiniteByteString => {
                self.read_bytestring()?;
            }
            PeekState::TextString | PeekState::StartIndefiniteTextString => {
                self.read_textstring()?;
            }
            PeekState::Boolean => {
                self.read_bool()?;
            }
            PeekState::Null => {
                self.read_null()?;
            }
            PeekState::Undefined => {
                self.read_undefined()?;
            }
            PeekState::SimpleValue => {
                self.read_simple_value()?;
            }
            PeekState::HalfFloat | PeekState::SingleFloat | PeekState::DoubleFloat => {
                self.read_double()?;
            }
            PeekState::Tag => {
                self.read_tag()?;
                self.skip_value()?;
            }
            PeekState::StartArray => {
                self.read_start_array()?;
                loop {
                    match self.peek_state()? {
                        PeekState::EndArray => break,
                        _ => self.skip_value()?,
                    }
                }
                self.read_end_array()?;
            }
            PeekState::StartMap => {
                self.read_start_map()?;
                loop {
                    match self.peek_state()? {
                        PeekState::EndMap => break,
                        _ => self.skip_value()?,
                    }
                }
                self.read_end_map()?;
            }
            other => return Err(self.fail(format!("cannot skip state {other:?}"))),
        }
        Ok(())
    }

    /// Same traversal as [`Reader::skip_value`] but also returns the
    /// consumed byte range, used to populate the CBOR cache of domain
    /// objects.
    pub fn read_encoded_value(&mut self) -> Result<Vec<u8>> {
        let start = self.buffer.cursor();
        self.skip_value()?;
        let end = self.buffer.cursor();
        Ok(self.buffer.slice(start, end)?.to_vec())
    }
}

/// Decodes an IEEE-754 half-precision float per RFC 8949 §3.3.
pub fn decode_half_float(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = ((bits >> 10) & 0x1F) as i32;
    let mantissa = (bits & 0x3FF) as f64;

    if exp == 0 {
        sign * mantissa * 2f64.powi(-24)
    } else if exp == 31 {
        if mantissa == 0.0 {
            sign * f64::INFINITY
        } else {
            f64::NAN
        }
    } else {
        sign * (mantissa + 1024.0) * 2f64.powi(exp - 25)
    }
}

/// Encodes `value` as an IEEE-754 half-precision float if it round-trips
/// exactly, returning `None` otherwise.
pub fn encode_half_float(value: f64) -> Option<u16> {
    if value.is_nan() {
        return Some(0x7E00);
    }
    if value.is_infinite() {
        return Some(if value > 0.0 { 0x7C00 } else { 0xFC00 });
    }

    let bits = (value as f32).to_bits();
    let sign = (bits >> 31) & 1;
    let exp = ((bits >> 23) & 0xFF) as i32 - 127 + 15;
    let mantissa = bits & 0x007F_FFFF;

    // Only representable exactly when the mantissa fits without rounding
    // and the exponent is in half-float range.
    if mantissa & 0x1FFF != 0 || !(1..=30).contains(&exp) {
        return None;
    }

    let half_mantissa = (mantissa >> 13) as u16;
    let half = ((sign as u16) << 15) | ((exp as u16) << 10) | half_mantissa;

    if decode_half_float(half) == value {
        Some(half)
    } else {
        None
    }
}
