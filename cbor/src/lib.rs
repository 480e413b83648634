//! Streaming CBOR (RFC 8949) reader/writer tailored to Cardano's canonical
//! on-chain encodings.
//!
//! This crate is the wire-format core: a state-machine decoder with
//! push-down framing for nested containers ([`reader::Reader`]), an
//! append-only encoder ([`writer::Writer`]), and the small validation
//! helpers domain decoders lean on to express fixed-size framing tersely
//! ([`validate`]). It does not know about any particular Cardano entity —
//! that binding lives one layer up.

pub mod buffer;
pub mod error;
pub mod reader;
pub mod validate;
pub mod writer;

pub use buffer::ByteBuffer;
pub use error::{CborError, Result};
pub use reader::{PeekState, Reader};
pub use validate::{
    invalid_discriminant, validate_array_of_n_elements, validate_end_array, validate_end_map,
    validate_enum_value, validate_uint_in_range,
};
pub use writer::Writer;

/// Implemented by any type with a byte-exact CBOR binding. Mirrors the
/// `from_cbor` / `to_cbor` pair used throughout the domain layer.
pub trait Fragment: Sized {
    fn from_cbor(reader: &mut Reader) -> Result<Self>;
    fn to_cbor(&self, writer: &mut Writer) -> Result<()>;

    fn decode_fragment(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_bytes(bytes)?;
        Self::from_cbor(&mut reader)
    }

    fn encode_fragment(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        self.to_cbor(&mut writer)?;
        Ok(writer.encode())
    }
}
