//! Opaque, fixed-size key and signature containers.
//!
//! Actual Ed25519 signing and verification are out of scope here — the
//! domain layer only ever stores and round-trips these as byte strings of a
//! known length. Reaching for a real verifier is the caller's job.

use std::fmt;

use cardano_cbor::{CborError, Fragment, Reader, Result, Writer};

macro_rules! opaque_bytes {
    ($name:ident, $size:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; $size]);

        impl $name {
            pub const SIZE: usize = $size;

            pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
                if bytes.len() != $size {
                    return Err(CborError::decoding(format!(
                        "{}: expected {} bytes, got {}",
                        stringify!($name),
                        $size,
                        bytes.len()
                    )));
                }
                let mut inner = [0u8; $size];
                inner.copy_from_slice(bytes);
                Ok(Self(inner))
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn len(&self) -> usize {
                $size
            }

            pub fn is_empty(&self) -> bool {
                false
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&hex::encode(self.0))
                    .finish()
            }
        }

        impl Fragment for $name {
            fn from_cbor(reader: &mut Reader) -> Result<Self> {
                let bytes = reader.read_bytestring()?;
                Self::from_bytes(&bytes)
            }

            fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
                writer.write_bytestring(&self.0);
                Ok(())
            }
        }
    };
}

opaque_bytes!(
    Ed25519PublicKey,
    32,
    "An Ed25519 verification key, stored as an opaque 32-byte string."
);

opaque_bytes!(
    Ed25519Signature,
    64,
    "An Ed25519 signature, stored as an opaque 64-byte string."
);
