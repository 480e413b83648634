use thiserror::Error;

/// Errors surfaced by the byte buffer, reader and writer.
///
/// Each decode failure carries a human readable sub-reason so callers can
/// distinguish, for example, a short read from an unexpected break byte
/// without having to match on string contents of a single catch-all variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CborError {
    #[error("pointer is null")]
    PointerIsNull,

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid cbor map key: {0}")]
    InvalidCborMapKey(String),

    #[error("duplicated cbor map key: {0}")]
    DuplicatedCborMapKey(String),

    #[error("invalid cbor array size: {0}")]
    InvalidCborArraySize(String),
}

impl CborError {
    pub fn decoding<S: Into<String>>(msg: S) -> Self {
        CborError::Decoding(msg.into())
    }

    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        CborError::Encoding(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CborError>;
