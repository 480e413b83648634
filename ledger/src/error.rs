//! Domain-level error kinds layered on top of the wire-level [`cardano_cbor::CborError`].

use cardano_cbor::CborError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Cbor(#[from] CborError),

    #[error("invalid certificate type: {0}")]
    InvalidCertificateType(u64),

    #[error("invalid native script type: {0}")]
    InvalidNativeScriptType(u64),

    #[error("invalid governance action type: {0}")]
    InvalidGovActionType(u64),

    #[error("invalid voter type: {0}")]
    InvalidVoterType(u64),

    #[error("invalid relay type: {0}")]
    InvalidRelayType(u64),

    #[error("invalid cbor map key: {0}")]
    InvalidCborMapKey(u64),

    #[error("duplicated cbor map key: {0}")]
    DuplicatedCborMapKey(u64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    #[error("invalid json: {0}")]
    InvalidJson(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn element_not_found(msg: impl Into<String>) -> Self {
        Self::ElementNotFound(msg.into())
    }
}
