//! Cryptographic interfaces used by the ledger binding layer.
//!
//! This crate deliberately stays thin: it owns the one primitive the CBOR
//! cache identity scheme actually needs (Blake2b hashing, via [`hash`]) and
//! opaque fixed-size containers for Ed25519 material (via [`keys`]). Actual
//! signing, verification, key derivation and bignum arithmetic are treated
//! as external collaborators per the specification and are not implemented
//! here; `num-bigint` is used directly by `cardano-cbor` for the tag 2/3
//! bignum codec instead of being wrapped again in this crate.

pub mod hash;
pub mod keys;

pub use hash::{Hash, Hasher};
pub use keys::{Ed25519PublicKey, Ed25519Signature};
