//! Domain binding layer mapping Cardano ledger entities to and from canonical CBOR.
//!
//! The state-machine reader/writer pair lives in `cardano_cbor`; this crate owns
//! the ~200 tagged entity types (certificates, scripts, witnesses, governance
//! actions, protocol parameters, transactions) that ride on top of it, plus the
//! sorted-container and CBOR-cache helpers that give those entities canonical,
//! byte-exact round-tripping.

pub mod cache;
pub mod certificates;
pub mod collections;
pub mod error;
pub mod governance;
pub mod plutus_data;
pub mod protocol_params;
pub mod scripts;
pub mod time;
pub mod transaction;
pub mod witnesses;

pub use cardano_cbor::{Reader, Writer};
pub use cardano_crypto_iface::{Ed25519PublicKey, Ed25519Signature, Hash, Hasher};
pub use error::{LedgerError, Result};

pub use cache::{CborCache, WithCborCache};
pub use collections::{SortedMap, SortedSet};

/// The domain-level analogue of `cardano_cbor::Fragment`: decoders here return
/// the richer [`LedgerError`] (invalid discriminants, JSON ingest failures,
/// lookups) instead of the wire-level `CborError` alone.
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

impl<T: cardano_cbor::Fragment> Fragment for T {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(<T as cardano_cbor::Fragment>::from_cbor(reader)?)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        Ok(<T as cardano_cbor::Fragment>::to_cbor(self, writer)?)
    }
}

macro_rules! uint_fragment {
    ($ty:ty) => {
        impl Fragment for $ty {
            fn from_cbor(reader: &mut Reader) -> Result<Self> {
                Ok(reader.read_uint()? as $ty)
            }

            fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
                writer.write_uint(*self as u64);
                Ok(())
            }
        }
    };
}

uint_fragment!(u64);
uint_fragment!(u32);
uint_fragment!(u16);
uint_fragment!(u8);

impl Fragment for i64 {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(reader.read_int()?)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_int(*self);
        Ok(())
    }
}

impl Fragment for bool {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(reader.read_bool()?)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_bool(*self);
        Ok(())
    }
}

impl Fragment for Vec<u8> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(reader.read_bytestring()?)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_bytestring(self);
        Ok(())
    }
}

impl Fragment for String {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(reader.read_textstring()?)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_textstring(self);
        Ok(())
    }
}

/// `protocol_version = [major : uint, minor : uint]`
impl Fragment for (u64, u64) {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("ProtocolVersion", reader, 2)?;
        let major = reader.read_uint()?;
        let minor = reader.read_uint()?;
        cardano_cbor::validate_end_array("ProtocolVersion", reader)?;
        Ok((major, minor))
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        writer.write_uint(self.0);
        writer.write_uint(self.1);
        writer.write_end_array();
        Ok(())
    }
}

impl<T: Fragment> Fragment for Option<T> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::Null => {
                reader.read_null()?;
                Ok(None)
            }
            _ => Ok(Some(T::from_cbor(reader)?)),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Some(value) => value.to_cbor(writer),
            None => {
                writer.write_null();
                Ok(())
            }
        }
    }
}

/// `[* int]`, used as-is by [`CostModel`] and inlined by hand wherever a
/// field needs a differently-typed definite-length array.
impl Fragment for Vec<i64> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        decode_array(reader)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        encode_array(writer, self)
    }
}

/// Reads a definite- or indefinite-length array of `T`, looping on
/// [`cardano_cbor::PeekState::EndArray`] for the indefinite case since the
/// reader only reports a length up front for definite frames.
pub(crate) fn decode_array<T: Fragment>(reader: &mut Reader) -> Result<Vec<T>> {
    let len = reader.read_start_array()?;
    let mut items = Vec::new();
    if len >= 0 {
        for _ in 0..len {
            items.push(T::from_cbor(reader)?);
        }
    } else {
        while reader.peek_state()? != cardano_cbor::PeekState::EndArray {
            items.push(T::from_cbor(reader)?);
        }
    }
    reader.read_end_array()?;
    Ok(items)
}

pub(crate) fn encode_array<T: Fragment>(writer: &mut Writer, items: &[T]) -> Result<()> {
    writer.write_start_array(items.len() as u64);
    for item in items {
        item.to_cbor(writer)?;
    }
    writer.write_end_array();
    Ok(())
}

// ----- Common scalar aliases shared across every domain module

pub type AddrKeyhash = Hash<28>;
pub type AssetName = Vec<u8>;
pub type Coin = u64;
pub type CostModel = Vec<i64>;
pub type DatumHash = Hash<32>;
pub type DnsName = String;
pub type Epoch = u64;
pub type Genesishash = Vec<u8>;
pub type GenesisDelegateHash = Vec<u8>;
pub type IPv4 = Vec<u8>;
pub type IPv6 = Vec<u8>;
pub type PolicyId = Hash<28>;
pub type PoolKeyhash = Hash<28>;
pub type PoolMetadataHash = Hash<32>;
pub type Port = u32;
pub type PositiveInterval = RationalNumber;
pub type ProtocolVersion = (u64, u64);
pub type RewardAccount = Vec<u8>;
pub type ScriptHash = Hash<28>;
pub type TransactionIndex = u32;
pub type UnitInterval = RationalNumber;
pub type VrfKeyhash = Hash<32>;

/// `ex_units = [mem : uint, steps : uint]`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

impl Fragment for ExUnits {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("ExUnits", reader, 2)?;
        let mem = reader.read_uint()?;
        let steps = reader.read_uint()?;
        cardano_cbor::validate_end_array("ExUnits", reader)?;
        Ok(Self { mem, steps })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        writer.write_uint(self.mem);
        writer.write_uint(self.steps);
        writer.write_end_array();
        Ok(())
    }
}

/// `rational_number = #6.30([numerator : uint, denominator : uint])`
///
/// Used both as-is and under the `UnitInterval`/`PositiveInterval` aliases.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RationalNumber {
    pub numerator: u64,
    pub denominator: u64,
}

impl RationalNumber {
    pub const RATIONAL_TAG: u64 = 30;

    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl Fragment for RationalNumber {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_tag()?;
        if tag != Self::RATIONAL_TAG {
            return Err(LedgerError::invalid_argument(format!(
                "expected tag 30 for rational number, got {tag}"
            )));
        }
        cardano_cbor::validate_array_of_n_elements("RationalNumber", reader, 2)?;
        let numerator = reader.read_uint()?;
        let denominator = reader.read_uint()?;
        cardano_cbor::validate_end_array("RationalNumber", reader)?;
        Ok(Self {
            numerator,
            denominator,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_tag(Self::RATIONAL_TAG);
        writer.write_start_array(2);
        writer.write_uint(self.numerator);
        writer.write_uint(self.denominator);
        writer.write_end_array();
        Ok(())
    }
}

/// `network_id = 0 ; testnet / 1 ; mainnet`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NetworkId {
    Testnet,
    Mainnet,
}

impl Fragment for NetworkId {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.read_uint()? {
            0 => Ok(Self::Testnet),
            1 => Ok(Self::Mainnet),
            other => Err(LedgerError::invalid_argument(format!(
                "invalid network id {other}"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_uint(match self {
            Self::Testnet => 0,
            Self::Mainnet => 1,
        });
        Ok(())
    }
}

/// `nonce = [0] / [1, bytes .size 32]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Nonce {
    NeutralNonce,
    Nonce(Hash<32>),
}

impl Fragment for Nonce {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        let result = match reader.read_uint()? {
            0 => Self::NeutralNonce,
            1 => Self::Nonce(Hash::<32>::from_cbor(reader)?),
            other => {
                return Err(LedgerError::invalid_argument(format!(
                    "invalid nonce variant {other}"
                )))
            }
        };
        let _ = len;
        cardano_cbor::validate_end_array("Nonce", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::NeutralNonce => {
                writer.write_start_array(1);
                writer.write_uint(0);
            }
            Self::Nonce(hash) => {
                writer.write_start_array(2);
                writer.write_uint(1);
                hash.to_cbor(writer)?;
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

/// `stake_credential = [0, addr_keyhash // 1, scripthash]`
///
/// The script-hash variant carries discriminant 0 historically in the Haskell
/// reference codebase even though the key-hash reads more naturally first; the
/// `Ord` impl derives from declaration order below, so it is kept deliberately
/// in that order to match the canonical map ordering used elsewhere.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum StakeCredential {
    ScriptHash(ScriptHash),
    AddrKeyhash(AddrKeyhash),
}

impl Fragment for StakeCredential {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("StakeCredential", reader, 2)?;
        let result = match reader.read_uint()? {
            0 => Self::AddrKeyhash(AddrKeyhash::from_cbor(reader)?),
            1 => Self::ScriptHash(ScriptHash::from_cbor(reader)?),
            other => {
                return Err(LedgerError::invalid_argument(format!(
                    "invalid stake credential variant {other}"
                )))
            }
        };
        cardano_cbor::validate_end_array("StakeCredential", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        match self {
            Self::AddrKeyhash(h) => {
                writer.write_uint(0);
                h.to_cbor(writer)?;
            }
            Self::ScriptHash(h) => {
                writer.write_uint(1);
                h.to_cbor(writer)?;
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

pub type DRepCredential = StakeCredential;
pub type CommitteeColdCredential = StakeCredential;
pub type CommitteeHotCredential = StakeCredential;

/// `relay = [single_host_addr] / [single_host_name] / [multi_host_name]`
///
/// A tagged variant that needs a peek at the inner discriminant to pick its
/// shape; the caller is expected to resolve that via a savepoint before
/// calling [`Relay::from_cbor`] (see [`crate::witnesses`] for an example of
/// the same peek-by-clone pattern applied to redeemers).
#[derive(Debug, PartialEq, Clone)]
pub enum Relay {
    SingleHostAddr {
        port: Option<Port>,
        ipv4: Option<IPv4>,
        ipv6: Option<IPv6>,
    },
    SingleHostName {
        port: Option<Port>,
        dns_name: DnsName,
    },
    MultiHostName {
        dns_name: DnsName,
    },
}

impl Fragment for Relay {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Relay::SingleHostAddr {
                port: decode_nullable_uint(reader)?,
                ipv4: decode_nullable_bytes(reader)?,
                ipv6: decode_nullable_bytes(reader)?,
            },
            1 => Relay::SingleHostName {
                port: decode_nullable_uint(reader)?,
                dns_name: reader.read_textstring()?,
            },
            2 => Relay::MultiHostName {
                dns_name: reader.read_textstring()?,
            },
            other => return Err(LedgerError::InvalidRelayType(other)),
        };
        let _ = len;
        cardano_cbor::validate_end_array("Relay", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Relay::SingleHostAddr { port, ipv4, ipv6 } => {
                writer.write_start_array(4);
                writer.write_uint(0);
                encode_nullable_uint(writer, *port);
                encode_nullable_bytes(writer, ipv4.as_deref());
                encode_nullable_bytes(writer, ipv6.as_deref());
            }
            Relay::SingleHostName { port, dns_name } => {
                writer.write_start_array(3);
                writer.write_uint(1);
                encode_nullable_uint(writer, *port);
                writer.write_textstring(dns_name);
            }
            Relay::MultiHostName { dns_name } => {
                writer.write_start_array(2);
                writer.write_uint(2);
                writer.write_textstring(dns_name);
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

fn decode_nullable_uint(reader: &mut Reader) -> Result<Option<u32>> {
    match reader.peek_state()? {
        cardano_cbor::PeekState::Null => {
            reader.read_null()?;
            Ok(None)
        }
        _ => Ok(Some(reader.read_uint()? as u32)),
    }
}

fn encode_nullable_uint(writer: &mut Writer, value: Option<u32>) {
    match value {
        Some(v) => writer.write_uint(v as u64),
        None => writer.write_null(),
    }
}

fn decode_nullable_bytes(reader: &mut Reader) -> Result<Option<Vec<u8>>> {
    match reader.peek_state()? {
        cardano_cbor::PeekState::Null => {
            reader.read_null()?;
            Ok(None)
        }
        _ => Ok(Some(reader.read_bytestring()?)),
    }
}

fn encode_nullable_bytes(writer: &mut Writer, value: Option<&[u8]>) {
    match value {
        Some(v) => writer.write_bytestring(v),
        None => writer.write_null(),
    }
}

/// `pool_metadata = [url : text, pool_metadata_hash : $hash32]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: PoolMetadataHash,
}

impl Fragment for PoolMetadata {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("PoolMetadata", reader, 2)?;
        let url = reader.read_textstring()?;
        let hash = PoolMetadataHash::from_cbor(reader)?;
        cardano_cbor::validate_end_array("PoolMetadata", reader)?;
        Ok(Self { url, hash })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        writer.write_textstring(&self.url);
        self.hash.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `transaction_input = [transaction_id : $hash32, index : uint]`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TransactionInput {
    pub transaction_id: Hash<32>,
    pub index: u64,
}

impl Fragment for TransactionInput {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("TransactionInput", reader, 2)?;
        let transaction_id = Hash::<32>::from_cbor(reader)?;
        let index = reader.read_uint()?;
        cardano_cbor::validate_end_array("TransactionInput", reader)?;
        Ok(Self {
            transaction_id,
            index,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.transaction_id.to_cbor(writer)?;
        writer.write_uint(self.index);
        writer.write_end_array();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ex_units_round_trips() {
        let original = ExUnits {
            mem: 1_000_000,
            steps: 500_000_000,
        };
        let bytes = original.encode_fragment().unwrap();
        let decoded = ExUnits::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn stake_credential_preserves_haskell_discriminant_order() {
        let key = StakeCredential::AddrKeyhash(AddrKeyhash::new([0u8; 28]));
        let script = StakeCredential::ScriptHash(ScriptHash::new([0u8; 28]));
        assert!(script < key);
    }

    #[test]
    fn rational_number_round_trips_through_tag_30() {
        let original = RationalNumber::new(3, 5);
        let bytes = original.encode_fragment().unwrap();
        assert_eq!(&bytes[0..2], &[0xD8, 0x1E]); // major 6, 1-byte payload 30
        let decoded = RationalNumber::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }
}
