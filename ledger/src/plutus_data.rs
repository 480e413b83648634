//! `plutus_data`, the opaque-to-this-crate tree Plutus scripts exchange as
//! datums and redeemers: constructors, maps, big integers and byte strings,
//! nested arbitrarily.

use crate::{Fragment, LedgerError, Reader, Result, Writer};

/// `plutus_data = constr<plutus_data> / { * plutus_data => plutus_data } /
/// big_int / bounded_bytes / [ * plutus_data ]`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum PlutusData {
    Constr(Constr<PlutusData>),
    Map(Vec<(PlutusData, PlutusData)>),
    BigInt(BigInt),
    BoundedBytes(BoundedBytes),
    Array(Vec<PlutusData>),
}

impl Fragment for PlutusData {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::Tag => {
                let tag = reader.peek_tag()?;
                match tag {
                    2 | 3 => Ok(Self::BigInt(BigInt::from_cbor(reader)?)),
                    121..=127 | 1280..=1400 | 102 => Ok(Self::Constr(Constr::from_cbor(reader)?)),
                    other => Err(LedgerError::invalid_argument(format!(
                        "unsupported tag {other} for plutus data"
                    ))),
                }
            }
            cardano_cbor::PeekState::UnsignedInteger | cardano_cbor::PeekState::NegativeInteger => {
                Ok(Self::BigInt(BigInt::from_cbor(reader)?))
            }
            cardano_cbor::PeekState::StartMap => Ok(Self::Map(decode_pairs(reader)?)),
            cardano_cbor::PeekState::ByteString | cardano_cbor::PeekState::StartIndefiniteByteString => {
                Ok(Self::BoundedBytes(BoundedBytes::from_cbor(reader)?))
            }
            cardano_cbor::PeekState::StartArray => Ok(Self::Array(decode_list(reader)?)),
            other => Err(LedgerError::invalid_argument(format!(
                "unexpected cbor shape {other:?} for plutus data"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Constr(c) => c.to_cbor(writer),
            Self::Map(pairs) => {
                writer.write_start_map(pairs.len() as u64);
                for (k, v) in pairs {
                    k.to_cbor(writer)?;
                    v.to_cbor(writer)?;
                }
                writer.write_end_map();
                Ok(())
            }
            Self::BigInt(b) => b.to_cbor(writer),
            Self::BoundedBytes(b) => b.to_cbor(writer),
            Self::Array(items) => encode_list(writer, items),
        }
    }
}

fn decode_pairs(reader: &mut Reader) -> Result<Vec<(PlutusData, PlutusData)>> {
    let len = reader.read_start_map()?;
    let mut pairs = Vec::new();
    if len >= 0 {
        for _ in 0..len {
            let k = PlutusData::from_cbor(reader)?;
            let v = PlutusData::from_cbor(reader)?;
            pairs.push((k, v));
        }
    } else {
        while reader.peek_state()? != cardano_cbor::PeekState::EndMap {
            let k = PlutusData::from_cbor(reader)?;
            let v = PlutusData::from_cbor(reader)?;
            pairs.push((k, v));
        }
    }
    reader.read_end_map()?;
    Ok(pairs)
}

fn decode_list(reader: &mut Reader) -> Result<Vec<PlutusData>> {
    let len = reader.read_start_array()?;
    let mut items = Vec::new();
    if len >= 0 {
        for _ in 0..len {
            items.push(PlutusData::from_cbor(reader)?);
        }
    } else {
        while reader.peek_state()? != cardano_cbor::PeekState::EndArray {
            items.push(PlutusData::from_cbor(reader)?);
        }
    }
    reader.read_end_array()?;
    Ok(items)
}

/// Definite 0-length array for an empty list, indefinite otherwise — mirrors
/// the default list encoding the wider Cardano ecosystem produces for Plutus
/// data specifically (as opposed to the definite framing used elsewhere in
/// this crate).
fn encode_list(writer: &mut Writer, items: &[PlutusData]) -> Result<()> {
    if items.is_empty() {
        writer.write_start_array(0);
        writer.write_end_array();
    } else {
        writer.write_start_array_indefinite();
        for item in items {
            item.to_cbor(writer)?;
        }
        writer.write_break();
    }
    Ok(())
}

/// `big_int = int / big_uint / big_nint`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum BigInt {
    Int(i64),
    BigUInt(BoundedBytes),
    BigNInt(BoundedBytes),
}

impl Fragment for BigInt {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::UnsignedInteger | cardano_cbor::PeekState::NegativeInteger => {
                Ok(Self::Int(reader.read_int()?))
            }
            cardano_cbor::PeekState::Tag => match reader.peek_tag()? {
                2 => {
                    reader.read_tag()?;
                    Ok(Self::BigUInt(BoundedBytes::from_cbor(reader)?))
                }
                3 => {
                    reader.read_tag()?;
                    Ok(Self::BigNInt(BoundedBytes::from_cbor(reader)?))
                }
                other => Err(LedgerError::invalid_argument(format!(
                    "expected bignum tag 2 or 3, got {other}"
                ))),
            },
            other => Err(LedgerError::invalid_argument(format!(
                "unexpected cbor shape {other:?} for big_int"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Int(v) => {
                writer.write_int(*v);
                Ok(())
            }
            Self::BigUInt(bytes) => {
                writer.write_tag(2);
                bytes.to_cbor(writer)
            }
            Self::BigNInt(bytes) => {
                writer.write_tag(3);
                bytes.to_cbor(writer)
            }
        }
    }
}

/// `constr<a> = #6.121([* a]) / ... / #6.127([* a]) / #6.1280([* a]) / ...
/// / #6.1400([* a]) / #6.102([uint, [* a]])`
///
/// Constructor tags 0..6 map directly to 121..127; beyond that, tags 7..127
/// map to 1280..1400; anything past that range falls back to the
/// general-purpose tag 102 form, which carries the constructor index
/// explicitly instead of folding it into the tag number.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Constr<A> {
    pub tag: u64,
    pub any_constructor: Option<u64>,
    pub fields: Vec<A>,
}

impl Fragment for Constr<PlutusData> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_tag()?;
        match tag {
            121..=127 | 1280..=1400 => Ok(Constr {
                tag,
                any_constructor: None,
                fields: decode_list(reader)?,
            }),
            102 => {
                cardano_cbor::validate_array_of_n_elements("Constr", reader, 2)?;
                let any_constructor = reader.read_uint()?;
                let fields = decode_list(reader)?;
                cardano_cbor::validate_end_array("Constr", reader)?;
                Ok(Constr {
                    tag,
                    any_constructor: Some(any_constructor),
                    fields,
                })
            }
            other => Err(LedgerError::invalid_argument(format!(
                "unsupported constructor tag {other}"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_tag(self.tag);
        match self.tag {
            102 => {
                writer.write_start_array(2);
                writer.write_uint(self.any_constructor.unwrap_or(0));
                encode_list(writer, &self.fields)?;
                writer.write_end_array();
                Ok(())
            }
            _ => encode_list(writer, &self.fields),
        }
    }
}

/// A byte string, chunked into 64-byte indefinite pieces above that size —
/// the canonical Plutus-data byte encoding rule.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct BoundedBytes(Vec<u8>);

const CHUNK_SIZE: usize = 64;

impl BoundedBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for BoundedBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<BoundedBytes> for Vec<u8> {
    fn from(b: BoundedBytes) -> Self {
        b.0
    }
}

impl Fragment for BoundedBytes {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(Self(reader.read_bytestring()?))
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        if self.0.len() <= CHUNK_SIZE {
            writer.write_bytestring(&self.0);
        } else {
            writer.write_start_bytestring_indefinite();
            for chunk in self.0.chunks(CHUNK_SIZE) {
                writer.write_bytestring(chunk);
            }
            writer.write_break();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_int_round_trips() {
        let original = PlutusData::BigInt(BigInt::Int(-42));
        let bytes = original.encode_fragment().unwrap();
        let decoded = PlutusData::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn empty_array_encodes_as_definite() {
        let bytes = PlutusData::Array(vec![]).encode_fragment().unwrap();
        assert_eq!(bytes, vec![0x80]);
    }

    #[test]
    fn nonempty_array_round_trips_through_indefinite_framing() {
        let original = PlutusData::Array(vec![PlutusData::BigInt(BigInt::Int(1))]);
        let bytes = original.encode_fragment().unwrap();
        assert_eq!(bytes[0], 0x9F);
        assert_eq!(*bytes.last().unwrap(), 0xFF);
        let decoded = PlutusData::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn constr_zero_uses_tag_121() {
        let original = PlutusData::Constr(Constr {
            tag: 121,
            any_constructor: None,
            fields: vec![PlutusData::BigInt(BigInt::Int(7))],
        });
        let bytes = original.encode_fragment().unwrap();
        let decoded = PlutusData::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn bounded_bytes_chunks_above_64_bytes() {
        let long = BoundedBytes::from(vec![7u8; 100]);
        let bytes = long.encode_fragment().unwrap();
        assert_eq!(bytes[0], 0x5F);
        let decoded = BoundedBytes::decode_fragment(&bytes).unwrap();
        assert_eq!(decoded, long);
    }
}
