//! Transaction witnesses: key signatures, bootstrap (Byron) witnesses, and
//! the dual-shape redeemer list that carries Plutus execution budgets.

use crate::{
    CborCache, Ed25519PublicKey, Ed25519Signature, ExUnits, Fragment, LedgerError, Reader, Result,
    WithCborCache, Writer,
};
use crate::plutus_data::PlutusData;
use crate::scripts::{NativeScript, PlutusV1Script, PlutusV2Script, PlutusV3Script};

/// `vkeywitness = [vkey : bytes, signature : bytes]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VKeyWitness {
    pub vkey: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

impl Fragment for VKeyWitness {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("VKeyWitness", reader, 2)?;
        let vkey = Ed25519PublicKey::from_cbor(reader)?;
        let signature = Ed25519Signature::from_cbor(reader)?;
        cardano_cbor::validate_end_array("VKeyWitness", reader)?;
        Ok(Self { vkey, signature })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.vkey.to_cbor(writer)?;
        self.signature.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `bootstrap_witness = [public_key : bytes, signature : bytes,
/// chain_code : bytes, attributes : bytes]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BootstrapWitness {
    pub public_key: Ed25519PublicKey,
    pub signature: Ed25519Signature,
    pub chain_code: Vec<u8>,
    pub attributes: Vec<u8>,
}

impl Fragment for BootstrapWitness {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("BootstrapWitness", reader, 4)?;
        let public_key = Ed25519PublicKey::from_cbor(reader)?;
        let signature = Ed25519Signature::from_cbor(reader)?;
        let chain_code = reader.read_bytestring()?;
        let attributes = reader.read_bytestring()?;
        cardano_cbor::validate_end_array("BootstrapWitness", reader)?;
        Ok(Self {
            public_key,
            signature,
            chain_code,
            attributes,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(4);
        self.public_key.to_cbor(writer)?;
        self.signature.to_cbor(writer)?;
        writer.write_bytestring(&self.chain_code);
        writer.write_bytestring(&self.attributes);
        writer.write_end_array();
        Ok(())
    }
}

/// `redeemer_tag = 0 ; spend / 1 ; mint / 2 ; cert / 3 ; reward /
/// 4 ; voting / 5 ; proposing`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum RedeemerTag {
    Spend,
    Mint,
    Cert,
    Reward,
    Voting,
    Proposing,
}

impl Fragment for RedeemerTag {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.read_uint()? {
            0 => Ok(Self::Spend),
            1 => Ok(Self::Mint),
            2 => Ok(Self::Cert),
            3 => Ok(Self::Reward),
            4 => Ok(Self::Voting),
            5 => Ok(Self::Proposing),
            other => Err(LedgerError::invalid_argument(format!(
                "invalid redeemer tag {other}"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_uint(match self {
            Self::Spend => 0,
            Self::Mint => 1,
            Self::Cert => 2,
            Self::Reward => 3,
            Self::Voting => 4,
            Self::Proposing => 5,
        });
        Ok(())
    }
}

/// `redeemer = [tag : redeemer_tag, index : uint .size 4, data :
/// plutus_data, ex_units : ex_units]`
#[derive(Debug, PartialEq, Clone)]
pub struct Redeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

impl Redeemer {
    fn key(&self) -> (RedeemerTag, u32) {
        (self.tag, self.index)
    }
}

impl Fragment for Redeemer {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("Redeemer", reader, 4)?;
        let tag = RedeemerTag::from_cbor(reader)?;
        let index = reader.read_uint()? as u32;
        let data = PlutusData::from_cbor(reader)?;
        let ex_units = ExUnits::from_cbor(reader)?;
        cardano_cbor::validate_end_array("Redeemer", reader)?;
        Ok(Self {
            tag,
            index,
            data,
            ex_units,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(4);
        self.tag.to_cbor(writer)?;
        writer.write_uint(self.index as u64);
        self.data.to_cbor(writer)?;
        self.ex_units.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `redeemers = [* redeemer] / { + [tag, index] => [data, ex_units] }`
///
/// The two wire shapes collapse to one canonical, `(tag, index)`-sorted
/// list in memory. Re-encoding always emits the map form (the form every
/// modern producer uses), unless the cached bytes from decode are still
/// valid, in which case they're reproduced verbatim per the byte-exact
/// round-trip contract.
#[derive(Debug, Clone, Default)]
pub struct Redeemers {
    items: Vec<Redeemer>,
    cache: CborCache,
}

impl PartialEq for Redeemers {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Redeemers {
    pub fn new(mut items: Vec<Redeemer>) -> Self {
        items.sort_by_key(Redeemer::key);
        Self {
            items,
            cache: CborCache::empty(),
        }
    }

    pub fn items(&self) -> &[Redeemer] {
        &self.items
    }

    pub fn push(&mut self, redeemer: Redeemer) {
        let key = redeemer.key();
        let pos = self
            .items
            .binary_search_by_key(&key, Redeemer::key)
            .unwrap_or_else(|i| i);
        self.items.insert(pos, redeemer);
        self.clear_cbor_cache();
    }
}

impl WithCborCache for Redeemers {
    fn cbor_cache(&self) -> &CborCache {
        &self.cache
    }

    fn cbor_cache_mut(&mut self) -> &mut CborCache {
        &mut self.cache
    }
}

impl Fragment for Redeemers {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let raw = reader.read_encoded_value()?;
        let mut sub = Reader::from_bytes(&raw)?;
        let mut items = match sub.peek_state()? {
            cardano_cbor::PeekState::StartArray => {
                let len = sub.read_start_array()?;
                let mut items = Vec::new();
                if len >= 0 {
                    for _ in 0..len {
                        items.push(Redeemer::from_cbor(&mut sub)?);
                    }
                } else {
                    while sub.peek_state()? != cardano_cbor::PeekState::EndArray {
                        items.push(Redeemer::from_cbor(&mut sub)?);
                    }
                }
                sub.read_end_array()?;
                items
            }
            _ => {
                let len = sub.read_start_map()?;
                let mut items = Vec::new();
                let mut read_entry = |sub: &mut Reader| -> Result<()> {
                    cardano_cbor::validate_array_of_n_elements("RedeemersKey", sub, 2)?;
                    let tag = RedeemerTag::from_cbor(sub)?;
                    let index = sub.read_uint()? as u32;
                    cardano_cbor::validate_end_array("RedeemersKey", sub)?;
                    cardano_cbor::validate_array_of_n_elements("RedeemersValue", sub, 2)?;
                    let data = PlutusData::from_cbor(sub)?;
                    let ex_units = ExUnits::from_cbor(sub)?;
                    cardano_cbor::validate_end_array("RedeemersValue", sub)?;
                    items.push(Redeemer {
                        tag,
                        index,
                        data,
                        ex_units,
                    });
                    Ok(())
                };
                if len >= 0 {
                    for _ in 0..len {
                        read_entry(&mut sub)?;
                    }
                } else {
                    while sub.peek_state()? != cardano_cbor::PeekState::EndMap {
                        read_entry(&mut sub)?;
                    }
                }
                sub.read_end_map()?;
                items
            }
        };
        items.sort_by_key(Redeemer::key);
        Ok(Self {
            items,
            cache: CborCache::from_bytes(raw),
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        if let Some(cached) = self.cbor_cache().get() {
            writer.write_encoded_raw(cached);
            return Ok(());
        }
        writer.write_start_map(self.items.len() as u64);
        for item in &self.items {
            writer.write_start_array(2);
            item.tag.to_cbor(writer)?;
            writer.write_uint(item.index as u64);
            writer.write_end_array();
            writer.write_start_array(2);
            item.data.to_cbor(writer)?;
            item.ex_units.to_cbor(writer)?;
            writer.write_end_array();
        }
        writer.write_end_map();
        Ok(())
    }
}

/// `transaction_witness_set = { ? 0 => [* vkeywitness], ? 1 =>
/// [* native_script], ? 2 => [* bootstrap_witness], ? 3 =>
/// [* plutus_v1_script], ? 4 => [* plutus_data], ? 5 => redeemers,
/// ? 6 => [* plutus_v2_script], ? 7 => [* plutus_v3_script] }`
#[derive(Debug, Clone, Default)]
pub struct WitnessSet {
    pub vkeywitness: Option<Vec<VKeyWitness>>,
    pub native_script: Option<Vec<NativeScript>>,
    pub bootstrap_witness: Option<Vec<BootstrapWitness>>,
    pub plutus_v1_script: Option<Vec<PlutusV1Script>>,
    pub plutus_data: Option<Vec<PlutusData>>,
    pub redeemer: Option<Redeemers>,
    pub plutus_v2_script: Option<Vec<PlutusV2Script>>,
    pub plutus_v3_script: Option<Vec<PlutusV3Script>>,
}

impl PartialEq for WitnessSet {
    fn eq(&self, other: &Self) -> bool {
        self.vkeywitness == other.vkeywitness
            && self.native_script == other.native_script
            && self.bootstrap_witness == other.bootstrap_witness
            && self.plutus_v1_script == other.plutus_v1_script
            && self.plutus_data == other.plutus_data
            && self.redeemer == other.redeemer
            && self.plutus_v2_script == other.plutus_v2_script
            && self.plutus_v3_script == other.plutus_v3_script
    }
}

impl Fragment for WitnessSet {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_map()?;
        let mut set = Self::default();
        let mut seen = std::collections::BTreeSet::new();
        let mut read_field = |reader: &mut Reader| -> Result<()> {
            let key = reader.read_uint()?;
            if !seen.insert(key) {
                return Err(LedgerError::DuplicatedCborMapKey(key));
            }
            match key {
                0 => set.vkeywitness = Some(crate::decode_array(reader)?),
                1 => set.native_script = Some(crate::decode_array(reader)?),
                2 => set.bootstrap_witness = Some(crate::decode_array(reader)?),
                3 => set.plutus_v1_script = Some(crate::decode_array(reader)?),
                4 => set.plutus_data = Some(crate::decode_array(reader)?),
                5 => set.redeemer = Some(Redeemers::from_cbor(reader)?),
                6 => set.plutus_v2_script = Some(crate::decode_array(reader)?),
                7 => set.plutus_v3_script = Some(crate::decode_array(reader)?),
                other => return Err(LedgerError::InvalidCborMapKey(other)),
            }
            Ok(())
        };
        if len >= 0 {
            for _ in 0..len {
                read_field(reader)?;
            }
        } else {
            while reader.peek_state()? != cardano_cbor::PeekState::EndMap {
                read_field(reader)?;
            }
        }
        reader.read_end_map()?;
        Ok(set)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        let count = self.vkeywitness.is_some() as u64
            + self.native_script.is_some() as u64
            + self.bootstrap_witness.is_some() as u64
            + self.plutus_v1_script.is_some() as u64
            + self.plutus_data.is_some() as u64
            + self.redeemer.is_some() as u64
            + self.plutus_v2_script.is_some() as u64
            + self.plutus_v3_script.is_some() as u64;
        writer.write_start_map(count);
        if let Some(items) = &self.vkeywitness {
            writer.write_uint(0);
            crate::encode_array(writer, items)?;
        }
        if let Some(items) = &self.native_script {
            writer.write_uint(1);
            crate::encode_array(writer, items)?;
        }
        if let Some(items) = &self.bootstrap_witness {
            writer.write_uint(2);
            crate::encode_array(writer, items)?;
        }
        if let Some(items) = &self.plutus_v1_script {
            writer.write_uint(3);
            crate::encode_array(writer, items)?;
        }
        if let Some(items) = &self.plutus_data {
            writer.write_uint(4);
            crate::encode_array(writer, items)?;
        }
        if let Some(redeemer) = &self.redeemer {
            writer.write_uint(5);
            redeemer.to_cbor(writer)?;
        }
        if let Some(items) = &self.plutus_v2_script {
            writer.write_uint(6);
            crate::encode_array(writer, items)?;
        }
        if let Some(items) = &self.plutus_v3_script {
            writer.write_uint(7);
            crate::encode_array(writer, items)?;
        }
        writer.write_end_map();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_redeemer(tag: RedeemerTag, index: u32) -> Redeemer {
        Redeemer {
            tag,
            index,
            data: PlutusData::BigInt(crate::plutus_data::BigInt::Int(index as i64)),
            ex_units: ExUnits { mem: 1, steps: 1 },
        }
    }

    #[test]
    fn redeemers_from_array_reorders_and_reencodes_as_map() {
        let mut writer = Writer::new();
        writer.write_start_array(2);
        sample_redeemer(RedeemerTag::Mint, 1).to_cbor(&mut writer).unwrap();
        sample_redeemer(RedeemerTag::Spend, 0).to_cbor(&mut writer).unwrap();
        writer.write_end_array();
        let bytes = writer.encode();

        let mut redeemers = Redeemers::decode_fragment(&bytes).unwrap();
        assert_eq!(redeemers.items()[0].tag, RedeemerTag::Spend);
        assert_eq!(redeemers.items()[1].tag, RedeemerTag::Mint);

        redeemers.clear_cbor_cache();
        let reencoded = redeemers.encode_fragment().unwrap();
        assert_eq!(reencoded[0] & 0xE0, 0xA0); // re-encodes as a map
    }

    #[test]
    fn redeemers_preserves_original_bytes_until_cache_cleared() {
        let mut writer = Writer::new();
        writer.write_start_array(1);
        sample_redeemer(RedeemerTag::Spend, 0).to_cbor(&mut writer).unwrap();
        writer.write_end_array();
        let bytes = writer.encode();

        let redeemers = Redeemers::decode_fragment(&bytes).unwrap();
        let reencoded = redeemers.encode_fragment().unwrap();
        assert_eq!(reencoded, bytes);
    }

    #[test]
    fn witness_set_round_trips_sparse_fields() {
        let mut set = WitnessSet::default();
        set.vkeywitness = Some(vec![VKeyWitness {
            vkey: Ed25519PublicKey::from_bytes(&[1u8; 32]).unwrap(),
            signature: Ed25519Signature::from_bytes(&[2u8; 64]).unwrap(),
        }]);
        let bytes = set.encode_fragment().unwrap();
        let decoded = WitnessSet::decode_fragment(&bytes).unwrap();
        assert_eq!(decoded.vkeywitness.unwrap().len(), 1);
        assert!(decoded.native_script.is_none());
    }
}
