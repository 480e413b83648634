//! Transaction bodies, outputs, and the top-level transaction envelope.
//!
//! Everything here ultimately rides on the same canonical CBOR wire: values
//! carry an optional multiasset bundle, outputs pick between the legacy
//! array shape and the post-Alonzo sparse map shape, and the transaction
//! body caches its own decoded bytes so a transaction ID can be derived by
//! hashing them rather than re-encoding (which could disagree byte-for-byte
//! with whatever a producer originally emitted).

use std::collections::BTreeSet;

use cardano_crypto_iface::Hasher;

use crate::certificates::Certificate;
use crate::governance::{ProposalProcedures, VotingProcedures};
use crate::plutus_data::PlutusData;
use crate::scripts::{NativeScript, PlutusV1Script, PlutusV2Script, PlutusV3Script};
use crate::witnesses::WitnessSet;
use crate::{
    decode_array, encode_array, AddrKeyhash, AssetName, CborCache, Coin, DatumHash, Fragment,
    Hash, LedgerError, NetworkId, PolicyId, Reader, Result, RewardAccount, TransactionInput,
    WithCborCache, Writer,
};

const SET_TAG: u64 = 258;
const ENCODED_CBOR_TAG: u64 = 24;
const ALONZO_AUX_TAG: u64 = 259;

/// `set<a> = #6.258([* a])`, applied to entities (certificates) that can't
/// implement `Ord` the way [`crate::SortedSet`] requires — order here is the
/// producer's insertion order, not a canonical sort, since certificate and
/// input order is semantically meaningful.
fn decode_tagged_list<T: Fragment>(reader: &mut Reader) -> Result<Vec<T>> {
    let tag = reader.read_tag()?;
    if tag != SET_TAG {
        return Err(LedgerError::invalid_argument(format!(
            "expected tag 258 for a set, got {tag}"
        )));
    }
    decode_array(reader)
}

fn encode_tagged_list<T: Fragment>(writer: &mut Writer, items: &[T]) -> Result<()> {
    writer.write_tag(SET_TAG);
    encode_array(writer, items)
}

/// `#6.24(bytes .cbor t)`, the "encoded CBOR data item" wrapper used to
/// embed a nested Plutus datum or script inside a byte string.
fn decode_tag24<T: Fragment>(reader: &mut Reader) -> Result<T> {
    let tag = reader.read_tag()?;
    if tag != ENCODED_CBOR_TAG {
        return Err(LedgerError::invalid_argument(format!(
            "expected tag 24 for an encoded cbor data item, got {tag}"
        )));
    }
    let bytes = reader.read_bytestring()?;
    let mut inner = Reader::from_bytes(&bytes)?;
    T::from_cbor(&mut inner)
}

fn encode_tag24<T: Fragment>(writer: &mut Writer, value: &T) -> Result<()> {
    let mut inner = Writer::new();
    value.to_cbor(&mut inner)?;
    writer.write_tag(ENCODED_CBOR_TAG);
    writer.write_bytestring(&inner.encode());
    Ok(())
}

pub type Multiasset<A> = crate::SortedMap<PolicyId, crate::SortedMap<AssetName, A>>;
pub type Mint = Multiasset<i64>;
pub type Withdrawals = crate::SortedMap<RewardAccount, Coin>;
pub type PositiveCoin = Coin;

/// `value = coin / [coin, multiasset<positive_coin>]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Value {
    Coin(Coin),
    Multiasset(Coin, Multiasset<PositiveCoin>),
}

impl Fragment for Value {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::StartArray => {
                cardano_cbor::validate_array_of_n_elements("Value", reader, 2)?;
                let coin = reader.read_uint()?;
                let assets = Multiasset::<PositiveCoin>::from_cbor(reader)?;
                cardano_cbor::validate_end_array("Value", reader)?;
                Ok(Self::Multiasset(coin, assets))
            }
            _ => Ok(Self::Coin(reader.read_uint()?)),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Coin(coin) => {
                writer.write_uint(*coin);
                Ok(())
            }
            Self::Multiasset(coin, assets) => {
                writer.write_start_array(2);
                writer.write_uint(*coin);
                assets.to_cbor(writer)?;
                writer.write_end_array();
                Ok(())
            }
        }
    }
}

/// `script = [0, native_script // 1, plutus_v1_script // 2, plutus_v2_script
/// // 3, plutus_v3_script]`
#[derive(Debug, PartialEq, Clone)]
pub enum Script {
    NativeScript(NativeScript),
    PlutusV1Script(PlutusV1Script),
    PlutusV2Script(PlutusV2Script),
    PlutusV3Script(PlutusV3Script),
}

impl Fragment for Script {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("Script", reader, 2)?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::NativeScript(NativeScript::from_cbor(reader)?),
            1 => Self::PlutusV1Script(PlutusV1Script::from_cbor(reader)?),
            2 => Self::PlutusV2Script(PlutusV2Script::from_cbor(reader)?),
            3 => Self::PlutusV3Script(PlutusV3Script::from_cbor(reader)?),
            other => {
                return Err(LedgerError::invalid_argument(format!(
                    "invalid script variant {other}"
                )))
            }
        };
        cardano_cbor::validate_end_array("Script", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        match self {
            Self::NativeScript(s) => {
                writer.write_uint(0);
                s.to_cbor(writer)?;
            }
            Self::PlutusV1Script(s) => {
                writer.write_uint(1);
                s.to_cbor(writer)?;
            }
            Self::PlutusV2Script(s) => {
                writer.write_uint(2);
                s.to_cbor(writer)?;
            }
            Self::PlutusV3Script(s) => {
                writer.write_uint(3);
                s.to_cbor(writer)?;
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

/// `script_ref = #6.24(bytes .cbor script)`
#[derive(Debug, PartialEq, Clone)]
pub struct ScriptRef(pub Script);

impl Fragment for ScriptRef {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(Self(decode_tag24(reader)?))
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        encode_tag24(writer, &self.0)
    }
}

/// `datum_option = [0, $hash32] / [1, #6.24(bytes .cbor plutus_data)]`
#[derive(Debug, PartialEq, Clone)]
pub enum DatumOption {
    Hash(DatumHash),
    Data(PlutusData),
}

impl Fragment for DatumOption {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("DatumOption", reader, 2)?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::Hash(DatumHash::from_cbor(reader)?),
            1 => Self::Data(decode_tag24(reader)?),
            other => {
                return Err(LedgerError::invalid_argument(format!(
                    "invalid datum option variant {other}"
                )))
            }
        };
        cardano_cbor::validate_end_array("DatumOption", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        match self {
            Self::Hash(hash) => {
                writer.write_uint(0);
                hash.to_cbor(writer)?;
            }
            Self::Data(data) => {
                writer.write_uint(1);
                encode_tag24(writer, data)?;
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

/// `transaction_output = [address, amount : value, datum_hash : $hash32] /
/// { 0 : address, 1 : value, ? 2 : datum_option, ? 3 : script_ref }`
///
/// The legacy array shape predates Babbage; the post-Alonzo map shape is
/// what every modern producer emits. Which one a given output decodes from
/// is picked by peeking the outer CBOR major type, the same way
/// [`crate::certificates::Certificate`]'s siblings pick their shape.
#[derive(Debug, PartialEq, Clone)]
pub enum TransactionOutput {
    Legacy {
        address: Vec<u8>,
        amount: Value,
        datum_hash: Option<DatumHash>,
    },
    PostAlonzo {
        address: Vec<u8>,
        value: Value,
        datum_option: Option<DatumOption>,
        script_ref: Option<ScriptRef>,
    },
}

impl Fragment for TransactionOutput {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::StartArray => {
                let _len = reader.read_start_array()?;
                let address = reader.read_bytestring()?;
                let amount = Value::from_cbor(reader)?;
                let datum_hash = if reader.peek_state()? != cardano_cbor::PeekState::EndArray {
                    Some(DatumHash::from_cbor(reader)?)
                } else {
                    None
                };
                cardano_cbor::validate_end_array("TransactionOutput", reader)?;
                Ok(Self::Legacy {
                    address,
                    amount,
                    datum_hash,
                })
            }
            _ => {
                let len = reader.read_start_map()?;
                let mut address = None;
                let mut value = None;
                let mut datum_option = None;
                let mut script_ref = None;
                let mut seen = BTreeSet::new();
                let mut read_field = |reader: &mut Reader| -> Result<()> {
                    let key = reader.read_uint()?;
                    if !seen.insert(key) {
                        return Err(LedgerError::DuplicatedCborMapKey(key));
                    }
                    match key {
                        0 => address = Some(reader.read_bytestring()?),
                        1 => value = Some(Value::from_cbor(reader)?),
                        2 => datum_option = Some(DatumOption::from_cbor(reader)?),
                        3 => script_ref = Some(ScriptRef::from_cbor(reader)?),
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
                Ok(Self::PostAlonzo {
                    address: address.ok_or_else(|| {
                        LedgerError::invalid_argument("transaction output missing address")
                    })?,
                    value: value.ok_or_else(|| {
                        LedgerError::invalid_argument("transaction output missing value")
                    })?,
                    datum_option,
                    script_ref,
                })
            }
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Legacy {
                address,
                amount,
                datum_hash,
            } => {
                writer.write_start_array(if datum_hash.is_some() { 3 } else { 2 });
                writer.write_bytestring(address);
                amount.to_cbor(writer)?;
                if let Some(hash) = datum_hash {
                    hash.to_cbor(writer)?;
                }
                writer.write_end_array();
                Ok(())
            }
            Self::PostAlonzo {
                address,
                value,
                datum_option,
                script_ref,
            } => {
                let count = 2 + datum_option.is_some() as u64 + script_ref.is_some() as u64;
                writer.write_start_map(count);
                writer.write_uint(0);
                writer.write_bytestring(address);
                writer.write_uint(1);
                value.to_cbor(writer)?;
                if let Some(datum) = datum_option {
                    writer.write_uint(2);
                    datum.to_cbor(writer)?;
                }
                if let Some(script) = script_ref {
                    writer.write_uint(3);
                    script.to_cbor(writer)?;
                }
                writer.write_end_map();
                Ok(())
            }
        }
    }
}

/// `metadatum_label = uint`
pub type MetadatumLabel = u64;

/// `transaction_metadatum = int / bytes / text / [* transaction_metadatum] /
/// { * transaction_metadatum => transaction_metadatum }`
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Metadatum {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

impl Fragment for Metadatum {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::UnsignedInteger | cardano_cbor::PeekState::NegativeInteger => {
                Ok(Self::Int(reader.read_int()?))
            }
            cardano_cbor::PeekState::ByteString | cardano_cbor::PeekState::StartIndefiniteByteString => {
                Ok(Self::Bytes(reader.read_bytestring()?))
            }
            cardano_cbor::PeekState::TextString | cardano_cbor::PeekState::StartIndefiniteTextString => {
                Ok(Self::Text(reader.read_textstring()?))
            }
            cardano_cbor::PeekState::StartArray => Ok(Self::Array(decode_array(reader)?)),
            cardano_cbor::PeekState::StartMap => {
                let len = reader.read_start_map()?;
                let mut pairs = Vec::new();
                if len >= 0 {
                    for _ in 0..len {
                        let k = Metadatum::from_cbor(reader)?;
                        let v = Metadatum::from_cbor(reader)?;
                        pairs.push((k, v));
                    }
                } else {
                    while reader.peek_state()? != cardano_cbor::PeekState::EndMap {
                        let k = Metadatum::from_cbor(reader)?;
                        let v = Metadatum::from_cbor(reader)?;
                        pairs.push((k, v));
                    }
                }
                reader.read_end_map()?;
                Ok(Self::Map(pairs))
            }
            other => Err(LedgerError::invalid_argument(format!(
                "unexpected cbor shape {other:?} for transaction metadatum"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Int(v) => {
                writer.write_int(*v);
                Ok(())
            }
            Self::Bytes(b) => {
                writer.write_bytestring(b);
                Ok(())
            }
            Self::Text(t) => {
                writer.write_textstring(t);
                Ok(())
            }
            Self::Array(items) => encode_array(writer, items),
            Self::Map(pairs) => {
                writer.write_start_map(pairs.len() as u64);
                for (k, v) in pairs {
                    k.to_cbor(writer)?;
                    v.to_cbor(writer)?;
                }
                writer.write_end_map();
                Ok(())
            }
        }
    }
}

/// `transaction_metadata = { * metadatum_label => transaction_metadatum }`
pub type Metadata = crate::SortedMap<MetadatumLabel, Metadatum>;

/// `post_alonzo_auxiliary_data = { ? 0 => metadata, ? 1 => [* native_script],
/// ? 2 => [* plutus_v1_script], ? 3 => [* plutus_v2_script],
/// ? 4 => [* plutus_v3_script] }`
#[derive(Debug, PartialEq, Clone, Default)]
pub struct PostAlonzoAuxiliaryData {
    pub metadata: Option<Metadata>,
    pub native_scripts: Option<Vec<NativeScript>>,
    pub plutus_v1_scripts: Option<Vec<PlutusV1Script>>,
    pub plutus_v2_scripts: Option<Vec<PlutusV2Script>>,
    pub plutus_v3_scripts: Option<Vec<PlutusV3Script>>,
}

impl Fragment for PostAlonzoAuxiliaryData {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_map()?;
        let mut data = Self::default();
        let mut seen = BTreeSet::new();
        let mut read_field = |reader: &mut Reader| -> Result<()> {
            let key = reader.read_uint()?;
            if !seen.insert(key) {
                return Err(LedgerError::DuplicatedCborMapKey(key));
            }
            match key {
                0 => data.metadata = Some(Metadata::from_cbor(reader)?),
                1 => data.native_scripts = Some(decode_array(reader)?),
                2 => data.plutus_v1_scripts = Some(decode_array(reader)?),
                3 => data.plutus_v2_scripts = Some(decode_array(reader)?),
                4 => data.plutus_v3_scripts = Some(decode_array(reader)?),
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
        Ok(data)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        let count = self.metadata.is_some() as u64
            + self.native_scripts.is_some() as u64
            + self.plutus_v1_scripts.is_some() as u64
            + self.plutus_v2_scripts.is_some() as u64
            + self.plutus_v3_scripts.is_some() as u64;
        writer.write_start_map(count);
        if let Some(metadata) = &self.metadata {
            writer.write_uint(0);
            metadata.to_cbor(writer)?;
        }
        if let Some(scripts) = &self.native_scripts {
            writer.write_uint(1);
            encode_array(writer, scripts)?;
        }
        if let Some(scripts) = &self.plutus_v1_scripts {
            writer.write_uint(2);
            encode_array(writer, scripts)?;
        }
        if let Some(scripts) = &self.plutus_v2_scripts {
            writer.write_uint(3);
            encode_array(writer, scripts)?;
        }
        if let Some(scripts) = &self.plutus_v3_scripts {
            writer.write_uint(4);
            encode_array(writer, scripts)?;
        }
        writer.write_end_map();
        Ok(())
    }
}

/// `auxiliary_data = metadata / [transaction_metadata, auxiliary_scripts] /
/// #6.259(post_alonzo_auxiliary_data)`
///
/// Shape-dispatched like [`TransactionOutput`]: a bare map is the Shelley
/// form, a bare array is the Shelley-MA form, and a tag-259-wrapped map is
/// the post-Alonzo form every modern producer emits.
#[derive(Debug, PartialEq, Clone)]
pub enum AuxiliaryData {
    Shelley(Metadata),
    ShelleyMa {
        transaction_metadata: Metadata,
        auxiliary_scripts: Option<Vec<NativeScript>>,
    },
    Alonzo(PostAlonzoAuxiliaryData),
}

impl AuxiliaryData {
    pub fn hash(&self) -> Result<Hash<32>> {
        Ok(Hasher::<256>::hash(&self.encode_fragment()?))
    }
}

impl Fragment for AuxiliaryData {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::StartMap => Ok(Self::Shelley(Metadata::from_cbor(reader)?)),
            cardano_cbor::PeekState::StartArray => {
                cardano_cbor::validate_array_of_n_elements("AuxiliaryData", reader, 2)?;
                let transaction_metadata = Metadata::from_cbor(reader)?;
                let auxiliary_scripts = match reader.peek_state()? {
                    cardano_cbor::PeekState::Null => {
                        reader.read_null()?;
                        None
                    }
                    _ => Some(decode_array(reader)?),
                };
                cardano_cbor::validate_end_array("AuxiliaryData", reader)?;
                Ok(Self::ShelleyMa {
                    transaction_metadata,
                    auxiliary_scripts,
                })
            }
            cardano_cbor::PeekState::Tag => {
                let tag = reader.read_tag()?;
                if tag != ALONZO_AUX_TAG {
                    return Err(LedgerError::invalid_argument(format!(
                        "expected tag 259 for post-alonzo auxiliary data, got {tag}"
                    )));
                }
                Ok(Self::Alonzo(PostAlonzoAuxiliaryData::from_cbor(reader)?))
            }
            other => Err(LedgerError::invalid_argument(format!(
                "unexpected cbor shape {other:?} for auxiliary data"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Shelley(metadata) => metadata.to_cbor(writer),
            Self::ShelleyMa {
                transaction_metadata,
                auxiliary_scripts,
            } => {
                writer.write_start_array(2);
                transaction_metadata.to_cbor(writer)?;
                match auxiliary_scripts {
                    Some(scripts) => encode_array(writer, scripts)?,
                    None => writer.write_null(),
                }
                writer.write_end_array();
                Ok(())
            }
            Self::Alonzo(data) => {
                writer.write_tag(ALONZO_AUX_TAG);
                data.to_cbor(writer)
            }
        }
    }
}

/// `transaction_body = { 0 : set<transaction_input>, 1 : [* transaction_output],
/// 2 : coin, ? 3 : uint, ? 4 : [* certificate], ? 5 : withdrawals,
/// ? 7 : $hash32, ? 8 : uint, ? 9 : mint, ? 11 : $hash32,
/// ? 13 : set<transaction_input>, ? 14 : set<addr_keyhash>, ? 15 : network_id,
/// ? 16 : transaction_output, ? 17 : coin, ? 18 : set<transaction_input>,
/// ? 19 : voting_procedures, ? 20 : [+ proposal_procedure], ? 21 : coin,
/// ? 22 : positive_coin }`
///
/// Keys 6, 10 and 12 were retired in earlier eras and never reused; 19-22
/// are the fields Conway added for on-chain governance.
#[derive(Debug, Clone, Default)]
pub struct TransactionBody {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub fee: Coin,
    pub ttl: Option<u64>,
    pub certificates: Option<Vec<Certificate>>,
    pub withdrawals: Option<Withdrawals>,
    pub auxiliary_data_hash: Option<Hash<32>>,
    pub validity_interval_start: Option<u64>,
    pub mint: Option<Mint>,
    pub script_data_hash: Option<Hash<32>>,
    pub collateral: Option<Vec<TransactionInput>>,
    pub required_signers: Option<Vec<AddrKeyhash>>,
    pub network_id: Option<NetworkId>,
    pub collateral_return: Option<TransactionOutput>,
    pub total_collateral: Option<Coin>,
    pub reference_inputs: Option<Vec<TransactionInput>>,
    pub voting_procedures: Option<VotingProcedures>,
    pub proposal_procedures: Option<ProposalProcedures>,
    pub treasury_value: Option<Coin>,
    pub donation: Option<PositiveCoin>,
    cache: CborCache,
}

impl PartialEq for TransactionBody {
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.fee == other.fee
            && self.ttl == other.ttl
            && self.certificates == other.certificates
            && self.withdrawals == other.withdrawals
            && self.auxiliary_data_hash == other.auxiliary_data_hash
            && self.validity_interval_start == other.validity_interval_start
            && self.mint == other.mint
            && self.script_data_hash == other.script_data_hash
            && self.collateral == other.collateral
            && self.required_signers == other.required_signers
            && self.network_id == other.network_id
            && self.collateral_return == other.collateral_return
            && self.total_collateral == other.total_collateral
            && self.reference_inputs == other.reference_inputs
            && self.voting_procedures == other.voting_procedures
            && self.proposal_procedures == other.proposal_procedures
            && self.treasury_value == other.treasury_value
            && self.donation == other.donation
    }
}

impl WithCborCache for TransactionBody {
    fn cbor_cache(&self) -> &CborCache {
        &self.cache
    }

    fn cbor_cache_mut(&mut self) -> &mut CborCache {
        &mut self.cache
    }
}

impl TransactionBody {
    /// Hashes the cached decode bytes when present (preserving whatever
    /// framing the original producer used), otherwise falls back to a
    /// fresh canonical encode.
    pub fn transaction_id(&self) -> Result<Hash<32>> {
        match self.cbor_cache().get() {
            Some(bytes) => Ok(Hasher::<256>::hash(bytes)),
            None => Ok(Hasher::<256>::hash(&self.encode_fragment()?)),
        }
    }
}

impl Fragment for TransactionBody {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let raw = reader.read_encoded_value()?;
        let mut sub = Reader::from_bytes(&raw)?;

        let len = sub.read_start_map()?;
        let mut body = Self::default();
        let mut seen = BTreeSet::new();
        let mut read_field = |reader: &mut Reader| -> Result<()> {
            let key = reader.read_uint()?;
            if !seen.insert(key) {
                return Err(LedgerError::DuplicatedCborMapKey(key));
            }
            match key {
                0 => body.inputs = decode_tagged_list(reader)?,
                1 => body.outputs = decode_array(reader)?,
                2 => body.fee = reader.read_uint()?,
                3 => body.ttl = Some(reader.read_uint()?),
                4 => body.certificates = Some(decode_tagged_list(reader)?),
                5 => body.withdrawals = Some(Withdrawals::from_cbor(reader)?),
                7 => body.auxiliary_data_hash = Some(Hash::<32>::from_cbor(reader)?),
                8 => body.validity_interval_start = Some(reader.read_uint()?),
                9 => body.mint = Some(Mint::from_cbor(reader)?),
                11 => body.script_data_hash = Some(Hash::<32>::from_cbor(reader)?),
                13 => body.collateral = Some(decode_tagged_list(reader)?),
                14 => body.required_signers = Some(decode_tagged_list(reader)?),
                15 => body.network_id = Some(NetworkId::from_cbor(reader)?),
                16 => body.collateral_return = Some(TransactionOutput::from_cbor(reader)?),
                17 => body.total_collateral = Some(reader.read_uint()?),
                18 => body.reference_inputs = Some(decode_tagged_list(reader)?),
                19 => body.voting_procedures = Some(VotingProcedures::from_cbor(reader)?),
                20 => {
                    body.proposal_procedures =
                        Some(crate::governance::decode_proposal_procedures(reader)?)
                }
                21 => body.treasury_value = Some(reader.read_uint()?),
                22 => body.donation = Some(reader.read_uint()?),
                other => return Err(LedgerError::InvalidCborMapKey(other)),
            }
            Ok(())
        };

        if len >= 0 {
            for _ in 0..len {
                read_field(&mut sub)?;
            }
        } else {
            while sub.peek_state()? != cardano_cbor::PeekState::EndMap {
                read_field(&mut sub)?;
            }
        }
        sub.read_end_map()?;

        body.cache = CborCache::from_bytes(raw);
        Ok(body)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        if let Some(cached) = self.cbor_cache().get() {
            writer.write_encoded_raw(cached);
            return Ok(());
        }

        let count = 3
            + self.ttl.is_some() as u64
            + self.certificates.is_some() as u64
            + self.withdrawals.is_some() as u64
            + self.auxiliary_data_hash.is_some() as u64
            + self.validity_interval_start.is_some() as u64
            + self.mint.is_some() as u64
            + self.script_data_hash.is_some() as u64
            + self.collateral.is_some() as u64
            + self.required_signers.is_some() as u64
            + self.network_id.is_some() as u64
            + self.collateral_return.is_some() as u64
            + self.total_collateral.is_some() as u64
            + self.reference_inputs.is_some() as u64
            + self.voting_procedures.is_some() as u64
            + self.proposal_procedures.is_some() as u64
            + self.treasury_value.is_some() as u64
            + self.donation.is_some() as u64;

        writer.write_start_map(count);
        writer.write_uint(0);
        encode_tagged_list(writer, &self.inputs)?;
        writer.write_uint(1);
        encode_array(writer, &self.outputs)?;
        writer.write_uint(2);
        writer.write_uint(self.fee);
        if let Some(ttl) = self.ttl {
            writer.write_uint(3);
            writer.write_uint(ttl);
        }
        if let Some(certs) = &self.certificates {
            writer.write_uint(4);
            encode_tagged_list(writer, certs)?;
        }
        if let Some(withdrawals) = &self.withdrawals {
            writer.write_uint(5);
            withdrawals.to_cbor(writer)?;
        }
        if let Some(hash) = &self.auxiliary_data_hash {
            writer.write_uint(7);
            hash.to_cbor(writer)?;
        }
        if let Some(start) = self.validity_interval_start {
            writer.write_uint(8);
            writer.write_uint(start);
        }
        if let Some(mint) = &self.mint {
            writer.write_uint(9);
            mint.to_cbor(writer)?;
        }
        if let Some(hash) = &self.script_data_hash {
            writer.write_uint(11);
            hash.to_cbor(writer)?;
        }
        if let Some(collateral) = &self.collateral {
            writer.write_uint(13);
            encode_tagged_list(writer, collateral)?;
        }
        if let Some(signers) = &self.required_signers {
            writer.write_uint(14);
            encode_tagged_list(writer, signers)?;
        }
        if let Some(network_id) = &self.network_id {
            writer.write_uint(15);
            network_id.to_cbor(writer)?;
        }
        if let Some(output) = &self.collateral_return {
            writer.write_uint(16);
            output.to_cbor(writer)?;
        }
        if let Some(total) = self.total_collateral {
            writer.write_uint(17);
            writer.write_uint(total);
        }
        if let Some(refs) = &self.reference_inputs {
            writer.write_uint(18);
            encode_tagged_list(writer, refs)?;
        }
        if let Some(procedures) = &self.voting_procedures {
            writer.write_uint(19);
            procedures.to_cbor(writer)?;
        }
        if let Some(procedures) = &self.proposal_procedures {
            writer.write_uint(20);
            crate::governance::encode_proposal_procedures(writer, procedures)?;
        }
        if let Some(value) = self.treasury_value {
            writer.write_uint(21);
            writer.write_uint(value);
        }
        if let Some(donation) = self.donation {
            writer.write_uint(22);
            writer.write_uint(donation);
        }
        writer.write_end_map();
        Ok(())
    }
}

/// `transaction = [transaction_body, transaction_witness_set, bool,
/// auxiliary_data / null]`
///
/// A legacy 3-element frame (pre-Alonzo, no `is_valid`) is also accepted on
/// decode and defaults `is_valid` to `true`. The arity of the decoded frame
/// is retained so an unmutated legacy transaction re-encodes back to 3
/// elements rather than silently growing a field it never had; indefinite-
/// length transaction frames are rejected outright rather than guessed at.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub transaction_body: TransactionBody,
    pub transaction_witness_set: WitnessSet,
    pub is_valid: bool,
    pub auxiliary_data: Option<AuxiliaryData>,
    is_legacy: bool,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_body == other.transaction_body
            && self.transaction_witness_set == other.transaction_witness_set
            && self.is_valid == other.is_valid
            && self.auxiliary_data == other.auxiliary_data
    }
}

impl Transaction {
    pub fn new(
        transaction_body: TransactionBody,
        transaction_witness_set: WitnessSet,
        is_valid: bool,
        auxiliary_data: Option<AuxiliaryData>,
    ) -> Self {
        Self {
            transaction_body,
            transaction_witness_set,
            is_valid,
            auxiliary_data,
            is_legacy: false,
        }
    }
}

impl Fragment for Transaction {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        if len != 3 && len != 4 {
            return Err(LedgerError::invalid_argument(format!(
                "expected a 3- or 4-element definite transaction frame, got {len}"
            )));
        }
        let transaction_body = TransactionBody::from_cbor(reader)?;
        let transaction_witness_set = WitnessSet::from_cbor(reader)?;
        let is_valid = if len == 4 { reader.read_bool()? } else { true };
        let auxiliary_data = Option::<AuxiliaryData>::from_cbor(reader)?;
        cardano_cbor::validate_end_array("Transaction", reader)?;
        Ok(Self {
            transaction_body,
            transaction_witness_set,
            is_valid,
            auxiliary_data,
            is_legacy: len == 3,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        if self.is_legacy && self.is_valid {
            writer.write_start_array(3);
            self.transaction_body.to_cbor(writer)?;
            self.transaction_witness_set.to_cbor(writer)?;
            self.auxiliary_data.to_cbor(writer)?;
            writer.write_end_array();
            return Ok(());
        }

        writer.write_start_array(4);
        self.transaction_body.to_cbor(writer)?;
        self.transaction_witness_set.to_cbor(writer)?;
        writer.write_bool(self.is_valid);
        self.auxiliary_data.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plutus_data::BigInt;

    fn sample_output(address: Vec<u8>, coin: u64) -> TransactionOutput {
        TransactionOutput::PostAlonzo {
            address,
            value: Value::Coin(coin),
            datum_option: None,
            script_ref: None,
        }
    }

    #[test]
    fn value_coin_only_round_trips_as_bare_uint() {
        let original = Value::Coin(42);
        let bytes = original.encode_fragment().unwrap();
        assert_eq!(bytes, vec![0x18, 42]);
        let decoded = Value::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn value_multiasset_round_trips() {
        let mut assets = crate::SortedMap::new();
        let mut per_policy = crate::SortedMap::new();
        per_policy.insert(vec![1, 2, 3], 7u64);
        assets.insert(PolicyId::new([9u8; 28]), per_policy);
        let original = Value::Multiasset(5, assets);
        let bytes = original.encode_fragment().unwrap();
        let decoded = Value::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn legacy_output_without_datum_hash_round_trips() {
        let original = TransactionOutput::Legacy {
            address: vec![1, 2, 3],
            amount: Value::Coin(10),
            datum_hash: None,
        };
        let bytes = original.encode_fragment().unwrap();
        assert_eq!(bytes[0] & 0xE0, 0x80);
        let decoded = TransactionOutput::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn post_alonzo_output_round_trips_as_map() {
        let original = sample_output(vec![4, 5, 6], 99);
        let bytes = original.encode_fragment().unwrap();
        assert_eq!(bytes[0] & 0xE0, 0xA0);
        let decoded = TransactionOutput::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn datum_option_data_round_trips_through_tag_24() {
        let original = DatumOption::Data(PlutusData::BigInt(BigInt::Int(1)));
        let bytes = original.encode_fragment().unwrap();
        let decoded = DatumOption::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn shelley_ma_auxiliary_data_round_trips() {
        let original = AuxiliaryData::ShelleyMa {
            transaction_metadata: Metadata::new(),
            auxiliary_scripts: None,
        };
        let bytes = original.encode_fragment().unwrap();
        let decoded = AuxiliaryData::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn alonzo_auxiliary_data_round_trips_through_tag_259() {
        let mut data = PostAlonzoAuxiliaryData::default();
        data.metadata = Some(Metadata::new());
        let original = AuxiliaryData::Alonzo(data);
        let bytes = original.encode_fragment().unwrap();
        assert_eq!(&bytes[0..2], &[0xD9, 0x01]);
        let decoded = AuxiliaryData::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn legacy_three_element_transaction_defaults_is_valid_true() {
        let mut writer = Writer::new();
        writer.write_start_array(3);
        TransactionBody::default().to_cbor(&mut writer).unwrap();
        WitnessSet::default().to_cbor(&mut writer).unwrap();
        writer.write_null();
        writer.write_end_array();
        let bytes = writer.encode();

        let tx = Transaction::decode_fragment(&bytes).unwrap();
        assert!(tx.is_valid);
        assert_eq!(tx.encode_fragment().unwrap(), bytes);
    }

    #[test]
    fn legacy_transaction_with_is_valid_cleared_re_encodes_as_four_elements() {
        let mut writer = Writer::new();
        writer.write_start_array(3);
        TransactionBody::default().to_cbor(&mut writer).unwrap();
        WitnessSet::default().to_cbor(&mut writer).unwrap();
        writer.write_null();
        writer.write_end_array();
        let bytes = writer.encode();

        let mut tx = Transaction::decode_fragment(&bytes).unwrap();
        tx.is_valid = false;
        let re_encoded = tx.encode_fragment().unwrap();
        assert_ne!(re_encoded, bytes);
        let round_tripped = Transaction::decode_fragment(&re_encoded).unwrap();
        assert!(!round_tripped.is_valid);
    }

    #[test]
    fn transaction_id_hashes_cached_body_bytes() {
        let mut writer = Writer::new();
        TransactionBody::default().to_cbor(&mut writer).unwrap();
        let body_bytes = writer.encode();
        let body = TransactionBody::decode_fragment(&body_bytes).unwrap();
        assert_eq!(body.transaction_id().unwrap(), Hasher::<256>::hash(&body_bytes));
    }
}
