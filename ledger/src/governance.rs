//! Conway-era on-chain governance: proposals, votes, and the anchor/URL
//! pointer scheme they share with DRep and committee certificates.

use crate::protocol_params::ProtocolParamUpdate;
use crate::{
    decode_array, encode_array, Coin, Epoch, Fragment, Hash, LedgerError, ProtocolVersion, Reader,
    RewardAccount, Result, ScriptHash, SortedMap, SortedSet, UnitInterval, Writer,
};
use crate::certificates::CommitteeColdCredential;

/// `anchor = [anchor_url : text, anchor_data_hash : $hash32]`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Anchor {
    pub url: String,
    pub content_hash: Hash<32>,
}

impl Fragment for Anchor {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("Anchor", reader, 2)?;
        let url = reader.read_textstring()?;
        let content_hash = Hash::<32>::from_cbor(reader)?;
        cardano_cbor::validate_end_array("Anchor", reader)?;
        Ok(Self { url, content_hash })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        writer.write_textstring(&self.url);
        self.content_hash.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `gov_action_id = [transaction_id : $hash32, gov_action_index : uint .size 4]`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct GovActionId {
    pub transaction_id: Hash<32>,
    pub action_index: u32,
}

impl Fragment for GovActionId {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("GovActionId", reader, 2)?;
        let transaction_id = Hash::<32>::from_cbor(reader)?;
        let action_index = reader.read_uint()? as u32;
        cardano_cbor::validate_end_array("GovActionId", reader)?;
        Ok(Self {
            transaction_id,
            action_index,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.transaction_id.to_cbor(writer)?;
        writer.write_uint(self.action_index as u64);
        writer.write_end_array();
        Ok(())
    }
}

/// `voter = [0, addr_keyhash] / [1, scripthash] / [2, addr_keyhash] /
/// [3, scripthash] / [4, addr_keyhash]`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum Voter {
    ConstitutionalCommitteeKey(Hash<28>),
    ConstitutionalCommitteeScript(ScriptHash),
    DRepKey(Hash<28>),
    DRepScript(ScriptHash),
    StakePoolKey(Hash<28>),
}

impl Fragment for Voter {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("Voter", reader, 2)?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::ConstitutionalCommitteeKey(Hash::<28>::from_cbor(reader)?),
            1 => Self::ConstitutionalCommitteeScript(ScriptHash::from_cbor(reader)?),
            2 => Self::DRepKey(Hash::<28>::from_cbor(reader)?),
            3 => Self::DRepScript(ScriptHash::from_cbor(reader)?),
            4 => Self::StakePoolKey(Hash::<28>::from_cbor(reader)?),
            other => return Err(LedgerError::InvalidVoterType(other)),
        };
        cardano_cbor::validate_end_array("Voter", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        match self {
            Self::ConstitutionalCommitteeKey(h) => {
                writer.write_uint(0);
                h.to_cbor(writer)?;
            }
            Self::ConstitutionalCommitteeScript(h) => {
                writer.write_uint(1);
                h.to_cbor(writer)?;
            }
            Self::DRepKey(h) => {
                writer.write_uint(2);
                h.to_cbor(writer)?;
            }
            Self::DRepScript(h) => {
                writer.write_uint(3);
                h.to_cbor(writer)?;
            }
            Self::StakePoolKey(h) => {
                writer.write_uint(4);
                h.to_cbor(writer)?;
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

/// `vote = 0 ; no / 1 ; yes / 2 ; abstain`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Vote {
    No,
    Yes,
    Abstain,
}

impl Fragment for Vote {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.read_uint()? {
            0 => Ok(Self::No),
            1 => Ok(Self::Yes),
            2 => Ok(Self::Abstain),
            other => Err(LedgerError::invalid_argument(format!("invalid vote {other}"))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_uint(match self {
            Self::No => 0,
            Self::Yes => 1,
            Self::Abstain => 2,
        });
        Ok(())
    }
}

/// `voting_procedure = [vote, anchor / null]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VotingProcedure {
    pub vote: Vote,
    pub anchor: Option<Anchor>,
}

impl Fragment for VotingProcedure {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("VotingProcedure", reader, 2)?;
        let vote = Vote::from_cbor(reader)?;
        let anchor = Option::<Anchor>::from_cbor(reader)?;
        cardano_cbor::validate_end_array("VotingProcedure", reader)?;
        Ok(Self { vote, anchor })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.vote.to_cbor(writer)?;
        self.anchor.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `voting_procedures = { + voter => { + gov_action_id => voting_procedure } }`
pub type VotingProcedures = SortedMap<Voter, SortedMap<GovActionId, VotingProcedure>>;

/// `constitution = [anchor, scripthash / null]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Constitution {
    pub anchor: Anchor,
    pub guardrail_script: Option<ScriptHash>,
}

impl Fragment for Constitution {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("Constitution", reader, 2)?;
        let anchor = Anchor::from_cbor(reader)?;
        let guardrail_script = Option::<ScriptHash>::from_cbor(reader)?;
        cardano_cbor::validate_end_array("Constitution", reader)?;
        Ok(Self {
            anchor,
            guardrail_script,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.anchor.to_cbor(writer)?;
        self.guardrail_script.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `gov_action = [0, ...] / ... / [6]`
#[derive(Debug, PartialEq, Clone)]
pub enum GovAction {
    ParameterChange(
        Option<GovActionId>,
        Box<ProtocolParamUpdate>,
        Option<ScriptHash>,
    ),
    HardForkInitiation(Option<GovActionId>, ProtocolVersion),
    TreasuryWithdrawals(SortedMap<RewardAccount, Coin>, Option<ScriptHash>),
    NoConfidence(Option<GovActionId>),
    UpdateCommittee(
        Option<GovActionId>,
        SortedSet<CommitteeColdCredential>,
        SortedMap<CommitteeColdCredential, Epoch>,
        UnitInterval,
    ),
    NewConstitution(Option<GovActionId>, Constitution),
    Information,
}

impl Fragment for GovAction {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::ParameterChange(
                Option::<GovActionId>::from_cbor(reader)?,
                Box::new(ProtocolParamUpdate::from_cbor(reader)?),
                Option::<ScriptHash>::from_cbor(reader)?,
            ),
            1 => Self::HardForkInitiation(
                Option::<GovActionId>::from_cbor(reader)?,
                ProtocolVersion::from_cbor(reader)?,
            ),
            2 => Self::TreasuryWithdrawals(
                SortedMap::<RewardAccount, Coin>::from_cbor(reader)?,
                Option::<ScriptHash>::from_cbor(reader)?,
            ),
            3 => Self::NoConfidence(Option::<GovActionId>::from_cbor(reader)?),
            4 => Self::UpdateCommittee(
                Option::<GovActionId>::from_cbor(reader)?,
                SortedSet::<CommitteeColdCredential>::from_cbor(reader)?,
                SortedMap::<CommitteeColdCredential, Epoch>::from_cbor(reader)?,
                UnitInterval::from_cbor(reader)?,
            ),
            5 => Self::NewConstitution(
                Option::<GovActionId>::from_cbor(reader)?,
                Constitution::from_cbor(reader)?,
            ),
            6 => Self::Information,
            other => return Err(LedgerError::InvalidGovActionType(other)),
        };
        let _ = len;
        cardano_cbor::validate_end_array("GovAction", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::ParameterChange(id, update, policy) => {
                writer.write_start_array(4);
                writer.write_uint(0);
                id.to_cbor(writer)?;
                update.to_cbor(writer)?;
                policy.to_cbor(writer)?;
            }
            Self::HardForkInitiation(id, version) => {
                writer.write_start_array(3);
                writer.write_uint(1);
                id.to_cbor(writer)?;
                version.to_cbor(writer)?;
            }
            Self::TreasuryWithdrawals(withdrawals, policy) => {
                writer.write_start_array(3);
                writer.write_uint(2);
                withdrawals.to_cbor(writer)?;
                policy.to_cbor(writer)?;
            }
            Self::NoConfidence(id) => {
                writer.write_start_array(2);
                writer.write_uint(3);
                id.to_cbor(writer)?;
            }
            Self::UpdateCommittee(id, removed, added, threshold) => {
                writer.write_start_array(5);
                writer.write_uint(4);
                id.to_cbor(writer)?;
                removed.to_cbor(writer)?;
                added.to_cbor(writer)?;
                threshold.to_cbor(writer)?;
            }
            Self::NewConstitution(id, constitution) => {
                writer.write_start_array(3);
                writer.write_uint(5);
                id.to_cbor(writer)?;
                constitution.to_cbor(writer)?;
            }
            Self::Information => {
                writer.write_start_array(1);
                writer.write_uint(6);
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

/// `proposal_procedure = [deposit : coin, reward_account, gov_action, anchor]`
#[derive(Debug, PartialEq, Clone)]
pub struct ProposalProcedure {
    pub deposit: Coin,
    pub reward_account: RewardAccount,
    pub gov_action: GovAction,
    pub anchor: Anchor,
}

impl Fragment for ProposalProcedure {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("ProposalProcedure", reader, 4)?;
        let deposit = reader.read_uint()?;
        let reward_account = reader.read_bytestring()?;
        let gov_action = GovAction::from_cbor(reader)?;
        let anchor = Anchor::from_cbor(reader)?;
        cardano_cbor::validate_end_array("ProposalProcedure", reader)?;
        Ok(Self {
            deposit,
            reward_account,
            gov_action,
            anchor,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(4);
        writer.write_uint(self.deposit);
        writer.write_bytestring(&self.reward_account);
        self.gov_action.to_cbor(writer)?;
        self.anchor.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

pub type ProposalProcedures = Vec<ProposalProcedure>;

pub(crate) fn decode_proposal_procedures(reader: &mut Reader) -> Result<ProposalProcedures> {
    decode_array(reader)
}

pub(crate) fn encode_proposal_procedures(
    writer: &mut Writer,
    procedures: &ProposalProcedures,
) -> Result<()> {
    encode_array(writer, procedures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn information_action_round_trips() {
        let original = GovAction::Information;
        let bytes = original.encode_fragment().unwrap();
        let decoded = GovAction::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn voter_respects_committee_key_before_committee_script_ordering() {
        let key = Voter::ConstitutionalCommitteeKey(Hash::<28>::new([0u8; 28]));
        let script = Voter::ConstitutionalCommitteeScript(ScriptHash::new([0u8; 28]));
        assert!(key < script);
    }

    #[test]
    fn voting_procedure_round_trips_without_anchor() {
        let original = VotingProcedure {
            vote: Vote::Yes,
            anchor: None,
        };
        let bytes = original.encode_fragment().unwrap();
        let decoded = VotingProcedure::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn unknown_gov_action_type_is_rejected() {
        let bytes = GovAction::Information.encode_fragment().unwrap();
        let mut tampered = bytes;
        tampered[1] = 42;
        let err = GovAction::decode_fragment(&tampered).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidGovActionType(42)));
    }
}
