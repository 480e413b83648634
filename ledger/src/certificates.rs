//! Certificates: stake (de)registration, pool lifecycle, delegation, and
//! the Conway-era governance certificates layered on top of them.

use crate::{
    AddrKeyhash, Coin, CommitteeColdCredential, CommitteeHotCredential, DRepCredential, Epoch,
    GenesisDelegateHash, Genesishash, LedgerError, PoolKeyhash, PoolMetadata, Relay,
    RewardAccount, ScriptHash, StakeCredential, VrfKeyhash,
};
use crate::{Fragment, Reader, Result, Writer};

/// `certificate = [0, stake_credential] / [1, stake_credential] /
/// [2, stake_credential, pool_keyhash] / [3, pool_params] /
/// [4, pool_keyhash, epoch] / [5, genesishash, genesis_delegate_hash,
/// vrf_keyhash] / [6, move_instantaneous_reward] / [7, ...] ... / [18, ...]`
#[derive(Debug, PartialEq, Clone)]
pub enum Certificate {
    StakeRegistration(StakeCredential),
    StakeDeregistration(StakeCredential),
    StakeDelegation(StakeCredential, PoolKeyhash),
    PoolRegistration {
        operator: PoolKeyhash,
        vrf_keyhash: VrfKeyhash,
        pledge: Coin,
        cost: Coin,
        margin: crate::UnitInterval,
        reward_account: RewardAccount,
        pool_owners: Vec<AddrKeyhash>,
        relays: Vec<Relay>,
        pool_metadata: Option<PoolMetadata>,
    },
    PoolRetirement(PoolKeyhash, Epoch),
    GenesisKeyDelegation(Genesishash, GenesisDelegateHash, VrfKeyhash),
    MoveInstantaneousRewardsCert(MoveInstantaneousReward),

    Reg(StakeCredential, Coin),
    UnReg(StakeCredential, Coin),
    VoteDeleg(StakeCredential, DRep),
    StakeVoteDeleg(StakeCredential, PoolKeyhash, DRep),
    StakeRegDeleg(StakeCredential, PoolKeyhash, Coin),
    VoteRegDeleg(StakeCredential, DRep, Coin),
    StakeVoteRegDeleg(StakeCredential, PoolKeyhash, DRep, Coin),

    AuthCommitteeHot(CommitteeColdCredential, CommitteeHotCredential),
    ResignCommitteeCold(CommitteeColdCredential, Option<crate::governance::Anchor>),
    RegDRepCert(DRepCredential, Coin, Option<crate::governance::Anchor>),
    UnRegDRepCert(DRepCredential, Coin),
    UpdateDRepCert(DRepCredential, Option<crate::governance::Anchor>),
}

impl Fragment for Certificate {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::StakeRegistration(StakeCredential::from_cbor(reader)?),
            1 => Self::StakeDeregistration(StakeCredential::from_cbor(reader)?),
            2 => Self::StakeDelegation(
                StakeCredential::from_cbor(reader)?,
                PoolKeyhash::from_cbor(reader)?,
            ),
            3 => decode_pool_registration(reader)?,
            4 => Self::PoolRetirement(PoolKeyhash::from_cbor(reader)?, reader.read_uint()?),
            5 => Self::GenesisKeyDelegation(
                reader.read_bytestring()?,
                reader.read_bytestring()?,
                VrfKeyhash::from_cbor(reader)?,
            ),
            6 => Self::MoveInstantaneousRewardsCert(MoveInstantaneousReward::from_cbor(reader)?),
            7 => Self::Reg(StakeCredential::from_cbor(reader)?, reader.read_uint()?),
            8 => Self::UnReg(StakeCredential::from_cbor(reader)?, reader.read_uint()?),
            9 => Self::VoteDeleg(StakeCredential::from_cbor(reader)?, DRep::from_cbor(reader)?),
            10 => Self::StakeVoteDeleg(
                StakeCredential::from_cbor(reader)?,
                PoolKeyhash::from_cbor(reader)?,
                DRep::from_cbor(reader)?,
            ),
            11 => Self::StakeRegDeleg(
                StakeCredential::from_cbor(reader)?,
                PoolKeyhash::from_cbor(reader)?,
                reader.read_uint()?,
            ),
            12 => Self::VoteRegDeleg(
                StakeCredential::from_cbor(reader)?,
                DRep::from_cbor(reader)?,
                reader.read_uint()?,
            ),
            13 => Self::StakeVoteRegDeleg(
                StakeCredential::from_cbor(reader)?,
                PoolKeyhash::from_cbor(reader)?,
                DRep::from_cbor(reader)?,
                reader.read_uint()?,
            ),
            14 => Self::AuthCommitteeHot(
                CommitteeColdCredential::from_cbor(reader)?,
                CommitteeHotCredential::from_cbor(reader)?,
            ),
            15 => Self::ResignCommitteeCold(
                CommitteeColdCredential::from_cbor(reader)?,
                decode_optional_anchor(reader)?,
            ),
            16 => Self::RegDRepCert(
                DRepCredential::from_cbor(reader)?,
                reader.read_uint()?,
                decode_optional_anchor(reader)?,
            ),
            17 => Self::UnRegDRepCert(DRepCredential::from_cbor(reader)?, reader.read_uint()?),
            18 => Self::UpdateDRepCert(
                DRepCredential::from_cbor(reader)?,
                decode_optional_anchor(reader)?,
            ),
            other => return Err(LedgerError::InvalidCertificateType(other)),
        };
        let _ = len;
        cardano_cbor::validate_end_array("Certificate", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::StakeRegistration(cred) => {
                writer.write_start_array(2);
                writer.write_uint(0);
                cred.to_cbor(writer)?;
            }
            Self::StakeDeregistration(cred) => {
                writer.write_start_array(2);
                writer.write_uint(1);
                cred.to_cbor(writer)?;
            }
            Self::StakeDelegation(cred, pool) => {
                writer.write_start_array(3);
                writer.write_uint(2);
                cred.to_cbor(writer)?;
                pool.to_cbor(writer)?;
            }
            Self::PoolRegistration {
                operator,
                vrf_keyhash,
                pledge,
                cost,
                margin,
                reward_account,
                pool_owners,
                relays,
                pool_metadata,
            } => {
                writer.write_start_array(10);
                writer.write_uint(3);
                operator.to_cbor(writer)?;
                vrf_keyhash.to_cbor(writer)?;
                writer.write_uint(*pledge);
                writer.write_uint(*cost);
                margin.to_cbor(writer)?;
                writer.write_bytestring(reward_account);
                writer.write_start_array(pool_owners.len() as u64);
                for owner in pool_owners {
                    owner.to_cbor(writer)?;
                }
                writer.write_end_array();
                writer.write_start_array(relays.len() as u64);
                for relay in relays {
                    relay.to_cbor(writer)?;
                }
                writer.write_end_array();
                match pool_metadata {
                    Some(metadata) => metadata.to_cbor(writer)?,
                    None => writer.write_null(),
                }
            }
            Self::PoolRetirement(pool, epoch) => {
                writer.write_start_array(3);
                writer.write_uint(4);
                pool.to_cbor(writer)?;
                writer.write_uint(*epoch);
            }
            Self::GenesisKeyDelegation(genesis_hash, delegate_hash, vrf_keyhash) => {
                writer.write_start_array(4);
                writer.write_uint(5);
                writer.write_bytestring(genesis_hash);
                writer.write_bytestring(delegate_hash);
                vrf_keyhash.to_cbor(writer)?;
            }
            Self::MoveInstantaneousRewardsCert(mir) => {
                writer.write_start_array(2);
                writer.write_uint(6);
                mir.to_cbor(writer)?;
            }
            Self::Reg(cred, deposit) => {
                writer.write_start_array(3);
                writer.write_uint(7);
                cred.to_cbor(writer)?;
                writer.write_uint(*deposit);
            }
            Self::UnReg(cred, deposit) => {
                writer.write_start_array(3);
                writer.write_uint(8);
                cred.to_cbor(writer)?;
                writer.write_uint(*deposit);
            }
            Self::VoteDeleg(cred, drep) => {
                writer.write_start_array(3);
                writer.write_uint(9);
                cred.to_cbor(writer)?;
                drep.to_cbor(writer)?;
            }
            Self::StakeVoteDeleg(cred, pool, drep) => {
                writer.write_start_array(4);
                writer.write_uint(10);
                cred.to_cbor(writer)?;
                pool.to_cbor(writer)?;
                drep.to_cbor(writer)?;
            }
            Self::StakeRegDeleg(cred, pool, deposit) => {
                writer.write_start_array(4);
                writer.write_uint(11);
                cred.to_cbor(writer)?;
                pool.to_cbor(writer)?;
                writer.write_uint(*deposit);
            }
            Self::VoteRegDeleg(cred, drep, deposit) => {
                writer.write_start_array(4);
                writer.write_uint(12);
                cred.to_cbor(writer)?;
                drep.to_cbor(writer)?;
                writer.write_uint(*deposit);
            }
            Self::StakeVoteRegDeleg(cred, pool, drep, deposit) => {
                writer.write_start_array(5);
                writer.write_uint(13);
                cred.to_cbor(writer)?;
                pool.to_cbor(writer)?;
                drep.to_cbor(writer)?;
                writer.write_uint(*deposit);
            }
            Self::AuthCommitteeHot(cold, hot) => {
                writer.write_start_array(3);
                writer.write_uint(14);
                cold.to_cbor(writer)?;
                hot.to_cbor(writer)?;
            }
            Self::ResignCommitteeCold(cold, anchor) => {
                writer.write_start_array(3);
                writer.write_uint(15);
                cold.to_cbor(writer)?;
                encode_optional_anchor(writer, anchor)?;
            }
            Self::RegDRepCert(cred, deposit, anchor) => {
                writer.write_start_array(4);
                writer.write_uint(16);
                cred.to_cbor(writer)?;
                writer.write_uint(*deposit);
                encode_optional_anchor(writer, anchor)?;
            }
            Self::UnRegDRepCert(cred, deposit) => {
                writer.write_start_array(3);
                writer.write_uint(17);
                cred.to_cbor(writer)?;
                writer.write_uint(*deposit);
            }
            Self::UpdateDRepCert(cred, anchor) => {
                writer.write_start_array(3);
                writer.write_uint(18);
                cred.to_cbor(writer)?;
                encode_optional_anchor(writer, anchor)?;
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

fn decode_pool_registration(reader: &mut Reader) -> Result<Certificate> {
    let operator = PoolKeyhash::from_cbor(reader)?;
    let vrf_keyhash = VrfKeyhash::from_cbor(reader)?;
    let pledge = reader.read_uint()?;
    let cost = reader.read_uint()?;
    let margin = crate::UnitInterval::from_cbor(reader)?;
    let reward_account = reader.read_bytestring()?;

    let owners_len = reader.read_start_array()?;
    let mut pool_owners = Vec::new();
    if owners_len >= 0 {
        for _ in 0..owners_len {
            pool_owners.push(AddrKeyhash::from_cbor(reader)?);
        }
    } else {
        while reader.peek_state()? != cardano_cbor::PeekState::EndArray {
            pool_owners.push(AddrKeyhash::from_cbor(reader)?);
        }
    }
    reader.read_end_array()?;

    let relays_len = reader.read_start_array()?;
    let mut relays = Vec::new();
    if relays_len >= 0 {
        for _ in 0..relays_len {
            relays.push(Relay::from_cbor(reader)?);
        }
    } else {
        while reader.peek_state()? != cardano_cbor::PeekState::EndArray {
            relays.push(Relay::from_cbor(reader)?);
        }
    }
    reader.read_end_array()?;

    let pool_metadata = match reader.peek_state()? {
        cardano_cbor::PeekState::Null => {
            reader.read_null()?;
            None
        }
        _ => Some(PoolMetadata::from_cbor(reader)?),
    };

    Ok(Certificate::PoolRegistration {
        operator,
        vrf_keyhash,
        pledge,
        cost,
        margin,
        reward_account,
        pool_owners,
        relays,
        pool_metadata,
    })
}

fn decode_optional_anchor(reader: &mut Reader) -> Result<Option<crate::governance::Anchor>> {
    match reader.peek_state()? {
        cardano_cbor::PeekState::Null => {
            reader.read_null()?;
            Ok(None)
        }
        _ => Ok(Some(crate::governance::Anchor::from_cbor(reader)?)),
    }
}

fn encode_optional_anchor(
    writer: &mut Writer,
    anchor: &Option<crate::governance::Anchor>,
) -> Result<()> {
    match anchor {
        Some(anchor) => anchor.to_cbor(writer),
        None => {
            writer.write_null();
            Ok(())
        }
    }
}

/// `drep = [0, addr_keyhash] / [1, scripthash] / [2] / [3]`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum DRep {
    Key(AddrKeyhash),
    Script(ScriptHash),
    Abstain,
    NoConfidence,
}

impl Fragment for DRep {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::Key(AddrKeyhash::from_cbor(reader)?),
            1 => Self::Script(ScriptHash::from_cbor(reader)?),
            2 => Self::Abstain,
            3 => Self::NoConfidence,
            other => return Err(LedgerError::invalid_argument(format!("invalid drep variant {other}"))),
        };
        let _ = len;
        cardano_cbor::validate_end_array("DRep", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Key(h) => {
                writer.write_start_array(2);
                writer.write_uint(0);
                h.to_cbor(writer)?;
            }
            Self::Script(h) => {
                writer.write_start_array(2);
                writer.write_uint(1);
                h.to_cbor(writer)?;
            }
            Self::Abstain => {
                writer.write_start_array(1);
                writer.write_uint(2);
            }
            Self::NoConfidence => {
                writer.write_start_array(1);
                writer.write_uint(3);
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

/// `instantaneous_reward_source = 0 ; reserves / 1 ; treasury`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InstantaneousRewardSource {
    Reserves,
    Treasury,
}

impl Fragment for InstantaneousRewardSource {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.read_uint()? {
            0 => Ok(Self::Reserves),
            1 => Ok(Self::Treasury),
            other => Err(LedgerError::invalid_argument(format!(
                "invalid instantaneous reward source {other}"
            ))),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_uint(match self {
            Self::Reserves => 0,
            Self::Treasury => 1,
        });
        Ok(())
    }
}

/// `instantaneous_reward_target = { * stake_credential => int } / coin`
///
/// A genuinely tagged-by-shape union rather than a discriminant-prefixed
/// one: a map means per-credential deltas, anything else means a single
/// pot-to-pot transfer amount.
#[derive(Debug, PartialEq, Clone)]
pub enum InstantaneousRewardTarget {
    StakeCredentials(crate::SortedMap<StakeCredential, i64>),
    OtherAccountingPot(Coin),
}

impl Fragment for InstantaneousRewardTarget {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        match reader.peek_state()? {
            cardano_cbor::PeekState::StartMap => {
                let len = reader.read_start_map()?;
                let mut entries = Vec::new();
                if len >= 0 {
                    for _ in 0..len {
                        let cred = StakeCredential::from_cbor(reader)?;
                        let delta = reader.read_int()?;
                        entries.push((cred, delta));
                    }
                } else {
                    while reader.peek_state()? != cardano_cbor::PeekState::EndMap {
                        let cred = StakeCredential::from_cbor(reader)?;
                        let delta = reader.read_int()?;
                        entries.push((cred, delta));
                    }
                }
                reader.read_end_map()?;
                Ok(Self::StakeCredentials(crate::SortedMap::from_pairs(entries)))
            }
            _ => Ok(Self::OtherAccountingPot(reader.read_uint()?)),
        }
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::StakeCredentials(entries) => {
                writer.write_start_map(entries.len() as u64);
                for (cred, delta) in entries.iter() {
                    cred.to_cbor(writer)?;
                    writer.write_int(*delta);
                }
                writer.write_end_map();
                Ok(())
            }
            Self::OtherAccountingPot(coin) => {
                writer.write_uint(*coin);
                Ok(())
            }
        }
    }
}

/// `move_instantaneous_reward = [instantaneous_reward_source,
/// instantaneous_reward_target]`
#[derive(Debug, PartialEq, Clone)]
pub struct MoveInstantaneousReward {
    pub source: InstantaneousRewardSource,
    pub target: InstantaneousRewardTarget,
}

impl Fragment for MoveInstantaneousReward {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("MoveInstantaneousReward", reader, 2)?;
        let source = InstantaneousRewardSource::from_cbor(reader)?;
        let target = InstantaneousRewardTarget::from_cbor(reader)?;
        cardano_cbor::validate_end_array("MoveInstantaneousReward", reader)?;
        Ok(Self { source, target })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.source.to_cbor(writer)?;
        self.target.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_registration_round_trips() {
        let original = Certificate::StakeRegistration(StakeCredential::AddrKeyhash(
            AddrKeyhash::new([9u8; 28]),
        ));
        let bytes = original.encode_fragment().unwrap();
        let decoded = Certificate::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn vote_deleg_round_trips_through_drep_abstain() {
        let original = Certificate::VoteDeleg(
            StakeCredential::AddrKeyhash(AddrKeyhash::new([1u8; 28])),
            DRep::Abstain,
        );
        let bytes = original.encode_fragment().unwrap();
        let decoded = Certificate::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn unknown_discriminant_yields_invalid_certificate_type() {
        let bytes = Certificate::UnRegDRepCert(
            StakeCredential::AddrKeyhash(AddrKeyhash::new([0u8; 28])),
            10,
        )
        .encode_fragment()
        .unwrap();
        let mut tampered = bytes;
        tampered[1] = 99;
        let err = Certificate::decode_fragment(&tampered).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCertificateType(99)));
    }

    #[test]
    fn mir_stake_credentials_round_trips() {
        let original = MoveInstantaneousReward {
            source: InstantaneousRewardSource::Reserves,
            target: InstantaneousRewardTarget::StakeCredentials(crate::SortedMap::from_pairs(
                vec![(StakeCredential::AddrKeyhash(AddrKeyhash::new([2u8; 28])), -500)],
            )),
        };
        let bytes = original.encode_fragment().unwrap();
        let decoded = MoveInstantaneousReward::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }
}
