//! Protocol parameter updates and the sparse keyed map they ride on, plus
//! the voting-threshold and execution-price records they embed.

use std::collections::BTreeSet;

use crate::{
    Coin, CostModel, Epoch, ExUnits, Fragment, LedgerError, Reader, Result, UnitInterval, Writer,
};

/// `cost_models = { ? 0 => cost_model, ? 1 => cost_model, ? 2 => cost_model,
/// ? language => cost_model }`
///
/// Plutus v1/v2/v3 are broken out as named fields since every ledger consumer
/// wants them directly; any key this rewrite doesn't yet recognize (a future
/// Plutus version) is kept in `unknown` rather than dropped on the floor.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct CostModels {
    pub plutus_v1: Option<CostModel>,
    pub plutus_v2: Option<CostModel>,
    pub plutus_v3: Option<CostModel>,
    pub unknown: std::collections::BTreeMap<u64, CostModel>,
}

impl Fragment for CostModels {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_map()?;
        let mut models = Self::default();
        let mut seen = BTreeSet::new();
        let mut read_pair = |reader: &mut Reader| -> Result<()> {
            let key = reader.read_uint()?;
            if !seen.insert(key) {
                return Err(LedgerError::DuplicatedCborMapKey(key));
            }
            let value = CostModel::from_cbor(reader)?;
            match key {
                0 => models.plutus_v1 = Some(value),
                1 => models.plutus_v2 = Some(value),
                2 => models.plutus_v3 = Some(value),
                other => {
                    models.unknown.insert(other, value);
                }
            }
            Ok(())
        };
        if len >= 0 {
            for _ in 0..len {
                read_pair(reader)?;
            }
        } else {
            while reader.peek_state()? != cardano_cbor::PeekState::EndMap {
                read_pair(reader)?;
            }
        }
        reader.read_end_map()?;
        Ok(models)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        let count = self.plutus_v1.is_some() as u64
            + self.plutus_v2.is_some() as u64
            + self.plutus_v3.is_some() as u64
            + self.unknown.len() as u64;
        writer.write_start_map(count);
        if let Some(model) = &self.plutus_v1 {
            writer.write_uint(0);
            model.to_cbor(writer)?;
        }
        if let Some(model) = &self.plutus_v2 {
            writer.write_uint(1);
            model.to_cbor(writer)?;
        }
        if let Some(model) = &self.plutus_v3 {
            writer.write_uint(2);
            model.to_cbor(writer)?;
        }
        for (key, model) in &self.unknown {
            writer.write_uint(*key);
            model.to_cbor(writer)?;
        }
        writer.write_end_map();
        Ok(())
    }
}

/// `ex_unit_prices = [mem_price : unit_interval, step_price : unit_interval]`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ExUnitPrices {
    pub mem_price: UnitInterval,
    pub step_price: UnitInterval,
}

impl Fragment for ExUnitPrices {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("ExUnitPrices", reader, 2)?;
        let mem_price = UnitInterval::from_cbor(reader)?;
        let step_price = UnitInterval::from_cbor(reader)?;
        cardano_cbor::validate_end_array("ExUnitPrices", reader)?;
        Ok(Self {
            mem_price,
            step_price,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.mem_price.to_cbor(writer)?;
        self.step_price.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `pool_voting_thresholds = [unit_interval x 5]`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PoolVotingThresholds {
    pub motion_no_confidence: UnitInterval,
    pub committee_normal: UnitInterval,
    pub committee_no_confidence: UnitInterval,
    pub hard_fork_initiation: UnitInterval,
    pub security_voting_threshold: UnitInterval,
}

impl Fragment for PoolVotingThresholds {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("PoolVotingThresholds", reader, 5)?;
        let result = Self {
            motion_no_confidence: UnitInterval::from_cbor(reader)?,
            committee_normal: UnitInterval::from_cbor(reader)?,
            committee_no_confidence: UnitInterval::from_cbor(reader)?,
            hard_fork_initiation: UnitInterval::from_cbor(reader)?,
            security_voting_threshold: UnitInterval::from_cbor(reader)?,
        };
        cardano_cbor::validate_end_array("PoolVotingThresholds", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(5);
        self.motion_no_confidence.to_cbor(writer)?;
        self.committee_normal.to_cbor(writer)?;
        self.committee_no_confidence.to_cbor(writer)?;
        self.hard_fork_initiation.to_cbor(writer)?;
        self.security_voting_threshold.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `drep_voting_thresholds = [unit_interval x 10]`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DRepVotingThresholds {
    pub motion_no_confidence: UnitInterval,
    pub committee_normal: UnitInterval,
    pub committee_no_confidence: UnitInterval,
    pub update_constitution: UnitInterval,
    pub hard_fork_initiation: UnitInterval,
    pub pp_network_group: UnitInterval,
    pub pp_economic_group: UnitInterval,
    pub pp_technical_group: UnitInterval,
    pub pp_governance_group: UnitInterval,
    pub treasury_withdrawal: UnitInterval,
}

impl Fragment for DRepVotingThresholds {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("DRepVotingThresholds", reader, 10)?;
        let result = Self {
            motion_no_confidence: UnitInterval::from_cbor(reader)?,
            committee_normal: UnitInterval::from_cbor(reader)?,
            committee_no_confidence: UnitInterval::from_cbor(reader)?,
            update_constitution: UnitInterval::from_cbor(reader)?,
            hard_fork_initiation: UnitInterval::from_cbor(reader)?,
            pp_network_group: UnitInterval::from_cbor(reader)?,
            pp_economic_group: UnitInterval::from_cbor(reader)?,
            pp_technical_group: UnitInterval::from_cbor(reader)?,
            pp_governance_group: UnitInterval::from_cbor(reader)?,
            treasury_withdrawal: UnitInterval::from_cbor(reader)?,
        };
        cardano_cbor::validate_end_array("DRepVotingThresholds", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(10);
        self.motion_no_confidence.to_cbor(writer)?;
        self.committee_normal.to_cbor(writer)?;
        self.committee_no_confidence.to_cbor(writer)?;
        self.update_constitution.to_cbor(writer)?;
        self.hard_fork_initiation.to_cbor(writer)?;
        self.pp_network_group.to_cbor(writer)?;
        self.pp_economic_group.to_cbor(writer)?;
        self.pp_technical_group.to_cbor(writer)?;
        self.pp_governance_group.to_cbor(writer)?;
        self.treasury_withdrawal.to_cbor(writer)?;
        writer.write_end_array();
        Ok(())
    }
}

/// `protocol_param_update = { ? 0 => uint, ? 1 => uint, ..., ? 33 =>
/// unit_interval }`, a sparse keyed map over small integers 0..33 (with a
/// gap at 12..15, retired alongside the fields the Conway era dropped).
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ProtocolParamUpdate {
    pub minfee_a: Option<u64>,
    pub minfee_b: Option<u64>,
    pub max_block_body_size: Option<u64>,
    pub max_transaction_size: Option<u64>,
    pub max_block_header_size: Option<u64>,
    pub key_deposit: Option<Coin>,
    pub pool_deposit: Option<Coin>,
    pub maximum_epoch: Option<Epoch>,
    pub desired_number_of_stake_pools: Option<u64>,
    pub pool_pledge_influence: Option<UnitInterval>,
    pub expansion_rate: Option<UnitInterval>,
    pub treasury_growth_rate: Option<UnitInterval>,
    pub min_pool_cost: Option<Coin>,
    pub ada_per_utxo_byte: Option<Coin>,
    pub cost_models_for_script_languages: Option<CostModels>,
    pub execution_costs: Option<ExUnitPrices>,
    pub max_tx_ex_units: Option<ExUnits>,
    pub max_block_ex_units: Option<ExUnits>,
    pub max_value_size: Option<u64>,
    pub collateral_percentage: Option<u64>,
    pub max_collateral_inputs: Option<u64>,
    pub pool_voting_thresholds: Option<PoolVotingThresholds>,
    pub drep_voting_thresholds: Option<DRepVotingThresholds>,
    pub min_committee_size: Option<u64>,
    pub committee_term_limit: Option<Epoch>,
    pub governance_action_validity_period: Option<Epoch>,
    pub governance_action_deposit: Option<Coin>,
    pub drep_deposit: Option<Coin>,
    pub drep_inactivity_period: Option<Epoch>,
    pub minfee_refscript_cost_per_byte: Option<UnitInterval>,
}

impl Fragment for ProtocolParamUpdate {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_map()?;
        let mut update = Self::default();
        let mut seen = BTreeSet::new();

        let mut read_field = |reader: &mut Reader| -> Result<()> {
            let key = reader.read_uint()?;
            if !seen.insert(key) {
                return Err(LedgerError::DuplicatedCborMapKey(key));
            }
            match key {
                0 => update.minfee_a = Some(reader.read_uint()?),
                1 => update.minfee_b = Some(reader.read_uint()?),
                2 => update.max_block_body_size = Some(reader.read_uint()?),
                3 => update.max_transaction_size = Some(reader.read_uint()?),
                4 => update.max_block_header_size = Some(reader.read_uint()?),
                5 => update.key_deposit = Some(reader.read_uint()?),
                6 => update.pool_deposit = Some(reader.read_uint()?),
                7 => update.maximum_epoch = Some(reader.read_uint()?),
                8 => update.desired_number_of_stake_pools = Some(reader.read_uint()?),
                9 => update.pool_pledge_influence = Some(UnitInterval::from_cbor(reader)?),
                10 => update.expansion_rate = Some(UnitInterval::from_cbor(reader)?),
                11 => update.treasury_growth_rate = Some(UnitInterval::from_cbor(reader)?),
                16 => update.min_pool_cost = Some(reader.read_uint()?),
                17 => update.ada_per_utxo_byte = Some(reader.read_uint()?),
                18 => {
                    update.cost_models_for_script_languages = Some(CostModels::from_cbor(reader)?)
                }
                19 => update.execution_costs = Some(ExUnitPrices::from_cbor(reader)?),
                20 => update.max_tx_ex_units = Some(ExUnits::from_cbor(reader)?),
                21 => update.max_block_ex_units = Some(ExUnits::from_cbor(reader)?),
                22 => update.max_value_size = Some(reader.read_uint()?),
                23 => update.collateral_percentage = Some(reader.read_uint()?),
                24 => update.max_collateral_inputs = Some(reader.read_uint()?),
                25 => update.pool_voting_thresholds = Some(PoolVotingThresholds::from_cbor(reader)?),
                26 => update.drep_voting_thresholds = Some(DRepVotingThresholds::from_cbor(reader)?),
                27 => update.min_committee_size = Some(reader.read_uint()?),
                28 => update.committee_term_limit = Some(reader.read_uint()?),
                29 => update.governance_action_validity_period = Some(reader.read_uint()?),
                30 => update.governance_action_deposit = Some(reader.read_uint()?),
                31 => update.drep_deposit = Some(reader.read_uint()?),
                32 => update.drep_inactivity_period = Some(reader.read_uint()?),
                33 => {
                    update.minfee_refscript_cost_per_byte = Some(UnitInterval::from_cbor(reader)?)
                }
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
        Ok(update)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        let mut count = 0u64;
        macro_rules! count_if_present {
            ($field:expr) => {
                if $field.is_some() {
                    count += 1;
                }
            };
        }
        count_if_present!(self.minfee_a);
        count_if_present!(self.minfee_b);
        count_if_present!(self.max_block_body_size);
        count_if_present!(self.max_transaction_size);
        count_if_present!(self.max_block_header_size);
        count_if_present!(self.key_deposit);
        count_if_present!(self.pool_deposit);
        count_if_present!(self.maximum_epoch);
        count_if_present!(self.desired_number_of_stake_pools);
        count_if_present!(self.pool_pledge_influence);
        count_if_present!(self.expansion_rate);
        count_if_present!(self.treasury_growth_rate);
        count_if_present!(self.min_pool_cost);
        count_if_present!(self.ada_per_utxo_byte);
        count_if_present!(self.cost_models_for_script_languages);
        count_if_present!(self.execution_costs);
        count_if_present!(self.max_tx_ex_units);
        count_if_present!(self.max_block_ex_units);
        count_if_present!(self.max_value_size);
        count_if_present!(self.collateral_percentage);
        count_if_present!(self.max_collateral_inputs);
        count_if_present!(self.pool_voting_thresholds);
        count_if_present!(self.drep_voting_thresholds);
        count_if_present!(self.min_committee_size);
        count_if_present!(self.committee_term_limit);
        count_if_present!(self.governance_action_validity_period);
        count_if_present!(self.governance_action_deposit);
        count_if_present!(self.drep_deposit);
        count_if_present!(self.drep_inactivity_period);
        count_if_present!(self.minfee_refscript_cost_per_byte);

        writer.write_start_map(count);
        macro_rules! emit_uint {
            ($key:expr, $field:expr) => {
                if let Some(value) = $field {
                    writer.write_uint($key);
                    writer.write_uint(value);
                }
            };
        }
        macro_rules! emit_fragment {
            ($key:expr, $field:expr) => {
                if let Some(value) = &$field {
                    writer.write_uint($key);
                    value.to_cbor(writer)?;
                }
            };
        }
        emit_uint!(0, self.minfee_a);
        emit_uint!(1, self.minfee_b);
        emit_uint!(2, self.max_block_body_size);
        emit_uint!(3, self.max_transaction_size);
        emit_uint!(4, self.max_block_header_size);
        emit_uint!(5, self.key_deposit);
        emit_uint!(6, self.pool_deposit);
        emit_uint!(7, self.maximum_epoch);
        emit_uint!(8, self.desired_number_of_stake_pools);
        emit_fragment!(9, self.pool_pledge_influence);
        emit_fragment!(10, self.expansion_rate);
        emit_fragment!(11, self.treasury_growth_rate);
        emit_uint!(16, self.min_pool_cost);
        emit_uint!(17, self.ada_per_utxo_byte);
        emit_fragment!(18, self.cost_models_for_script_languages);
        emit_fragment!(19, self.execution_costs);
        emit_fragment!(20, self.max_tx_ex_units);
        emit_fragment!(21, self.max_block_ex_units);
        emit_uint!(22, self.max_value_size);
        emit_uint!(23, self.collateral_percentage);
        emit_uint!(24, self.max_collateral_inputs);
        emit_fragment!(25, self.pool_voting_thresholds);
        emit_fragment!(26, self.drep_voting_thresholds);
        emit_uint!(27, self.min_committee_size);
        emit_uint!(28, self.committee_term_limit);
        emit_uint!(29, self.governance_action_validity_period);
        emit_uint!(30, self.governance_action_deposit);
        emit_uint!(31, self.drep_deposit);
        emit_uint!(32, self.drep_inactivity_period);
        emit_fragment!(33, self.minfee_refscript_cost_per_byte);
        writer.write_end_map();
        Ok(())
    }
}

/// `update = [{ * genesishash => protocol_param_update }, epoch]`
#[derive(Debug, PartialEq, Clone)]
pub struct Update {
    pub proposed_protocol_parameter_updates: crate::SortedMap<Vec<u8>, ProtocolParamUpdate>,
    pub epoch: Epoch,
}

impl Fragment for Update {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        cardano_cbor::validate_array_of_n_elements("Update", reader, 2)?;
        let proposed_protocol_parameter_updates =
            crate::SortedMap::<Vec<u8>, ProtocolParamUpdate>::from_cbor(reader)?;
        let epoch = reader.read_uint()?;
        cardano_cbor::validate_end_array("Update", reader)?;
        Ok(Self {
            proposed_protocol_parameter_updates,
            epoch,
        })
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_array(2);
        self.proposed_protocol_parameter_updates.to_cbor(writer)?;
        writer.write_uint(self.epoch);
        writer.write_end_array();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_update_round_trips_with_gaps() {
        let mut original = ProtocolParamUpdate::default();
        original.minfee_a = Some(44);
        original.max_value_size = Some(5000);
        original.expansion_rate = Some(UnitInterval::new(3, 10));

        let bytes = original.encode_fragment().unwrap();
        let decoded = ProtocolParamUpdate::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let bytes = {
            let mut writer = Writer::new();
            writer.write_start_map(1);
            writer.write_uint(200);
            writer.write_uint(1);
            writer.write_end_map();
            writer.encode()
        };
        let err = ProtocolParamUpdate::decode_fragment(&bytes).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCborMapKey(200)));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let bytes = {
            let mut writer = Writer::new();
            writer.write_start_map(2);
            writer.write_uint(0);
            writer.write_uint(1);
            writer.write_uint(0);
            writer.write_uint(2);
            writer.write_end_map();
            writer.encode()
        };
        let err = ProtocolParamUpdate::decode_fragment(&bytes).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatedCborMapKey(0)));
    }

    #[test]
    fn cost_models_keeps_unrecognized_language_in_unknown_bucket() {
        let mut models = CostModels::default();
        models.plutus_v1 = Some(vec![1, 2, 3]);
        models.unknown.insert(7, vec![9, 9]);
        let bytes = models.encode_fragment().unwrap();
        let decoded = CostModels::decode_fragment(&bytes).unwrap();
        assert_eq!(decoded.unknown.get(&7), Some(&vec![9, 9]));
    }
}
