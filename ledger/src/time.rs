//! Slot/epoch arithmetic against a per-network genesis anchor.
//!
//! The conversion functions are pure and depend only on a small, immutable
//! side table keyed by [`NetworkMagic`]. There is no global state: each call
//! looks up its table entry and computes directly from it.

/// Network identifier, as carried in the Cardano handshake protocol magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkMagic {
    Mainnet,
    Preview,
    Preprod,
    /// The original public testnet, decommissioned. Its slot config carries
    /// a zero slot length, so every conversion against it returns the
    /// sentinel value rather than dividing by zero.
    Testnet,
}

impl NetworkMagic {
    pub const MAINNET_MAGIC: u64 = 764824073;
    pub const PREVIEW_MAGIC: u64 = 2;
    pub const PREPROD_MAGIC: u64 = 1;
    pub const TESTNET_MAGIC: u64 = 1097911063;

    pub fn magic(self) -> u64 {
        match self {
            Self::Mainnet => Self::MAINNET_MAGIC,
            Self::Preview => Self::PREVIEW_MAGIC,
            Self::Preprod => Self::PREPROD_MAGIC,
            Self::Testnet => Self::TESTNET_MAGIC,
        }
    }

    pub fn from_magic(magic: u64) -> Option<Self> {
        match magic {
            Self::MAINNET_MAGIC => Some(Self::Mainnet),
            Self::PREVIEW_MAGIC => Some(Self::Preview),
            Self::PREPROD_MAGIC => Some(Self::Preprod),
            Self::TESTNET_MAGIC => Some(Self::Testnet),
            _ => None,
        }
    }
}

/// Anchor point and slot/epoch granularity for one network.
///
/// `zero_time` and `slot_length` share a unit (seconds, matching the
/// well-known Shelley genesis anchors); the conversion formulas never
/// interpret the unit themselves, so callers are free to use milliseconds
/// consistently instead.
#[derive(Debug, Clone, Copy)]
struct SlotConfig {
    zero_time: u64,
    zero_slot: u64,
    slot_length: u64,
    start_epoch: u64,
    epoch_length_slots: u64,
}

const SENTINEL: u64 = u64::MAX;

fn slot_config(magic: NetworkMagic) -> SlotConfig {
    match magic {
        NetworkMagic::Mainnet => SlotConfig {
            zero_time: 1596059091,
            zero_slot: 4492800,
            slot_length: 1,
            start_epoch: 0,
            epoch_length_slots: 432000,
        },
        NetworkMagic::Preview => SlotConfig {
            zero_time: 1660003200,
            zero_slot: 25260,
            slot_length: 1,
            start_epoch: 0,
            epoch_length_slots: 432000,
        },
        NetworkMagic::Preprod => SlotConfig {
            zero_time: 1654041600,
            zero_slot: 86400,
            slot_length: 1,
            start_epoch: 0,
            epoch_length_slots: 432000,
        },
        NetworkMagic::Testnet => SlotConfig {
            zero_time: 0,
            zero_slot: 0,
            slot_length: 0,
            start_epoch: 0,
            epoch_length_slots: 0,
        },
    }
}

/// `zero_slot + (unix_time − zero_time) / slot_length`.
///
/// Returns [`SENTINEL`] when the network's slot length is zero, or when
/// `unix_time` precedes the network's genesis anchor.
pub fn unix_time_to_slot(magic: NetworkMagic, unix_time: u64) -> u64 {
    let cfg = slot_config(magic);
    if cfg.slot_length == 0 {
        return SENTINEL;
    }
    let Some(elapsed) = unix_time.checked_sub(cfg.zero_time) else {
        return SENTINEL;
    };
    cfg.zero_slot + elapsed / cfg.slot_length
}

/// `zero_time + (slot − zero_slot) * slot_length`.
///
/// Returns [`SENTINEL`] when the network's slot length is zero, or when
/// `slot` precedes the network's genesis anchor slot.
pub fn slot_to_unix_time(magic: NetworkMagic, slot: u64) -> u64 {
    let cfg = slot_config(magic);
    if cfg.slot_length == 0 {
        return SENTINEL;
    }
    let Some(elapsed_slots) = slot.checked_sub(cfg.zero_slot) else {
        return SENTINEL;
    };
    cfg.zero_time + elapsed_slots * cfg.slot_length
}

/// `start_epoch + (unix_time − zero_time) / 1000 / epoch_length_slots`.
///
/// Returns [`SENTINEL`] when the network's epoch length is zero, or when
/// `unix_time` precedes the network's genesis anchor.
pub fn unix_time_to_epoch(magic: NetworkMagic, unix_time: u64) -> u64 {
    let cfg = slot_config(magic);
    if cfg.epoch_length_slots == 0 {
        return SENTINEL;
    }
    let Some(elapsed) = unix_time.checked_sub(cfg.zero_time) else {
        return SENTINEL;
    };
    cfg.start_epoch + elapsed / 1000 / cfg.epoch_length_slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_unix_time_to_slot_matches_shelley_genesis() {
        assert_eq!(unix_time_to_slot(NetworkMagic::Mainnet, 1596059091), 4492800);
    }

    #[test]
    fn mainnet_slot_to_unix_time_one_slot_past_genesis() {
        assert_eq!(slot_to_unix_time(NetworkMagic::Mainnet, 4492801), 1596059092);
    }

    #[test]
    fn testnet_sentinel_on_zero_slot_length() {
        assert_eq!(unix_time_to_slot(NetworkMagic::Testnet, 1660003200), SENTINEL);
        assert_eq!(slot_to_unix_time(NetworkMagic::Testnet, 100), SENTINEL);
        assert_eq!(unix_time_to_epoch(NetworkMagic::Testnet, 1660003200), SENTINEL);
    }

    #[test]
    fn time_before_genesis_is_sentinel_not_underflow() {
        assert_eq!(unix_time_to_slot(NetworkMagic::Mainnet, 0), SENTINEL);
        assert_eq!(slot_to_unix_time(NetworkMagic::Mainnet, 0), SENTINEL);
    }

    #[test]
    fn network_magic_round_trips_through_from_magic() {
        assert_eq!(NetworkMagic::from_magic(NetworkMagic::Mainnet.magic()), Some(NetworkMagic::Mainnet));
        assert_eq!(NetworkMagic::from_magic(NetworkMagic::Preview.magic()), Some(NetworkMagic::Preview));
        assert_eq!(NetworkMagic::from_magic(NetworkMagic::Preprod.magic()), Some(NetworkMagic::Preprod));
        assert_eq!(NetworkMagic::from_magic(NetworkMagic::Testnet.magic()), Some(NetworkMagic::Testnet));
        assert_eq!(NetworkMagic::from_magic(999), None);
    }

    #[test]
    fn preview_and_preprod_anchors_are_self_consistent() {
        assert_eq!(unix_time_to_slot(NetworkMagic::Preview, 1660003200), 25260);
        assert_eq!(unix_time_to_slot(NetworkMagic::Preprod, 1654041600), 86400);
    }
}
