// src/staking/types.rs
//! Staking position types

use serde::{Deserialize, Serialize};

use crate::abi::{decode_bool, decode_u64, decode_uint};
use crate::error::AbiError;
use crate::units::format_units;

/// Position exactly as the contract reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPosition {
    pub id: u64,
    pub amount: u128,
    pub unlock_time: u64,
    pub multiplier_bps: u64,
    pub duration: u64,
    pub active: bool,
    pub plan: u64,
}

impl RawPosition {
    /// Words of `positions(uint256)` and of each `getPosition(address)` element:
    /// `(amount, unlockTime, multiplierBps, duration, active, plan)`
    pub const FIELD_WORDS: usize = 6;

    pub fn decode_fields(id: u64, words: &[u8]) -> Result<Self, AbiError> {
        Ok(Self {
            id,
            amount: decode_uint(words, 0)?,
            unlock_time: decode_u64(words, 1)?,
            multiplier_bps: decode_u64(words, 2)?,
            duration: decode_u64(words, 3)?,
            active: decode_bool(words, 4)?,
            plan: decode_u64(words, 5)?,
        })
    }
}

/// A staking position shaped for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    /// Principal in whole tokens, e.g. `"100.0"`
    pub amount: String,
    pub active: bool,
    /// Lock length recorded at stake time, seconds
    pub duration: u64,
    /// 10000 = 1.0x
    pub multiplier_bps: u64,
    pub plan: u64,
    /// Unix seconds after which unstaking is fee-free
    pub unlock_time: u64,
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Self {
            id: raw.id.to_string(),
            amount: format_units(raw.amount),
            active: raw.active,
            duration: raw.duration,
            multiplier_bps: raw.multiplier_bps,
            plan: raw.plan,
            unlock_time: raw.unlock_time,
        }
    }
}

/// Result of a confirmed stake
#[derive(Debug, Clone)]
pub struct StakeResult {
    pub approve_tx: String,
    pub stake_tx: String,
    pub amount: u128,
    pub duration_seconds: u64,
}
