// src/positions.rs
//! Read side of the dashboard: positions, pending rewards and balance.
//!
//! Every public read here is fail-soft. Staking data is advisory display,
//! so a failed read is logged and replaced by a safe default instead of
//! reaching the caller as an error.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Serialize;

use crate::config::ReadStrategy;
use crate::error::Result;
use crate::staking::{Position, RawPosition, StakingContract};
use crate::units::{format_fixed, format_units, units_to_f64};

/// Pending rewards shown when the read fails
pub const DEFAULT_REWARDS: &str = "0";
/// Balance shown when the read fails
pub const DEFAULT_BALANCE: &str = "0";

/// One consistent-enough view of an account, read after each mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub positions: Vec<Position>,
    /// Account-level pending rewards, four decimals
    pub pending_rewards: String,
    pub balance: String,
}

impl Default for AccountSnapshot {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            pending_rewards: DEFAULT_REWARDS.to_string(),
            balance: DEFAULT_BALANCE.to_string(),
        }
    }
}

impl AccountSnapshot {
    pub fn position(&self, id: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }
}

pub struct PositionAccessor {
    contract: Arc<dyn StakingContract>,
    strategy: ReadStrategy,
}

impl PositionAccessor {
    pub fn new(contract: Arc<dyn StakingContract>, strategy: ReadStrategy) -> Self {
        Self { contract, strategy }
    }

    pub fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    /// Read every position of `account`, failing if any part of the read fails
    pub async fn try_fetch_positions(&self, account: &str) -> Result<Vec<Position>> {
        let raw: Vec<RawPosition> = match self.strategy {
            ReadStrategy::PerId => {
                let ids = self.contract.user_positions(account).await?;
                try_join_all(ids.into_iter().map(|id| self.contract.position(id))).await?
            }
            ReadStrategy::Batched => self.contract.positions_of(account).await?,
        };
        Ok(raw.into_iter().map(Position::from).collect())
    }

    /// Positions of `account`, or an empty list if the read fails
    pub async fn fetch_positions(&self, account: &str) -> Vec<Position> {
        match self.try_fetch_positions(account).await {
            Ok(positions) => {
                log::debug!("Fetched {} positions for {}", positions.len(), account);
                positions
            }
            Err(e) => {
                log::warn!("Error fetching positions for {}: {}", account, e);
                Vec::new()
            }
        }
    }

    /// Pending rewards with four decimals, or `"0"` if the read fails
    pub async fn fetch_pending_rewards(&self, account: &str) -> String {
        match self.contract.pending_rewards(account).await {
            Ok(units) => format_fixed(units_to_f64(units), 4),
            Err(e) => {
                log::warn!("Error fetching pending rewards for {}: {}", account, e);
                DEFAULT_REWARDS.to_string()
            }
        }
    }

    /// Token balance, or `"0"` if the read fails
    pub async fn fetch_balance(&self, account: &str) -> String {
        match self.contract.balance_of(account).await {
            Ok(units) => format_units(units),
            Err(e) => {
                log::warn!("Error fetching balance for {}: {}", account, e);
                DEFAULT_BALANCE.to_string()
            }
        }
    }

    /// Read positions, rewards and balance once; no retries
    pub async fn refresh(&self, account: &str) -> AccountSnapshot {
        let (positions, pending_rewards, balance) = tokio::join!(
            self.fetch_positions(account),
            self.fetch_pending_rewards(account),
            self.fetch_balance(account),
        );
        AccountSnapshot {
            positions,
            pending_rewards,
            balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StakeError;
    use crate::staking::mock::{Call, MockStakingContract};

    const ALICE: &str = "0x00000000000000000000000000000000000000aa";
    const TOKEN: u128 = 1_000_000_000_000_000_000;

    fn raw(id: u64, tokens: u128, active: bool) -> RawPosition {
        RawPosition {
            id,
            amount: tokens * TOKEN,
            unlock_time: 1_700_000_000 + 30 * 86_400,
            multiplier_bps: 12_000,
            duration: 30 * 86_400,
            active,
            plan: 1,
        }
    }

    fn seeded() -> Arc<MockStakingContract> {
        let contract = Arc::new(MockStakingContract::new());
        contract.insert_position(ALICE, raw(1, 100, true));
        contract.insert_position(ALICE, raw(2, 50, false));
        contract.insert_position("0x00000000000000000000000000000000000000bb", raw(3, 7, true));
        contract.set_pending(ALICE, TOKEN / 8);
        contract.set_balance(ALICE, 5 * TOKEN);
        contract
    }

    #[tokio::test]
    async fn test_strategies_produce_the_same_shape() {
        let contract = seeded();
        let per_id = PositionAccessor::new(contract.clone(), ReadStrategy::PerId);
        let batched = PositionAccessor::new(contract.clone(), ReadStrategy::Batched);

        let a = per_id.fetch_positions(ALICE).await;
        let b = batched.fetch_positions(ALICE).await;
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].amount, "100.0");
        assert!(!a[1].active);
        assert_eq!(contract.count(Call::PositionById), 2);
    }

    #[tokio::test]
    async fn test_repeated_reads_are_equal() {
        let accessor = PositionAccessor::new(seeded(), ReadStrategy::PerId);
        let first = accessor.fetch_positions(ALICE).await;
        let second = accessor.fetch_positions(ALICE).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_list_read_yields_empty() {
        let contract = seeded();
        contract.fail(Call::Reads, StakeError::Read("provider offline".to_string()));
        let accessor = PositionAccessor::new(contract, ReadStrategy::PerId);
        assert!(accessor.fetch_positions(ALICE).await.is_empty());
        assert!(accessor.try_fetch_positions(ALICE).await.is_err());
    }

    #[tokio::test]
    async fn test_one_failed_sub_read_fails_the_whole_read() {
        let contract = seeded();
        contract.fail(Call::PositionById, StakeError::Read("timeout".to_string()));
        let accessor = PositionAccessor::new(contract, ReadStrategy::PerId);
        assert!(accessor.fetch_positions(ALICE).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_node_data_yields_empty() {
        use crate::abi::encode_words;
        use crate::config::AppConfig;
        use crate::provider::scripted::ScriptedProvider;
        use crate::staking::ProviderStakingClient;

        let provider = Arc::new(ScriptedProvider::new());
        let garbage = format!("0x{}", hex::encode(encode_words(&[u128::MAX - 31, 1, 4])));
        provider.always("eth_call", Ok(serde_json::json!(garbage)));
        let config = AppConfig {
            staking_contract: "0x00000000000000000000000000000000000000a1".to_string(),
            token_contract: "0x00000000000000000000000000000000000000b2".to_string(),
            ..AppConfig::default()
        };
        let client = Arc::new(ProviderStakingClient::new(provider, &config).unwrap());

        for strategy in [ReadStrategy::PerId, ReadStrategy::Batched] {
            let accessor = PositionAccessor::new(client.clone(), strategy);
            assert!(accessor.fetch_positions(ALICE).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_rewards_and_balance_formatting() {
        let accessor = PositionAccessor::new(seeded(), ReadStrategy::Batched);
        assert_eq!(accessor.fetch_pending_rewards(ALICE).await, "0.1250");
        assert_eq!(accessor.fetch_balance(ALICE).await, "5.0");
    }

    #[tokio::test]
    async fn test_failed_rewards_and_balance_default_to_zero() {
        let contract = seeded();
        contract.fail(Call::Reads, StakeError::Read("provider offline".to_string()));
        let accessor = PositionAccessor::new(contract, ReadStrategy::Batched);
        let snapshot = accessor.refresh(ALICE).await;
        assert_eq!(snapshot, AccountSnapshot::default());
    }
}
