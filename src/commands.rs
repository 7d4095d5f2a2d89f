// src/commands.rs
//! Write side: stake, unstake and claim.
//!
//! Each command walks `Idle -> Submitting -> Confirmed | Failed` and always
//! resolves to a [`CommandOutcome`]; errors never escape as `Err`. After a
//! confirmed command the account is re-read once through the
//! [`PositionAccessor`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::plans::plan_by_id;
use crate::error::{Result, StakeError};
use crate::positions::{AccountSnapshot, PositionAccessor};
use crate::staking::{Position, StakeResult, StakingContract};
use crate::units::{format_units, parse_units};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandState {
    Idle,
    Submitting,
    Confirmed,
    Failed,
}

/// What a command reports back to the view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    /// Hash of the final transaction, when one was mined
    pub tx_hash: Option<String>,
    /// Account state read after a confirmed command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed: Option<AccountSnapshot>,
}

impl CommandOutcome {
    fn confirmed(message: String, tx_hash: String, refreshed: AccountSnapshot) -> Self {
        Self {
            success: true,
            message,
            tx_hash: Some(tx_hash),
            refreshed: Some(refreshed),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            tx_hash: None,
            refreshed: None,
        }
    }
}

/// Keeps one command instance from being submitted twice at once
#[derive(Debug)]
pub struct CommandGuard {
    state: Mutex<CommandState>,
}

impl Default for CommandGuard {
    fn default() -> Self {
        Self {
            state: Mutex::new(CommandState::Idle),
        }
    }
}

impl CommandGuard {
    pub fn state(&self) -> CommandState {
        *self.state.lock()
    }

    /// Whether the control driving this command should be disabled
    pub fn is_busy(&self) -> bool {
        self.state() == CommandState::Submitting
    }

    fn begin(&self) -> bool {
        let mut state = self.state.lock();
        if *state == CommandState::Submitting {
            return false;
        }
        *state = CommandState::Submitting;
        true
    }

    fn finish(&self, success: bool) {
        *self.state.lock() = if success {
            CommandState::Confirmed
        } else {
            CommandState::Failed
        };
    }
}

pub struct CommandLayer {
    contract: Arc<dyn StakingContract>,
    accessor: Arc<PositionAccessor>,
    token_symbol: String,
    stake_guard: CommandGuard,
    unstake_guard: CommandGuard,
    claim_guard: CommandGuard,
}

impl CommandLayer {
    pub fn new(
        contract: Arc<dyn StakingContract>,
        accessor: Arc<PositionAccessor>,
        token_symbol: &str,
    ) -> Self {
        Self {
            contract,
            accessor,
            token_symbol: token_symbol.to_string(),
            stake_guard: CommandGuard::default(),
            unstake_guard: CommandGuard::default(),
            claim_guard: CommandGuard::default(),
        }
    }

    pub fn stake_state(&self) -> CommandState {
        self.stake_guard.state()
    }

    pub fn unstake_state(&self) -> CommandState {
        self.unstake_guard.state()
    }

    pub fn claim_state(&self) -> CommandState {
        self.claim_guard.state()
    }

    /// Approve the staking contract for `amount`, then stake it under `plan_id`
    pub async fn stake(&self, account: &str, amount: &str, plan_id: &str) -> CommandOutcome {
        if !self.stake_guard.begin() {
            return CommandOutcome::failed("A stake is already being submitted".to_string());
        }

        let outcome = match self.try_stake(account, amount, plan_id).await {
            Ok(result) => {
                let plan_name = plan_by_id(plan_id).map(|p| p.name.as_str()).unwrap_or(plan_id);
                log::info!("Stake confirmed: {}", result.stake_tx);
                let refreshed = self.accessor.refresh(account).await;
                CommandOutcome::confirmed(
                    format!(
                        "Staked {} {} in the {} plan",
                        format_units(result.amount),
                        self.token_symbol,
                        plan_name
                    ),
                    result.stake_tx,
                    refreshed,
                )
            }
            Err(e) => {
                log::error!("Error staking tokens: {}", e);
                CommandOutcome::failed(e.to_string())
            }
        };

        self.stake_guard.finish(outcome.success);
        outcome
    }

    async fn try_stake(&self, account: &str, amount: &str, plan_id: &str) -> Result<StakeResult> {
        let units = parse_units(amount)?;
        if units == 0 {
            return Err(StakeError::InvalidAmount("amount must be greater than zero".to_string()));
        }

        let plan = plan_by_id(plan_id).ok_or_else(|| StakeError::UnknownPlan(plan_id.to_string()))?;

        let balance = self.contract.balance_of(account).await?;
        if units > balance {
            return Err(StakeError::InsufficientBalance {
                available: format_units(balance),
                requested: format_units(units),
            });
        }

        let approve_tx = self.contract.approve(account, units).await?;
        self.contract.wait_for_transaction(&approve_tx).await?;

        let duration_seconds = plan.duration_seconds();
        let stake_tx = self.contract.stake(account, units, duration_seconds).await?;
        self.contract.wait_for_transaction(&stake_tx).await?;

        Ok(StakeResult {
            approve_tx,
            stake_tx,
            amount: units,
            duration_seconds,
        })
    }

    /// Unstake `position_id`; `known` is the last position list shown to the user
    pub async fn unstake(&self, account: &str, position_id: &str, known: &[Position]) -> CommandOutcome {
        if !self.unstake_guard.begin() {
            return CommandOutcome::failed("An unstake is already being submitted".to_string());
        }

        let outcome = match self.try_unstake(account, position_id, known).await {
            Ok(tx) => {
                let refreshed = self.accessor.refresh(account).await;
                CommandOutcome::confirmed(format!("Unstaked position {}", position_id), tx, refreshed)
            }
            Err(e) => {
                log::error!("Error unstaking tokens: {}", e);
                CommandOutcome::failed(e.to_string())
            }
        };

        self.unstake_guard.finish(outcome.success);
        outcome
    }

    async fn try_unstake(&self, account: &str, position_id: &str, known: &[Position]) -> Result<String> {
        let active = known.iter().any(|p| p.id == position_id && p.active);
        if !active {
            return Err(StakeError::PositionNotActive(position_id.to_string()));
        }
        let id: u64 = position_id
            .parse()
            .map_err(|_| StakeError::PositionNotActive(position_id.to_string()))?;

        let tx = self.contract.unstake(account, id).await?;
        self.contract.wait_for_transaction(&tx).await?;
        Ok(tx)
    }

    /// Claim all pending rewards
    pub async fn claim(&self, account: &str) -> CommandOutcome {
        if !self.claim_guard.begin() {
            return CommandOutcome::failed("A claim is already being submitted".to_string());
        }

        let outcome = match self.try_claim(account).await {
            Ok(tx) => {
                let refreshed = self.accessor.refresh(account).await;
                CommandOutcome::confirmed("Rewards claimed".to_string(), tx, refreshed)
            }
            Err(e) => {
                log::error!("Error claiming rewards: {}", e);
                CommandOutcome::failed(e.to_string())
            }
        };

        self.claim_guard.finish(outcome.success);
        outcome
    }

    async fn try_claim(&self, account: &str) -> Result<String> {
        let tx = self.contract.claim(account).await?;
        self.contract.wait_for_transaction(&tx).await?;
        Ok(tx)
    }
}
