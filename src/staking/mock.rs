// src/staking/mock.rs
//! In-memory staking contract used by the accessor and command tests

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::plans::{all_plans, SECONDS_PER_DAY};
use crate::error::{Result, StakeError};
use crate::rpc::TransactionReceipt;
use crate::staking::client::StakingContract;
use crate::staking::types::RawPosition;

/// Which call the next injected failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Approve,
    Stake,
    Unstake,
    Claim,
    Reads,
    PositionById,
}

#[derive(Default)]
struct State {
    balances: HashMap<String, u128>,
    allowances: HashMap<String, u128>,
    positions: Vec<(String, RawPosition)>,
    pending: HashMap<String, u128>,
    now: u64,
    next_tx: u64,
    failures: HashMap<Call, StakeError>,
    reverting: Vec<String>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MockStakingContract {
    state: Mutex<State>,
}

impl MockStakingContract {
    pub fn new() -> Self {
        let contract = Self::default();
        contract.state.lock().now = 1_700_000_000;
        contract
    }

    pub fn set_balance(&self, account: &str, units: u128) {
        self.state.lock().balances.insert(account.to_lowercase(), units);
    }

    pub fn balance(&self, account: &str) -> u128 {
        *self.state.lock().balances.get(&account.to_lowercase()).unwrap_or(&0)
    }

    pub fn set_pending(&self, account: &str, units: u128) {
        self.state.lock().pending.insert(account.to_lowercase(), units);
    }

    pub fn insert_position(&self, account: &str, position: RawPosition) {
        self.state.lock().positions.push((account.to_lowercase(), position));
    }

    /// Fail every subsequent `call` with `err`
    pub fn fail(&self, call: Call, err: StakeError) {
        self.state.lock().failures.insert(call, err);
    }

    /// Mine the next submitted transaction as reverted
    pub fn revert_next_transaction(&self) {
        self.revert_transaction(1);
    }

    /// Mine the `nth` transaction from now (1 = next) as reverted
    pub fn revert_transaction(&self, nth: u64) {
        let mut state = self.state.lock();
        let hash = format!("0x{:064x}", state.next_tx + nth);
        state.reverting.push(hash);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    fn enter(&self, call: Call) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn next_hash(state: &mut State) -> String {
        state.next_tx += 1;
        format!("0x{:064x}", state.next_tx)
    }

    fn reverted(state: &State, hash: &str) -> bool {
        state.reverting.iter().any(|h| h == hash)
    }
}

#[async_trait]
impl StakingContract for MockStakingContract {
    async fn balance_of(&self, account: &str) -> Result<u128> {
        self.enter(Call::Reads)?;
        Ok(self.balance(account))
    }

    async fn approve(&self, account: &str, amount: u128) -> Result<String> {
        self.enter(Call::Approve)?;
        let mut state = self.state.lock();
        let hash = Self::next_hash(&mut state);
        if !Self::reverted(&state, &hash) {
            state.allowances.insert(account.to_lowercase(), amount);
        }
        Ok(hash)
    }

    async fn stake(&self, account: &str, amount: u128, duration_seconds: u64) -> Result<String> {
        self.enter(Call::Stake)?;
        let mut state = self.state.lock();
        let hash = Self::next_hash(&mut state);
        if Self::reverted(&state, &hash) {
            return Ok(hash);
        }

        let key = account.to_lowercase();
        let allowance = *state.allowances.get(&key).unwrap_or(&0);
        let balance = *state.balances.get(&key).unwrap_or(&0);
        if allowance < amount || balance < amount || amount == 0 {
            state.reverting.push(hash.clone());
            return Ok(hash);
        }

        state.allowances.insert(key.clone(), allowance - amount);
        state.balances.insert(key.clone(), balance - amount);

        let days = duration_seconds / SECONDS_PER_DAY;
        let plan = all_plans()
            .iter()
            .position(|p| p.duration_days == days)
            .unwrap_or(0) as u64;
        let multiplier_bps = match plan {
            1 => 12_000,
            2 => 15_000,
            3 => 20_000,
            _ => 10_000,
        };
        let id = state.positions.len() as u64 + 1;
        let now = state.now;
        state.positions.push((
            key,
            RawPosition {
                id,
                amount,
                unlock_time: now + duration_seconds,
                multiplier_bps,
                duration: duration_seconds,
                active: true,
                plan,
            },
        ));
        Ok(hash)
    }

    async fn unstake(&self, account: &str, position_id: u64) -> Result<String> {
        self.enter(Call::Unstake)?;
        let mut state = self.state.lock();
        let hash = Self::next_hash(&mut state);
        let key = account.to_lowercase();

        let found = state
            .positions
            .iter_mut()
            .find(|(owner, p)| *owner == key && p.id == position_id && p.active)
            .map(|(_, p)| {
                p.active = false;
                p.amount
            });
        match found {
            Some(amount) => {
                *state.balances.entry(key).or_insert(0) += amount;
            }
            None => state.reverting.push(hash.clone()),
        }
        Ok(hash)
    }

    async fn claim(&self, account: &str) -> Result<String> {
        self.enter(Call::Claim)?;
        let mut state = self.state.lock();
        let hash = Self::next_hash(&mut state);
        let key = account.to_lowercase();
        let pending = state.pending.remove(&key).unwrap_or(0);
        *state.balances.entry(key).or_insert(0) += pending;
        Ok(hash)
    }

    async fn user_positions(&self, account: &str) -> Result<Vec<u64>> {
        self.enter(Call::Reads)?;
        let key = account.to_lowercase();
        Ok(self
            .state
            .lock()
            .positions
            .iter()
            .filter(|(owner, _)| *owner == key)
            .map(|(_, p)| p.id)
            .collect())
    }

    async fn position(&self, position_id: u64) -> Result<RawPosition> {
        self.enter(Call::PositionById)?;
        self.state
            .lock()
            .positions
            .iter()
            .find(|(_, p)| p.id == position_id)
            .map(|(_, p)| *p)
            .ok_or_else(|| StakeError::Read(format!("no position {}", position_id)))
    }

    async fn positions_of(&self, account: &str) -> Result<Vec<RawPosition>> {
        self.enter(Call::Reads)?;
        let key = account.to_lowercase();
        Ok(self
            .state
            .lock()
            .positions
            .iter()
            .filter(|(owner, _)| *owner == key)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn pending_rewards(&self, account: &str) -> Result<u128> {
        self.enter(Call::Reads)?;
        Ok(*self.state.lock().pending.get(&account.to_lowercase()).unwrap_or(&0))
    }

    async fn wait_for_transaction(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        let state = self.state.lock();
        let status = if Self::reverted(&state, tx_hash) { "0x0" } else { "0x1" };
        let receipt = TransactionReceipt {
            transaction_hash: tx_hash.to_string(),
            block_number: Some("0x1".to_string()),
            status: Some(status.to_string()),
        };
        if receipt.succeeded() {
            Ok(receipt)
        } else {
            Err(StakeError::TransactionReverted(
                crate::error::GENERIC_REVERT_MESSAGE.to_string(),
            ))
        }
    }
}
