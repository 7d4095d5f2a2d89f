// src/staking/client.rs
//! Staking contract client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::abi::{
    decode_uint, decode_uint_array, encode_call, format_address, hex_to_bytes, parse_address,
    tuple_array_chunks, Address, Token,
};
use crate::config::AppConfig;
use crate::error::{Result, StakeError};
use crate::provider::WalletProvider;
use crate::rpc::TransactionReceipt;
use crate::staking::types::RawPosition;

const BALANCE_OF: &str = "balanceOf(address)";
const APPROVE: &str = "approve(address,uint256)";
const STAKE: &str = "stake(uint256,uint256)";
const UNSTAKE: &str = "unstake(uint256)";
const CLAIM: &str = "claim()";
const USER_POSITIONS: &str = "userPositions(address)";
const POSITIONS: &str = "positions(uint256)";
const GET_POSITION: &str = "getPosition(address)";
const PENDING_REWARDS: &str = "pendingRewards(address)";

/// Call surface of the token and staking contracts
///
/// Write methods return the transaction hash as soon as the wallet has
/// accepted the transaction; `wait_for_transaction` resolves once it is
/// mined and fails if it reverted.
#[async_trait]
pub trait StakingContract: Send + Sync {
    async fn balance_of(&self, account: &str) -> Result<u128>;

    /// Allow the staking contract to pull `amount` tokens from `account`
    async fn approve(&self, account: &str, amount: u128) -> Result<String>;

    async fn stake(&self, account: &str, amount: u128, duration_seconds: u64) -> Result<String>;

    async fn unstake(&self, account: &str, position_id: u64) -> Result<String>;

    async fn claim(&self, account: &str) -> Result<String>;

    async fn user_positions(&self, account: &str) -> Result<Vec<u64>>;

    async fn position(&self, position_id: u64) -> Result<RawPosition>;

    /// Every position owned by `account` from one `getPosition` call.
    /// Elements carry no id; they line up with `user_positions`.
    async fn positions_of(&self, account: &str) -> Result<Vec<RawPosition>>;

    async fn pending_rewards(&self, account: &str) -> Result<u128>;

    async fn wait_for_transaction(&self, tx_hash: &str) -> Result<TransactionReceipt>;
}

/// Talks to the contracts through a wallet provider
pub struct ProviderStakingClient {
    provider: Arc<dyn WalletProvider>,
    staking_contract: Address,
    token_contract: Address,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl ProviderStakingClient {
    pub fn new(provider: Arc<dyn WalletProvider>, config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            staking_contract: parse_address(&config.staking_contract)?,
            token_contract: parse_address(&config.token_contract)?,
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
        })
    }

    async fn call(&self, to: &Address, data: String) -> Result<Vec<u8>> {
        let result = self
            .provider
            .request(
                "eth_call",
                json!([{ "to": format_address(to), "data": data }, "latest"]),
            )
            .await
            .map_err(StakeError::from_read)?;

        let hex = result
            .as_str()
            .ok_or_else(|| StakeError::Read(format!("unexpected eth_call result: {}", result)))?;
        Ok(hex_to_bytes(hex)?)
    }

    async fn send(&self, from: &str, to: &Address, data: String) -> Result<String> {
        parse_address(from)?;
        let result = self
            .provider
            .request(
                "eth_sendTransaction",
                json!([{ "from": from, "to": format_address(to), "data": data }]),
            )
            .await
            .map_err(StakeError::from_write)?;

        match result {
            Value::String(hash) => Ok(hash),
            other => Err(StakeError::Connection(format!(
                "unexpected eth_sendTransaction result: {}",
                other
            ))),
        }
    }

    fn account_token(account: &str) -> Result<Token> {
        Ok(Token::Address(parse_address(account)?))
    }
}

#[async_trait]
impl StakingContract for ProviderStakingClient {
    async fn balance_of(&self, account: &str) -> Result<u128> {
        let data = encode_call(BALANCE_OF, &[Self::account_token(account)?]);
        let out = self.call(&self.token_contract, data).await?;
        Ok(decode_uint(&out, 0)?)
    }

    async fn approve(&self, account: &str, amount: u128) -> Result<String> {
        let data = encode_call(
            APPROVE,
            &[Token::Address(self.staking_contract), Token::Uint(amount)],
        );
        log::info!("Approving {} units for {}", amount, format_address(&self.staking_contract));
        self.send(account, &self.token_contract, data).await
    }

    async fn stake(&self, account: &str, amount: u128, duration_seconds: u64) -> Result<String> {
        let data = encode_call(
            STAKE,
            &[Token::Uint(amount), Token::Uint(duration_seconds as u128)],
        );
        log::info!("Staking {} units for {}s", amount, duration_seconds);
        self.send(account, &self.staking_contract, data).await
    }

    async fn unstake(&self, account: &str, position_id: u64) -> Result<String> {
        let data = encode_call(UNSTAKE, &[Token::Uint(position_id as u128)]);
        log::info!("Unstaking position {}", position_id);
        self.send(account, &self.staking_contract, data).await
    }

    async fn claim(&self, account: &str) -> Result<String> {
        let data = encode_call(CLAIM, &[]);
        log::info!("Claiming rewards for {}", account);
        self.send(account, &self.staking_contract, data).await
    }

    async fn user_positions(&self, account: &str) -> Result<Vec<u64>> {
        let data = encode_call(USER_POSITIONS, &[Self::account_token(account)?]);
        let out = self.call(&self.staking_contract, data).await?;
        decode_uint_array(&out)?
            .into_iter()
            .map(|id| u64::try_from(id).map_err(|_| StakeError::Read(format!("position id {} out of range", id))))
            .collect()
    }

    async fn position(&self, position_id: u64) -> Result<RawPosition> {
        let data = encode_call(POSITIONS, &[Token::Uint(position_id as u128)]);
        let out = self.call(&self.staking_contract, data).await?;
        Ok(RawPosition::decode_fields(position_id, &out)?)
    }

    async fn positions_of(&self, account: &str) -> Result<Vec<RawPosition>> {
        let ids = self.user_positions(account).await?;
        let data = encode_call(GET_POSITION, &[Self::account_token(account)?]);
        let out = self.call(&self.staking_contract, data).await?;

        let elements = tuple_array_chunks(&out, RawPosition::FIELD_WORDS)?;
        if elements.len() != ids.len() {
            return Err(StakeError::Read(format!(
                "getPosition returned {} positions for {} ids",
                elements.len(),
                ids.len()
            )));
        }
        ids.into_iter()
            .zip(elements)
            .map(|(id, words)| RawPosition::decode_fields(id, words).map_err(StakeError::from))
            .collect()
    }

    async fn pending_rewards(&self, account: &str) -> Result<u128> {
        let data = encode_call(PENDING_REWARDS, &[Self::account_token(account)?]);
        let out = self.call(&self.staking_contract, data).await?;
        Ok(decode_uint(&out, 0)?)
    }

    async fn wait_for_transaction(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        let started = tokio::time::Instant::now();
        loop {
            let result = match self
                .provider
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(result) => result,
                // The transaction may still be mined; keep polling until the timeout
                Err(e) => {
                    log::warn!("Error polling receipt for {}: {}", tx_hash, e);
                    Value::Null
                }
            };

            if !result.is_null() {
                let receipt: TransactionReceipt = serde_json::from_value(result)
                    .map_err(|e| StakeError::Read(format!("malformed receipt: {}", e)))?;
                if receipt.succeeded() {
                    log::debug!("Transaction {} confirmed", tx_hash);
                    return Ok(receipt);
                }
                log::warn!("Transaction {} reverted", tx_hash);
                return Err(StakeError::TransactionReverted(
                    crate::error::GENERIC_REVERT_MESSAGE.to_string(),
                ));
            }

            if started.elapsed() >= self.receipt_timeout {
                return Err(StakeError::ReceiptTimeout(tx_hash.to_string()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
