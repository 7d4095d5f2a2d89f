pub mod plans;

use serde::{Deserialize, Serialize};

use crate::abi::parse_address;
use crate::error::StakeError;

pub const MONAD_CHAIN_ID: u64 = 10143;
pub const MONAD_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const MONAD_EXPLORER_URL: &str = "https://testnet-explorer.monad.xyz";

/// How positions are read from the staking contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// `userPositions(account)` then `positions(id)` for every id
    PerId,
    /// A single `getPosition(account)` returning every position
    Batched,
}

impl std::str::FromStr for ReadStrategy {
    type Err = StakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_id" | "per-id" | "perid" => Ok(ReadStrategy::PerId),
            "batched" | "batch" => Ok(ReadStrategy::Batched),
            other => Err(StakeError::Config(format!("unknown read strategy '{}'", other))),
        }
    }
}

/// Chain the dashboard expects the wallet to be on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: MONAD_CHAIN_ID,
            chain_name: "Monad Testnet".to_string(),
            rpc_url: MONAD_RPC_URL.to_string(),
            explorer_url: MONAD_EXPLORER_URL.to_string(),
            currency_name: "MON".to_string(),
            currency_symbol: "MON".to_string(),
            currency_decimals: 18,
        }
    }
}

/// Staking client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    /// Staking contract address
    pub staking_contract: String,
    /// ERC-20 token staked into the contract
    pub token_contract: String,
    pub token_symbol: String,
    pub read_strategy: ReadStrategy,
    /// Delay between receipt polls while waiting for a transaction
    pub receipt_poll_interval_ms: u64,
    /// Give up waiting for a receipt after this long
    pub receipt_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            staking_contract: String::new(),
            token_contract: String::new(),
            token_symbol: "SPC".to_string(),
            read_strategy: ReadStrategy::PerId,
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_secs: 120,
        }
    }
}

impl AppConfig {
    /// Load configuration from `SUPASTAKE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        let mut network = defaults.network.clone();

        if let Some(url) = var("SUPASTAKE_RPC_URL") {
            network.rpc_url = url;
        }
        if let Some(chain_id) = var("SUPASTAKE_CHAIN_ID").and_then(|v| v.parse().ok()) {
            network.chain_id = chain_id;
        }
        if let Some(name) = var("SUPASTAKE_CHAIN_NAME") {
            network.chain_name = name;
        }

        let read_strategy = match var("SUPASTAKE_READ_STRATEGY") {
            Some(v) => v.parse().unwrap_or_else(|e| {
                log::warn!("{}; using per-id reads", e);
                ReadStrategy::PerId
            }),
            None => defaults.read_strategy,
        };

        Self {
            network,
            staking_contract: var("SUPASTAKE_STAKING_CONTRACT").unwrap_or_default(),
            token_contract: var("SUPASTAKE_TOKEN_CONTRACT").unwrap_or_default(),
            token_symbol: var("SUPASTAKE_TOKEN_SYMBOL").unwrap_or(defaults.token_symbol),
            read_strategy,
            receipt_poll_interval_ms: var("SUPASTAKE_RECEIPT_POLL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.receipt_poll_interval_ms),
            receipt_timeout_secs: var("SUPASTAKE_RECEIPT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.receipt_timeout_secs),
        }
    }

    /// Check that both contract addresses are well formed
    pub fn validate(&self) -> Result<(), StakeError> {
        parse_address(&self.staking_contract)
            .map_err(|e| StakeError::Config(format!("staking contract: {}", e)))?;
        parse_address(&self.token_contract)
            .map_err(|e| StakeError::Config(format!("token contract: {}", e)))?;
        if self.receipt_poll_interval_ms == 0 {
            return Err(StakeError::Config("receipt poll interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
