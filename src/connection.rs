// src/connection.rs
//! The wallet connection a dashboard holds for its whole session.
//!
//! Owns the provider, the account and network state, and the last account
//! snapshot. Reads and commands go through here so that every view sees the
//! same state and `disconnect` clears all of it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;

use crate::abi::{format_quantity, parse_address, parse_quantity};
use crate::commands::{CommandLayer, CommandOutcome};
use crate::config::AppConfig;
use crate::error::{Result, StakeError};
use crate::positions::{AccountSnapshot, PositionAccessor};
use crate::provider::WalletProvider;
use crate::staking::{Position, ProviderStakingClient, StakingContract};

#[derive(Debug, Default)]
struct ConnectionState {
    account: Option<String>,
    chain_id: Option<u64>,
    snapshot: AccountSnapshot,
}

pub struct Web3Connection {
    config: AppConfig,
    provider: Arc<dyn WalletProvider>,
    accessor: Arc<PositionAccessor>,
    commands: CommandLayer,
    state: RwLock<ConnectionState>,
}

impl Web3Connection {
    /// Connection whose contract calls go through `provider`
    pub fn new(config: AppConfig, provider: Arc<dyn WalletProvider>) -> Result<Self> {
        let contract = Arc::new(ProviderStakingClient::new(provider.clone(), &config)?);
        Ok(Self::with_contract(config, provider, contract))
    }

    pub fn with_contract(
        config: AppConfig,
        provider: Arc<dyn WalletProvider>,
        contract: Arc<dyn StakingContract>,
    ) -> Self {
        let accessor = Arc::new(PositionAccessor::new(contract.clone(), config.read_strategy));
        let commands = CommandLayer::new(contract, accessor.clone(), &config.token_symbol);
        Self {
            config,
            provider,
            accessor,
            commands,
            state: RwLock::new(ConnectionState::default()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandLayer {
        &self.commands
    }

    pub fn account(&self) -> Option<String> {
        self.state.read().account.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().account.is_some()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.state.read().chain_id
    }

    pub fn is_on_expected_network(&self) -> bool {
        self.chain_id() == Some(self.config.network.chain_id)
    }

    /// Last snapshot read for the connected account
    pub fn snapshot(&self) -> AccountSnapshot {
        self.state.read().snapshot.clone()
    }

    /// Request accounts from the wallet, check the network and load the account
    pub async fn connect(&self) -> Result<String> {
        if !self.provider.is_available().await {
            return Err(StakeError::Connection(
                "No wallet found. Please install a Web3 wallet".to_string(),
            ));
        }

        let accounts = self
            .provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    StakeError::Connection("User rejected the connection request".to_string())
                } else {
                    StakeError::Connection(e.message)
                }
            })?;

        let account = first_account(&accounts)
            .ok_or_else(|| StakeError::Connection("Wallet returned no accounts".to_string()))?;

        self.adopt_account(&account).await;
        log::info!("Wallet connected: {} via {}", account, self.provider.get_name());
        Ok(account)
    }

    /// Pick up an account the wallet already authorized, without prompting
    pub async fn restore(&self) -> Option<String> {
        let accounts = match self.provider.request("eth_accounts", json!([])).await {
            Ok(accounts) => accounts,
            Err(e) => {
                log::debug!("No previous session: {}", e);
                return None;
            }
        };
        let account = first_account(&accounts)?;
        self.adopt_account(&account).await;
        Some(account)
    }

    async fn adopt_account(&self, account: &str) {
        {
            let mut state = self.state.write();
            state.account = Some(account.to_string());
            state.snapshot = AccountSnapshot::default();
        }

        match self.check_network().await {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("Wrong network, requesting switch to {}", self.config.network.chain_name);
                if let Err(e) = self.switch_network().await {
                    // Stay connected on the wrong network
                    log::warn!("Network switch failed: {}", e);
                }
            }
            Err(e) => log::warn!("Error checking network: {}", e),
        }

        self.refresh().await;
    }

    /// Wallet switched accounts; an empty list means it disconnected us
    pub async fn accounts_changed(&self, accounts: &[String]) {
        match accounts.first() {
            Some(account) => self.adopt_account(account).await,
            None => self.disconnect(),
        }
    }

    /// Forget the account and everything read for it
    pub fn disconnect(&self) {
        let mut state = self.state.write();
        *state = ConnectionState::default();
        log::info!("Wallet disconnected");
    }

    /// Query the wallet's chain and record whether it is the expected one
    pub async fn check_network(&self) -> Result<bool> {
        let chain = self
            .provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| StakeError::Connection(e.message))?;
        let chain_id = chain
            .as_str()
            .ok_or_else(|| StakeError::Connection(format!("unexpected chain id {}", chain)))
            .and_then(|c| parse_quantity(c).map_err(StakeError::from))?;

        self.state.write().chain_id = Some(chain_id);
        Ok(chain_id == self.config.network.chain_id)
    }

    /// Ask the wallet to switch to the expected chain, adding it if unknown
    pub async fn switch_network(&self) -> Result<()> {
        let network = &self.config.network;
        let chain_id_hex = format_quantity(network.chain_id);

        let switched = self
            .provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id_hex }]),
            )
            .await;

        if let Err(e) = switched {
            if !e.is_unrecognized_chain() {
                return Err(self.mismatch());
            }
            self.provider
                .request(
                    "wallet_addEthereumChain",
                    json!([{
                        "chainId": chain_id_hex,
                        "chainName": network.chain_name,
                        "nativeCurrency": {
                            "name": network.currency_name,
                            "symbol": network.currency_symbol,
                            "decimals": network.currency_decimals,
                        },
                        "rpcUrls": [network.rpc_url],
                        "blockExplorerUrls": [network.explorer_url],
                    }]),
                )
                .await
                .map_err(|e| {
                    log::error!("Error adding {} network: {}", network.chain_name, e);
                    self.mismatch()
                })?;
        }

        if self.check_network().await? {
            Ok(())
        } else {
            Err(self.mismatch())
        }
    }

    fn mismatch(&self) -> StakeError {
        StakeError::NetworkMismatch {
            expected: self.config.network.chain_id,
            actual: self.chain_id().unwrap_or(0),
        }
    }

    fn require_account(&self) -> Result<String> {
        let account = self.account().ok_or(StakeError::NotConnected)?;
        parse_address(&account)?;
        Ok(account)
    }

    /// Re-read positions, rewards and balance for the connected account
    pub async fn refresh(&self) -> AccountSnapshot {
        let Some(account) = self.account() else {
            return AccountSnapshot::default();
        };
        let snapshot = self.accessor.refresh(&account).await;
        self.store_snapshot(&account, snapshot.clone());
        snapshot
    }

    fn store_snapshot(&self, account: &str, snapshot: AccountSnapshot) {
        let mut state = self.state.write();
        // The account may have changed while the read was in flight
        if state.account.as_deref() == Some(account) {
            state.snapshot = snapshot;
        }
    }

    pub async fn get_balance(&self) -> String {
        match self.account() {
            Some(account) => self.accessor.fetch_balance(&account).await,
            None => crate::positions::DEFAULT_BALANCE.to_string(),
        }
    }

    pub async fn get_positions(&self) -> Vec<Position> {
        match self.account() {
            Some(account) => self.accessor.fetch_positions(&account).await,
            None => Vec::new(),
        }
    }

    pub async fn get_pending_rewards(&self) -> String {
        match self.account() {
            Some(account) => self.accessor.fetch_pending_rewards(&account).await,
            None => crate::positions::DEFAULT_REWARDS.to_string(),
        }
    }

    pub async fn stake(&self, amount: &str, plan_id: &str) -> CommandOutcome {
        let account = match self.require_account() {
            Ok(account) => account,
            Err(e) => return not_connected(e),
        };
        let outcome = self.commands.stake(&account, amount, plan_id).await;
        self.absorb(&account, &outcome);
        outcome
    }

    pub async fn unstake(&self, position_id: &str) -> CommandOutcome {
        let account = match self.require_account() {
            Ok(account) => account,
            Err(e) => return not_connected(e),
        };
        let known = self.snapshot().positions;
        let outcome = self.commands.unstake(&account, position_id, &known).await;
        self.absorb(&account, &outcome);
        outcome
    }

    pub async fn claim(&self) -> CommandOutcome {
        let account = match self.require_account() {
            Ok(account) => account,
            Err(e) => return not_connected(e),
        };
        let outcome = self.commands.claim(&account).await;
        self.absorb(&account, &outcome);
        outcome
    }

    fn absorb(&self, account: &str, outcome: &CommandOutcome) {
        if let Some(snapshot) = &outcome.refreshed {
            self.store_snapshot(account, snapshot.clone());
        }
    }
}

fn first_account(accounts: &serde_json::Value) -> Option<String> {
    accounts
        .as_array()?
        .first()?
        .as_str()
        .map(|a| a.to_string())
}

fn not_connected(e: StakeError) -> CommandOutcome {
    CommandOutcome {
        success: false,
        message: e.to_string(),
        tx_hash: None,
        refreshed: None,
    }
}
