// src/provider/http.rs
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::provider::WalletProvider;
use crate::rpc::RpcClient;

/// EIP-1193: the provider does not support the method
pub const UNSUPPORTED_METHOD_CODE: i64 = 4200;

/// Provider backed by a JSON-RPC node that manages the account keys
/// (a local dev node, or a wallet bridge exposing `eth_sendTransaction`).
///
/// Wallet-only methods are answered locally: account requests return the
/// pinned account when one is set, and chain switching is reported as
/// unsupported since a plain node serves exactly one chain.
pub struct HttpProvider {
    rpc: RpcClient,
    account: Option<String>,
}

impl HttpProvider {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc: RpcClient::new(rpc_url),
            account: None,
        }
    }

    /// Pin the account reported by `eth_accounts`/`eth_requestAccounts`
    pub fn with_account(mut self, account: &str) -> Self {
        self.account = Some(account.to_string());
        self
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => match &self.account {
                Some(account) => Ok(json!([account])),
                None => self.rpc.request("eth_accounts", json!([])).await,
            },
            "wallet_switchEthereumChain" | "wallet_addEthereumChain" => Err(ProviderError::with_code(
                UNSUPPORTED_METHOD_CODE,
                format!("{} is not supported by an RPC node", method),
            )),
            _ => self.rpc.request(method, params).await,
        }
    }

    fn get_name(&self) -> String {
        format!("JSON-RPC: {}", self.rpc.url())
    }

    async fn is_available(&self) -> bool {
        self.rpc.request("eth_chainId", json!([])).await.is_ok()
    }
}
