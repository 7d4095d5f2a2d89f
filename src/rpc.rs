// src/rpc.rs
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::abi::parse_quantity;
use crate::error::ProviderError;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
    #[allow(dead_code)]
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for ProviderError {
    fn from(e: RpcErrorObject) -> Self {
        ProviderError {
            code: Some(e.code),
            message: e.message,
            data: e.data,
        }
    }
}

/// Receipt of a mined transaction, as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
    /// `0x1` on success, `0x0` on revert
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => parse_quantity(status).map(|s| s == 1).unwrap_or(false),
            // Pre-Byzantium receipts carry no status
            None => true,
        }
    }
}

/// Plain JSON-RPC 2.0 client over HTTP
pub struct RpcClient {
    url: String,
    http_client: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            http_client: Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and return its `result`
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        log::debug!("rpc -> {} (id {})", method, id);

        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::new(format!("RPC error: {}", response.status())));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to parse response: {}", e)))?;

        parse_response(json)
    }
}

/// Split a raw JSON-RPC response into its result or error
fn parse_response(json: Value) -> Result<Value, ProviderError> {
    let response: RpcResponse = serde_json::from_value(json)
        .map_err(|e| ProviderError::new(format!("Failed to deserialize response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(error.into());
    }

    Ok(response.result.unwrap_or(Value::Null))
}
