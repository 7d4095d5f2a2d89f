// src/provider/mod.rs
//! Wallet provider capability (EIP-1193 style `request`)

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::HttpProvider;

/// Trait for anything that can answer wallet/JSON-RPC requests
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Issue a single request and return its result
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Get a display name for the provider
    fn get_name(&self) -> String;

    /// Check if the provider is reachable
    async fn is_available(&self) -> bool;
}
