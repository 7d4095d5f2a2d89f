// src/error.rs
//! Error types shared by the provider, contract and command layers

use thiserror::Error;

/// EIP-1193: the user rejected the request
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193: the requested account or method is not authorized
pub const UNAUTHORIZED_CODE: i64 = 4100;
/// MetaMask: the chain has not been added to the wallet
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// Geth style `execution reverted` error code
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// Generic message shown when a revert carries no reason
pub const GENERIC_REVERT_MESSAGE: &str = "Transaction failed on-chain";

/// Error raised by a wallet provider request
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(UNRECOGNIZED_CHAIN_CODE)
    }

    /// Best-effort revert reason carried by the error, if any
    pub fn revert_reason(&self) -> Option<String> {
        if let Some(reason) = self.data.as_ref().and_then(|d| d.as_str()) {
            if let Some(decoded) = crate::abi::decode_revert_reason(reason) {
                return Some(decoded);
            }
        }

        let lower = self.message.to_lowercase();
        if let Some(idx) = lower.find("execution reverted") {
            let rest = self
                .message
                .get(idx + "execution reverted".len()..)
                .unwrap_or_default()
                .trim_start_matches(':')
                .trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
        None
    }

    fn looks_like_revert(&self) -> bool {
        self.code == Some(EXECUTION_REVERTED_CODE)
            || self.message.to_lowercase().contains("revert")
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::new(format!("Failed to send request: {}", e))
    }
}

/// Errors surfaced by the staking client
#[derive(Debug, Clone, Error)]
pub enum StakeError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Wrong network: expected chain {expected}, connected to {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Timed out waiting for transaction {0}")]
    ReceiptTimeout(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: String, requested: String },

    #[error("Unknown staking plan: {0}")]
    UnknownPlan(String),

    #[error("Position {0} is not active")]
    PositionNotActive(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
}

impl StakeError {
    /// Classify a provider error raised while submitting a transaction
    pub fn from_write(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            StakeError::TransactionRejected(err.message)
        } else if err.looks_like_revert() {
            let reason = err
                .revert_reason()
                .unwrap_or_else(|| GENERIC_REVERT_MESSAGE.to_string());
            StakeError::TransactionReverted(reason)
        } else {
            StakeError::Connection(err.message)
        }
    }

    /// Classify a provider error raised by a read-only call
    pub fn from_read(err: ProviderError) -> Self {
        StakeError::Read(err.message)
    }
}

/// Errors from encoding or decoding contract calldata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("return data too short: need {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("value does not fit in 128 bits")]
    Overflow,

    #[error("invalid boolean word")]
    InvalidBool,
}

pub type Result<T> = std::result::Result<T, StakeError>;
