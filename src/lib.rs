//! Client core for the SupaStake staking dashboard.
//!
//! The staking contract owns all balances, rewards and lock rules; this
//! crate reads it through a wallet provider, submits stake/unstake/claim
//! transactions, and derives what the dashboard shows.

pub mod abi;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod error;
pub mod positions;
pub mod provider;
pub mod rpc;
pub mod staking;
pub mod units;

pub use commands::{CommandOutcome, CommandState};
pub use config::plans::{plan_for_duration_seconds, StakingPlan};
pub use config::AppConfig;
pub use connection::Web3Connection;
pub use error::{ProviderError, StakeError};
pub use positions::{AccountSnapshot, PositionAccessor};
pub use staking::{Position, StakingContract};
