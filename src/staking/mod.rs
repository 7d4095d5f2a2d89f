// src/staking/mod.rs
//! Staking contract integration

mod client;
#[cfg(test)]
pub(crate) mod mock;
mod types;

pub use client::{ProviderStakingClient, StakingContract};
pub use types::*;
