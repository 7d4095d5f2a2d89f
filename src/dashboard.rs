// src/dashboard.rs
//! Derived values for the dashboard and stake form. Everything here is pure.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::plans::{plan_by_id, plan_for_duration_seconds, StakingPlan};
use crate::positions::AccountSnapshot;
use crate::staking::Position;
use crate::units::{format_fixed, parse_display_amount};

pub const STAKED_DATE_LABEL: &str = "Staked Date";
pub const UNLOCK_DATE_LABEL: &str = "Unlock Date";

/// Sum of principal over active positions
pub fn total_staked(positions: &[Position]) -> f64 {
    positions
        .iter()
        .filter(|p| p.active)
        .map(|p| parse_display_amount(&p.amount))
        .sum()
}

pub fn active_count(positions: &[Position]) -> usize {
    positions.iter().filter(|p| p.active).count()
}

/// Mean plan APY over *all* positions, closed ones included.
///
/// Unlike `total_staked` and `active_count` this does not filter on
/// `active`; the dashboard has always shown it this way.
pub fn average_apy(positions: &[Position]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let sum: f64 = positions
        .iter()
        .map(|p| plan_for_duration_seconds(p.duration).apy)
        .sum();
    sum / positions.len() as f64
}

pub fn position_plan(position: &Position) -> &'static StakingPlan {
    plan_for_duration_seconds(position.duration)
}

/// Label of the date column: flexible positions have no unlock date
pub fn date_label(position: &Position) -> &'static str {
    if position_plan(position).is_flexible() {
        STAKED_DATE_LABEL
    } else {
        UNLOCK_DATE_LABEL
    }
}

/// Date shown next to a position, e.g. `"Oct 16, 2026"`
///
/// Flexible positions always show today; their unlock time is not meaningful.
pub fn display_date(position: &Position, now: DateTime<Utc>) -> String {
    let date = if position_plan(position).is_flexible() {
        now
    } else {
        i64::try_from(position.unlock_time)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(now)
    };
    date.format("%b %-d, %Y").to_string()
}

/// Whether to show the "Unlocked" badge
pub fn is_unlocked(position: &Position, now: DateTime<Utc>) -> bool {
    if position_plan(position).is_flexible() {
        return false;
    }
    match i64::try_from(position.unlock_time) {
        Ok(unlock) => unlock < now.timestamp(),
        Err(_) => false,
    }
}

/// `12000` bps becomes `"1.2x"`
pub fn format_multiplier(multiplier_bps: u64) -> String {
    format!("{}x", format_fixed(multiplier_bps as f64 / 10_000.0, 1))
}

/// Claiming is offered only while pending rewards are positive
pub fn can_claim(pending_rewards: &str) -> bool {
    parse_display_amount(pending_rewards) > 0.0
}

pub fn claim_label(pending_rewards: &str, symbol: &str) -> String {
    if can_claim(pending_rewards) {
        format!("Claim {} {}", format_fixed(parse_display_amount(pending_rewards), 4), symbol)
    } else {
        "No Rewards".to_string()
    }
}

/// One row of the positions list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionView {
    pub id: String,
    pub plan_id: String,
    pub plan_name: String,
    pub amount: String,
    pub date_label: String,
    pub date: String,
    pub multiplier: String,
    /// The account-wide pending rewards; the contract has no per-position figure
    pub rewards: String,
    pub unlocked: bool,
    pub can_unstake: bool,
}

impl PositionView {
    pub fn new(position: &Position, pending_rewards: &str, symbol: &str, now: DateTime<Utc>) -> Self {
        let plan = position_plan(position);
        Self {
            id: position.id.clone(),
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            amount: format!("{} {}", format_fixed(parse_display_amount(&position.amount), 2), symbol),
            date_label: date_label(position).to_string(),
            date: display_date(position, now),
            multiplier: format_multiplier(position.multiplier_bps),
            rewards: format!("{} {}", format_fixed(parse_display_amount(pending_rewards), 4), symbol),
            unlocked: is_unlocked(position, now),
            can_unstake: position.active,
        }
    }
}

/// Rows for the positions list; closed positions are not listed
pub fn position_views(snapshot: &AccountSnapshot, symbol: &str, now: DateTime<Utc>) -> Vec<PositionView> {
    snapshot
        .positions
        .iter()
        .filter(|p| p.active)
        .map(|p| PositionView::new(p, &snapshot.pending_rewards, symbol, now))
        .collect()
}

/// Header cards and overview of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_staked: f64,
    pub pending_rewards: String,
    pub balance: String,
    pub active_positions: usize,
    pub total_positions: usize,
    pub average_apy: f64,
    pub can_claim: bool,
}

impl DashboardSummary {
    pub fn from_snapshot(snapshot: &AccountSnapshot) -> Self {
        Self {
            total_staked: total_staked(&snapshot.positions),
            pending_rewards: snapshot.pending_rewards.clone(),
            balance: snapshot.balance.clone(),
            active_positions: active_count(&snapshot.positions),
            total_positions: snapshot.positions.len(),
            average_apy: average_apy(&snapshot.positions),
            can_claim: can_claim(&snapshot.pending_rewards),
        }
    }
}

/// Summary card next to the stake form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeSummary {
    pub amount: f64,
    pub plan_id: String,
    pub plan_name: String,
    pub apy: f64,
    pub duration: String,
    pub fee: f64,
    pub estimated_yearly_reward: f64,
    /// Whether the stake button should be enabled
    pub can_submit: bool,
}

impl StakeSummary {
    /// Returns `None` for an unknown plan id
    pub fn new(amount: &str, plan_id: &str, balance: &str) -> Option<Self> {
        let plan = plan_by_id(plan_id)?;
        let value = parse_display_amount(amount).max(0.0);
        Some(Self {
            amount: value,
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            apy: plan.apy,
            duration: plan.duration.clone(),
            fee: plan.fee,
            estimated_yearly_reward: plan.projected_yearly_reward(value),
            can_submit: value > 0.0 && value <= parse_display_amount(balance),
        })
    }
}
