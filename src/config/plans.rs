use once_cell::sync::Lazy;
use serde::Serialize;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Id of the no-lock plan
pub const FLEXIBLE_PLAN_ID: &str = "0";

/// A named staking policy offered by the dashboard
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StakingPlan {
    pub id: String,
    pub name: String,
    /// Annual percentage yield, whole percent
    pub apy: f64,
    /// Lock length as shown to the user
    pub duration: String,
    pub duration_days: u64,
    /// Percent penalty on early (or flexible) unstake
    pub fee: f64,
    pub features: Vec<String>,
}

impl StakingPlan {
    pub fn is_flexible(&self) -> bool {
        self.id == FLEXIBLE_PLAN_ID
    }

    /// Lock length submitted with the stake transaction
    pub fn duration_seconds(&self) -> u64 {
        self.duration_days * SECONDS_PER_DAY
    }

    /// Estimated reward for holding `amount` for one year under this plan
    pub fn projected_yearly_reward(&self, amount: f64) -> f64 {
        if amount > 0.0 {
            amount * (self.apy / 100.0)
        } else {
            0.0
        }
    }
}

fn plan(id: &str, name: &str, apy: f64, duration: &str, days: u64, fee: f64, features: &[&str]) -> StakingPlan {
    StakingPlan {
        id: id.to_string(),
        name: name.to_string(),
        apy,
        duration: duration.to_string(),
        duration_days: days,
        fee,
        features: features.iter().map(|f| f.to_string()).collect(),
    }
}

// Ordered by id; exactly one entry uses FLEXIBLE_PLAN_ID
static STAKING_PLANS: Lazy<Vec<StakingPlan>> = Lazy::new(|| {
    vec![
        plan(
            "0",
            "Flexible",
            5.0,
            "No Lock",
            0,
            5.0,
            &["Unstake anytime", "Rewards accrue every block", "5% fee on unstake"],
        ),
        plan(
            "1",
            "Bronze",
            12.0,
            "30 Days",
            30,
            10.0,
            &["30 day lock", "1.2x reward multiplier", "10% early exit fee"],
        ),
        plan(
            "2",
            "Silver",
            20.0,
            "90 Days",
            90,
            15.0,
            &["90 day lock", "1.5x reward multiplier", "15% early exit fee"],
        ),
        plan(
            "3",
            "Gold",
            35.0,
            "180 Days",
            180,
            20.0,
            &["180 day lock", "2.0x reward multiplier", "20% early exit fee", "Priority governance weight"],
        ),
    ]
});

/// Every plan, in id order
pub fn all_plans() -> &'static [StakingPlan] {
    &STAKING_PLANS
}

pub fn plan_by_id(id: &str) -> Option<&'static StakingPlan> {
    STAKING_PLANS.iter().find(|p| p.id == id)
}

pub fn flexible_plan() -> &'static StakingPlan {
    STAKING_PLANS
        .iter()
        .find(|p| p.is_flexible())
        .unwrap_or(&STAKING_PLANS[0])
}

/// Map a recorded lock length back to the plan it was staked under.
///
/// The day count is compared as text against each plan's declared days, so
/// fractional day counts never match. Unmatched durations belong to the
/// flexible plan.
pub fn plan_for_duration_seconds(seconds: u64) -> &'static StakingPlan {
    let days = (seconds as f64 / SECONDS_PER_DAY as f64).to_string();
    STAKING_PLANS
        .iter()
        .find(|p| p.duration_days.to_string() == days)
        .unwrap_or_else(flexible_plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique_with_one_flexible() {
        let ids: HashSet<&str> = all_plans().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), all_plans().len());
        assert_eq!(all_plans().iter().filter(|p| p.id == FLEXIBLE_PLAN_ID).count(), 1);
    }

    #[test]
    fn test_exact_durations_match() {
        assert_eq!(plan_for_duration_seconds(30 * SECONDS_PER_DAY).id, "1");
        assert_eq!(plan_for_duration_seconds(90 * SECONDS_PER_DAY).id, "2");
        assert_eq!(plan_for_duration_seconds(180 * SECONDS_PER_DAY).id, "3");
        assert_eq!(plan_for_duration_seconds(0).id, "0");
    }

    #[test]
    fn test_unmatched_durations_fall_back_to_flexible() {
        for seconds in [1, 86_399, 86_400, 45 * SECONDS_PER_DAY, 30 * SECONDS_PER_DAY + 1, u64::MAX] {
            let plan = plan_for_duration_seconds(seconds);
            assert!(plan.is_flexible(), "{} seconds mapped to {}", seconds, plan.id);
        }
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let first = plan_for_duration_seconds(90 * SECONDS_PER_DAY);
        let second = plan_for_duration_seconds(90 * SECONDS_PER_DAY);
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_by_id_and_seconds() {
        let bronze = plan_by_id("1").unwrap();
        assert_eq!(bronze.duration_seconds(), 2_592_000);
        assert!(plan_by_id("9").is_none());
        assert_eq!(flexible_plan().duration_seconds(), 0);
    }

    #[test]
    fn test_projected_yearly_reward() {
        let silver = plan_by_id("2").unwrap();
        assert_eq!(silver.projected_yearly_reward(1000.0), 200.0);
        assert_eq!(silver.projected_yearly_reward(-5.0), 0.0);
    }
}
