//! Calorie recommendation toward a goal weight.

use serde::Serialize;

use crate::domain::CAL_FAT;

/// Largest weight change aimed for per day, as a fraction of current weight.
pub const MAX_DAILY_WEIGHT_FRACTION: f64 = 0.0005;

/// Largest calorie adjustment, as a fraction of the current TDEE.
pub const MAX_TDEE_FRACTION: f64 = 0.25;

/// Suggested intake for moving toward the goal weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub goal_weight: f64,
    /// Suggested daily calories.
    pub calories: f64,
    /// Expected weight change per week at the suggested intake.
    pub weekly_change: f64,
}

/// Computes a bounded calorie target.
///
/// The weight gap is first clamped to ±0.05% of `latest_weight`, converted to
/// calories, and the result clamped again to ±25% of `latest_tdee`.
/// Returns `None` when no goal is set or the latest estimates are unavailable.
pub fn recommend(
    goal_weight: Option<f64>,
    latest_weight: f64,
    latest_tdee: f64,
) -> Option<Recommendation> {
    let goal_weight = goal_weight?;

    if !(latest_weight.is_finite() && latest_tdee.is_finite()) {
        log::warn!(
            "cannot recommend calories: latest weight {} or TDEE {} unavailable",
            latest_weight,
            latest_tdee
        );
        return None;
    }

    let max_gap = (latest_weight * MAX_DAILY_WEIGHT_FRACTION).abs();
    let gap = (goal_weight - latest_weight).clamp(-max_gap, max_gap);

    let max_delta = (latest_tdee * MAX_TDEE_FRACTION).abs();
    let delta = (gap * CAL_FAT).clamp(-max_delta, max_delta);

    let calories = latest_tdee + delta;
    Some(Recommendation {
        goal_weight,
        calories,
        weekly_change: (calories - latest_tdee) / CAL_FAT * 7.0,
    })
}
