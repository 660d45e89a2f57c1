//! TDEE (Total Daily Energy Expenditure) estimation from weight and calorie data.
//!
//! Dispatches a validated [`Series`] to one of the two estimators and derives
//! the goal recommendation from the latest estimate.

use serde::Serialize;

use crate::domain::{Algorithm, Series};
use crate::goal::{Recommendation, recommend};
use crate::golden::OptimizeError;
use crate::regression::{self, RegressionConfig, RegressionEstimate};
use crate::trend::{self, TrendEstimate};

/// Estimator output; the shape depends on the algorithm.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "algorithm", content = "series")]
pub enum TdeeEstimate {
    #[serde(rename = "V1")]
    Regression(RegressionEstimate),
    #[serde(rename = "V2")]
    Trend(TrendEstimate),
}

impl TdeeEstimate {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            TdeeEstimate::Regression(_) => Algorithm::V1,
            TdeeEstimate::Trend(_) => Algorithm::V2,
        }
    }

    /// Per-day TDEE, aligned with the input series.
    pub fn tdee(&self) -> &[f64] {
        match self {
            TdeeEstimate::Regression(est) => &est.tdee,
            TdeeEstimate::Trend(est) => &est.tdee,
        }
    }

    /// Most recent TDEE.
    pub fn latest_tdee(&self) -> f64 {
        self.tdee().last().copied().unwrap_or(f64::NAN)
    }

    /// Weight the goal recommendation starts from.
    ///
    /// V2 uses its trend weight; V1 has none and uses the last logged weight.
    pub fn latest_weight(&self, series: &Series) -> f64 {
        match self {
            TdeeEstimate::Regression(_) => series.last().weight,
            TdeeEstimate::Trend(est) => est.trend_weight.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Full result of one estimation run.
#[derive(Debug, Clone, Serialize)]
pub struct TdeeResult {
    pub estimate: TdeeEstimate,
    pub recommendation: Option<Recommendation>,
}

/// Runs the selected estimator over the series.
pub fn estimate(
    series: &Series,
    algorithm: Algorithm,
    config: RegressionConfig,
) -> Result<TdeeEstimate, OptimizeError> {
    log::info!(
        "estimating TDEE with {} over {} days",
        algorithm,
        series.len()
    );

    let estimate = match algorithm {
        Algorithm::V1 => TdeeEstimate::Regression(regression::estimate(series, config)),
        Algorithm::V2 => TdeeEstimate::Trend(trend::estimate(series)?),
    };

    debug_assert_eq!(estimate.tdee().len(), series.len());
    Ok(estimate)
}

/// Estimates TDEE and, when a goal is set, the calorie recommendation.
pub fn calculate_tdee(
    series: &Series,
    goal_weight: Option<f64>,
    algorithm: Algorithm,
    config: RegressionConfig,
) -> Result<TdeeResult, OptimizeError> {
    let estimate = estimate(series, algorithm, config)?;
    let recommendation = recommend(
        goal_weight,
        estimate.latest_weight(series),
        estimate.latest_tdee(),
    );

    if let Some(rec) = &recommendation {
        log::debug!(
            "goal {:.1}: suggested {:.0} kcal ({:+.2}/week)",
            rec.goal_weight,
            rec.calories,
            rec.weekly_change
        );
    }

    Ok(TdeeResult {
        estimate,
        recommendation,
    })
}
