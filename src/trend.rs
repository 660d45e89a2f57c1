//! TDEE estimation by tuned double exponential smoothing (algorithm V2).
//!
//! Weight and calories each get their own linear exponential smoother. The
//! smoothing constant of each is chosen by golden-section search over the
//! one-step-ahead squared prediction error of a full replay.

use serde::Serialize;

use crate::domain::{CAL_FAT, Series};
use crate::golden::{OptimizeError, golden_section_search};
use crate::les::{replay, replay_sse, slow_rate};

/// Fastest smoothing constant considered (about a three-day memory).
pub const FAST_LR: f64 = 1.0 / 3.0;

/// Gap used to pair [`FAST_LR`] with the slowest constant considered.
const SLOW_LR_GAP: f64 = 90.0;

/// Search tolerance for the smoothing constant.
pub const LR_TOLERANCE: f64 = 1e-4;

/// Slowest smoothing constant considered.
pub fn slow_lr() -> f64 {
    slow_rate(FAST_LR, SLOW_LR_GAP)
}

/// Smoothing constant selected for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TunedRate {
    pub lr: f64,
    /// Replay error at `lr`.
    pub sse: f64,
    /// Objective evaluations spent by the search.
    pub evaluations: usize,
}

/// Output of the smoothing estimator, aligned with the input series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendEstimate {
    /// Trend weight.
    pub trend_weight: Vec<f64>,
    /// Trend weight change per day.
    pub rate: Vec<f64>,
    /// Trend calorie intake.
    pub calorie_trend: Vec<f64>,
    pub tdee: Vec<f64>,
    pub weight_rate: TunedRate,
    pub calorie_rate: TunedRate,
}

/// Picks the smoothing constant minimizing the replay error of `values`.
pub fn tune_rate(times: &[f64], values: &[f64]) -> Result<TunedRate, OptimizeError> {
    let min = golden_section_search(
        |lr| replay_sse(times, values, lr),
        slow_lr(),
        FAST_LR,
        LR_TOLERANCE,
    )?;

    Ok(TunedRate {
        lr: min.x,
        sse: min.fx,
        evaluations: min.evaluations,
    })
}

/// Runs the smoothing estimator over a whole series.
pub fn estimate(series: &Series) -> Result<TrendEstimate, OptimizeError> {
    let times = series.times();
    let weights = series.weights();
    let calories = series.calories();

    // Each replay builds its own smoother, so the two searches share nothing.
    let (weight_rate, calorie_rate) = rayon::join(
        || tune_rate(&times, &weights),
        || tune_rate(&times, &calories),
    );
    let weight_rate = weight_rate?;
    let calorie_rate = calorie_rate?;

    log::debug!(
        "tuned smoothing constants: weight lr={:.4} ({} evals), calories lr={:.4} ({} evals)",
        weight_rate.lr,
        weight_rate.evaluations,
        calorie_rate.lr,
        calorie_rate.evaluations
    );

    let weight_run = replay(&times, &weights, weight_rate.lr);
    let calorie_run = replay(&times, &calories, calorie_rate.lr);

    let tdee = calorie_run
        .level
        .iter()
        .zip(&weight_run.slope)
        .map(|(c, dwdt)| c - dwdt * CAL_FAT)
        .collect();

    Ok(TrendEstimate {
        trend_weight: weight_run.level,
        rate: weight_run.slope,
        calorie_trend: calorie_run.level,
        tdee,
        weight_rate,
        calorie_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    fn series(points: &[(f64, f64, f64)]) -> Series {
        Series::new(
            points
                .iter()
                .map(|&(t, w, c)| Observation::new(t, w, c))
                .collect(),
        )
        .unwrap()
    }

    /// Deterministic pseudo-noise in [-0.5, 0.5).
    fn jitter(i: usize) -> f64 {
        let x = (i as f64 * 12.9898).sin() * 43758.5453;
        x - x.floor() - 0.5
    }

    #[test]
    fn test_bracket_bounds() {
        let slow = slow_lr();
        assert!(approx_eq(slow, (1.0 / 3.0) / 31.0, 1e-15));
        assert!(slow < FAST_LR);
    }

    #[test]
    fn test_three_day_scenario() {
        let s = series(&[(0.0, 80.0, 2500.0), (1.0, 79.8, 2450.0), (2.0, 79.9, 2480.0)]);
        let est = estimate(&s).unwrap();

        assert_eq!(est.trend_weight.len(), 3);
        assert_eq!(est.rate.len(), 3);
        assert_eq!(est.tdee.len(), 3);
        assert!(est.trend_weight.iter().all(|v| v.is_finite()));
        assert!(est.rate.iter().all(|v| v.is_finite()));
        assert!(est.tdee.iter().all(|v| v.is_finite()));
        assert!((79.0..=81.0).contains(&est.trend_weight[2]));
    }

    #[test]
    fn test_tuned_rates_inside_bracket() {
        let points: Vec<(f64, f64, f64)> = (0..60)
            .map(|i| {
                let t = i as f64;
                (t, 85.0 - 0.05 * t + jitter(i), 2300.0 + 300.0 * jitter(i + 1000))
            })
            .collect();
        let est = estimate(&series(&points)).unwrap();

        for rate in [est.weight_rate, est.calorie_rate] {
            assert!(rate.lr >= slow_lr() - LR_TOLERANCE);
            assert!(rate.lr <= FAST_LR + LR_TOLERANCE);
            assert!(rate.sse.is_finite());
        }
    }

    #[test]
    fn test_optimization_is_deterministic() {
        let points: Vec<(f64, f64, f64)> = (0..45)
            .map(|i| {
                let t = i as f64;
                (t, 70.0 + 0.02 * t + jitter(i), 2600.0 + 200.0 * jitter(i + 7))
            })
            .collect();
        let s = series(&points);

        let first = estimate(&s).unwrap();
        let second = estimate(&s).unwrap();
        assert_eq!(first.weight_rate, second.weight_rate);
        assert_eq!(first.calorie_rate, second.calorie_rate);
        assert_eq!(first.tdee, second.tdee);
    }

    #[test]
    fn test_constant_series_converges_to_intake() {
        let points: Vec<(f64, f64, f64)> = (0..30).map(|i| (i as f64, 72.5, 2100.0)).collect();
        let est = estimate(&series(&points)).unwrap();

        for i in 0..points.len() {
            assert!(approx_eq(est.rate[i], 0.0, 1e-6));
            assert!(approx_eq(est.tdee[i], 2100.0, 1e-6));
            assert!(approx_eq(est.trend_weight[i], 72.5, 1e-6));
        }
    }

    #[test]
    fn test_flat_weight_tdee_equals_calorie_trend() {
        let points: Vec<(f64, f64, f64)> = (0..40)
            .map(|i| (i as f64, 80.0, 2400.0 + 250.0 * jitter(i)))
            .collect();
        let est = estimate(&series(&points)).unwrap();

        for (tdee, c) in est.tdee.iter().zip(&est.calorie_trend) {
            assert!(approx_eq(*tdee, *c, 1e-6));
        }
    }

    #[test]
    fn test_weight_gain_lowers_tdee_below_intake() {
        // Gaining 0.05 kg/day on 3000 kcal implies a TDEE near 2615 kcal.
        let points: Vec<(f64, f64, f64)> = (0..150)
            .map(|i| (i as f64, 70.0 + 0.05 * i as f64, 3000.0))
            .collect();
        let est = estimate(&series(&points)).unwrap();

        let last = *est.tdee.last().unwrap();
        assert!(approx_eq(*est.rate.last().unwrap(), 0.05, 1e-3));
        assert!(approx_eq(last, 3000.0 - 0.05 * CAL_FAT, 10.0), "tdee = {}", last);
    }
}
