//! TDEE estimation by recursive weighted least squares (algorithm V1).
//!
//! Exponentially weighted running means of `t`, `w`, `c`, `t²`, `t·w` and
//! `t·c` give a local regression of weight and calories against time at every
//! step. The energy-balance identity turns the two slopes into an
//! instantaneous TDEE, which is smoothed with the same forgetting factor.

use serde::Serialize;

use crate::domain::{CAL_FAT, Observation, Series};
use crate::error::EstimateError;

/// Default forgetting factor (an effective window of about 10.5 days).
pub const DEFAULT_LR: f64 = 1.0 / 10.5;

/// Time variance below which the regression slopes are undefined (days²).
const MIN_TIME_VARIANCE: f64 = 1e-9;

/// Tunables for the regression estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionConfig {
    /// Forgetting factor applied to every running mean, in (0, 1).
    pub lr: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self { lr: DEFAULT_LR }
    }
}

impl RegressionConfig {
    /// Creates a configuration, rejecting rates outside (0, 1).
    pub fn new(lr: f64) -> Result<Self, EstimateError> {
        if !(lr > 0.0 && lr < 1.0) {
            return Err(EstimateError::InvalidRate(lr));
        }
        Ok(Self { lr })
    }
}

/// Running state of the regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionState {
    ta: f64,
    wa: f64,
    ca: f64,
    tta: f64,
    twa: f64,
    tca: f64,
    tdee: f64,
    tdee_var: f64,
    lr: f64,
}

/// Result of absorbing one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionStep {
    /// Running TDEE, NaN when the step's slopes were undefined.
    pub tdee: f64,
    /// Running standard deviation of the TDEE innovations, NaN alongside `tdee`.
    pub tdee_sd: f64,
}

impl RegressionState {
    /// Seeds the running sums from the first observation.
    ///
    /// The mean time is placed `1/√(lr(1-lr))` days before the first sample so
    /// that the implied variance of `t` after the first update equals one day²,
    /// which is what the recursion settles to for daily samples.
    pub fn new(first: &Observation, lr: f64) -> Self {
        let ta = first.t - 1.0 / (lr * (1.0 - lr)).sqrt();
        let wa = first.weight;
        let ca = first.calories;
        Self {
            ta,
            wa,
            ca,
            tta: ta * ta,
            twa: ta * wa,
            tca: ta * ca,
            tdee: ca,
            tdee_var: 0.0,
            lr,
        }
    }

    /// Absorbs one observation and returns the updated state with its output.
    #[must_use]
    pub fn update(self, obs: &Observation) -> (Self, RegressionStep) {
        let lr = self.lr;
        let (t, w, c) = (obs.t, obs.weight, obs.calories);

        let mut next = Self {
            ta: self.ta + lr * (t - self.ta),
            wa: self.wa + lr * (w - self.wa),
            ca: self.ca + lr * (c - self.ca),
            tta: self.tta + lr * (t * t - self.tta),
            twa: self.twa + lr * (t * w - self.twa),
            tca: self.tca + lr * (t * c - self.tca),
            ..self
        };

        let t_var = next.tta - next.ta * next.ta;
        if t_var.abs() < MIN_TIME_VARIANCE {
            log::debug!("time variance collapsed at t={}: {:e}", t, t_var);
            let undefined = RegressionStep {
                tdee: f64::NAN,
                tdee_sd: f64::NAN,
            };
            return (next, undefined);
        }

        let dwdt = (next.twa - next.ta * next.wa) / t_var;
        let dcdt = (next.tca - next.ta * next.ca) / t_var;
        let tdee_inst = next.ca + dcdt * (t - next.ta) - dwdt * CAL_FAT;

        let delta = tdee_inst - next.tdee;
        next.tdee_var += (delta * delta - next.tdee_var) * lr;
        next.tdee += delta * lr;

        let step = RegressionStep {
            tdee: next.tdee,
            tdee_sd: next.tdee_var.sqrt(),
        };
        (next, step)
    }
}

/// Output of the regression estimator, aligned with the input series.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionEstimate {
    pub tdee: Vec<f64>,
    pub tdee_sd: Vec<f64>,
    pub lr: f64,
}

/// Runs the regression estimator over a whole series.
pub fn estimate(series: &Series, config: RegressionConfig) -> RegressionEstimate {
    let observations = series.observations();
    let mut state = RegressionState::new(&observations[0], config.lr);
    let mut tdee = Vec::with_capacity(observations.len());
    let mut tdee_sd = Vec::with_capacity(observations.len());

    for obs in observations {
        let (next, step) = state.update(obs);
        state = next;
        tdee.push(step.tdee);
        tdee_sd.push(step.tdee_sd);
    }

    let undefined = tdee.iter().filter(|v| v.is_nan()).count();
    if undefined > 0 {
        log::warn!(
            "TDEE undefined for {} of {} days (degenerate time variance)",
            undefined,
            tdee.len()
        );
    }

    RegressionEstimate {
        tdee,
        tdee_sd,
        lr: config.lr,
    }
}
