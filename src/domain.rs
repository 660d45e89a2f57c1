//! Domain types shared by the loader, the estimators and the report.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::EstimateError;

// === Constants ===

/// Energy density of body mass change (kcal per kg).
pub const CAL_FAT: f64 = 7700.0;

/// Unit label for every weight the application reads or prints.
pub const WEIGHT_UNIT: &str = "kg";

/// Fewest observations the estimators accept.
pub const MIN_OBSERVATIONS: usize = 3;

/// Estimation algorithm selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
pub enum Algorithm {
    /// Recursive weighted least squares over weight and calories.
    #[value(name = "v1", alias = "1", alias = "regression")]
    V1,
    /// Double exponential smoothing with tuned smoothing constants.
    #[default]
    #[value(name = "v2", alias = "2", alias = "smoothing")]
    V2,
}

impl Algorithm {
    /// Returns the display name for the algorithm.
    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::V1 => "V1",
            Algorithm::V2 => "V2",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One parsed row of the log file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub weight: f64,
    pub calories: f64,
}

/// A single point handed to the estimators.
///
/// `t` is measured in days since the first record and may skip days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub t: f64,
    pub weight: f64,
    pub calories: f64,
}

impl Observation {
    /// Creates a new observation.
    pub fn new(t: f64, weight: f64, calories: f64) -> Self {
        Self {
            t,
            weight,
            calories,
        }
    }
}

/// Time-ordered observations with at least [`MIN_OBSERVATIONS`] entries.
///
/// Holding a `Series` is the precondition for running either estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Validates and wraps a list of observations.
    pub fn new(observations: Vec<Observation>) -> Result<Self, EstimateError> {
        if observations.len() < MIN_OBSERVATIONS {
            return Err(EstimateError::InsufficientData {
                available: observations.len(),
                required: MIN_OBSERVATIONS,
            });
        }

        for (index, obs) in observations.iter().enumerate() {
            if !(obs.t.is_finite() && obs.weight.is_finite() && obs.calories.is_finite()) {
                return Err(EstimateError::NonFinite { index });
            }
        }

        for (index, pair) in observations.windows(2).enumerate() {
            if pair[1].t < pair[0].t {
                return Err(EstimateError::Unordered {
                    index: index + 1,
                    t: pair[1].t,
                    previous: pair[0].t,
                });
            }
        }

        Ok(Self { observations })
    }

    /// Builds a series from log entries, measuring `t` in days since the first entry.
    pub fn from_entries(entries: &[LogEntry]) -> Result<Self, EstimateError> {
        let Some(first) = entries.first() else {
            return Err(EstimateError::InsufficientData {
                available: 0,
                required: MIN_OBSERVATIONS,
            });
        };

        let observations = entries
            .iter()
            .map(|e| {
                let t = (e.date - first.date).num_days() as f64;
                Observation::new(t, e.weight, e.calories)
            })
            .collect();

        Self::new(observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn times(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.t).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.weight).collect()
    }

    pub fn calories(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.calories).collect()
    }

    /// Returns the most recent observation.
    pub fn last(&self) -> &Observation {
        // Non-empty by construction.
        &self.observations[self.observations.len() - 1]
    }
}
