//! Golden-section search for one-dimensional minimization.
//!
//! The objective is treated as a black box: it may be as expensive as a full
//! filter replay, so each iteration reuses one of the two interior values and
//! only evaluates the objective once.

use thiserror::Error;

/// Inverse golden ratio, (√5 - 1) / 2.
const INV_PHI: f64 = 0.618_033_988_749_894_8;

/// Errors raised when the search is called outside its contract.
#[derive(Debug, Error, PartialEq)]
pub enum OptimizeError {
    #[error("invalid bracket: lower bound {lower} must be finite and below upper bound {upper}")]
    InvalidBracket { lower: f64, upper: f64 },

    #[error("tolerance must be positive and finite: {0}")]
    InvalidTolerance(f64),
}

/// Outcome of a golden-section search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    /// Midpoint of the final bracket.
    pub x: f64,
    /// Objective value at `x`.
    pub fx: f64,
    /// Number of objective evaluations, including the final one at `x`.
    pub evaluations: usize,
}

/// Minimizes `f` on `[lower, upper]`, stopping once the bracket is no wider than `tol`.
///
/// If `f` is not unimodal on the bracket the result is a local minimum.
pub fn golden_section_search<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    tol: f64,
) -> Result<Minimum, OptimizeError>
where
    F: FnMut(f64) -> f64,
{
    if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
        return Err(OptimizeError::InvalidBracket { lower, upper });
    }
    if !tol.is_finite() || tol <= 0.0 {
        return Err(OptimizeError::InvalidTolerance(tol));
    }

    let (mut a, mut b) = (lower, upper);
    let mut c = b - (b - a) * INV_PHI;
    let mut d = a + (b - a) * INV_PHI;
    let mut fc = f(c);
    let mut fd = f(d);
    let mut evaluations = 2;

    while (b - a).abs() > tol {
        if fc < fd {
            // Minimum lies in [a, d]; old c becomes the new d.
            b = d;
            d = c;
            fd = fc;
            c = b - (b - a) * INV_PHI;
            fc = f(c);
        } else {
            // Minimum lies in [c, b]; old d becomes the new c.
            a = c;
            c = d;
            fc = fd;
            d = a + (b - a) * INV_PHI;
            fd = f(d);
        }
        evaluations += 1;
    }

    let x = (a + b) / 2.0;
    let fx = f(x);
    evaluations += 1;

    log::trace!(
        "golden-section search converged to x={:.6} after {} evaluations",
        x,
        evaluations
    );

    Ok(Minimum {
        x,
        fx,
        evaluations,
    })
}
