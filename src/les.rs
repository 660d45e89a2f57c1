//! Linear exponential smoother.
//!
//! Two exponentially smoothed points are tracked in (time, value) space: a
//! fast one that follows the signal with rate `lr` and a slow one with rate
//! `lr / (1 + LES_GAP * lr)`. The line through both points is the local trend.
//! Smoothing the time stamps alongside the values keeps the trend correct
//! when samples are unevenly spaced.

/// Intrinsic gap between the fast and slow tracking points (days).
pub const LES_GAP: f64 = 7.0;

/// Half-width of the symmetric difference used for the per-day slope.
const HALF_DAY: f64 = 0.5;

/// Below this separation the two tracking times are treated as coincident.
const MIN_TIME_SEPARATION: f64 = 1e-12;

/// Smoother state. Updates return a new value instead of mutating in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Les {
    t1: f64,
    t2: f64,
    x1: f64,
    x2: f64,
    lr: f64,
}

/// Slow-point rate paired with a fast rate `lr` for a given gap.
pub fn slow_rate(lr: f64, gap: f64) -> f64 {
    lr / (1.0 + gap * lr)
}

impl Les {
    /// Seeds the smoother so that a single observation at `(t0, x0)` is
    /// consistent with both tracking points and the initial slope is `dxdt0`.
    pub fn new(t0: f64, x0: f64, dxdt0: f64, lr: f64) -> Self {
        Self {
            t1: t0 - 1.0,
            t2: t0 - 1.0 - LES_GAP,
            x1: x0,
            x2: x0 - LES_GAP * dxdt0,
            lr,
        }
    }

    /// Absorbs the observation `x` at time `t`.
    #[must_use]
    pub fn feed(self, t: f64, x: f64) -> Self {
        let flr = self.lr;
        let slr = slow_rate(flr, LES_GAP);
        Self {
            t1: self.t1 + flr * (t - self.t1),
            t2: self.t2 + slr * (t - self.t2),
            x1: self.x1 + flr * (x - self.x1),
            x2: self.x2 + slr * (x - self.x2),
            lr: flr,
        }
    }

    /// Current slope of the trend line, or NaN when the tracking times coincide.
    pub fn slope(&self) -> f64 {
        let dt = self.t1 - self.t2;
        if dt.abs() < MIN_TIME_SEPARATION {
            return f64::NAN;
        }
        (self.x1 - self.x2) / dt
    }

    /// Evaluates the trend line at `t`, forward or backward of the last feed.
    pub fn predict(&self, t: f64) -> f64 {
        let mx = (self.x1 + self.x2) / 2.0;
        let mt = (self.t1 + self.t2) / 2.0;
        mx + self.slope() * (t - mt)
    }

    /// Change of the trend over one day centred on `t`.
    pub fn daily_change(&self, t: f64) -> f64 {
        self.predict(t + HALF_DAY) - self.predict(t - HALF_DAY)
    }
}

/// Per-observation output of a full replay.
#[derive(Debug, Clone, Default)]
pub struct LesReplay {
    /// Trend value at each observation time, after feeding it.
    pub level: Vec<f64>,
    /// Trend change per day at each observation time.
    pub slope: Vec<f64>,
    /// Sum of squared one-step-ahead prediction errors.
    pub sse: f64,
}

/// Replays a series through a fresh smoother seeded at the first sample.
///
/// Each step predicts before feeding so `sse` measures out-of-sample error.
pub fn replay(times: &[f64], values: &[f64], lr: f64) -> LesReplay {
    let Some((&t0, &x0)) = times.first().zip(values.first()) else {
        return LesReplay::default();
    };

    let mut les = Les::new(t0, x0, 0.0, lr);
    let mut out = LesReplay {
        level: Vec::with_capacity(times.len()),
        slope: Vec::with_capacity(times.len()),
        sse: 0.0,
    };

    for (&t, &x) in times.iter().zip(values) {
        let residual = les.predict(t) - x;
        out.sse += residual * residual;
        les = les.feed(t, x);
        out.level.push(les.predict(t));
        out.slope.push(les.daily_change(t));
    }

    out
}

/// Same objective as [`replay`]`.sse`, without building the output vectors.
pub fn replay_sse(times: &[f64], values: &[f64], lr: f64) -> f64 {
    let Some((&t0, &x0)) = times.first().zip(values.first()) else {
        return 0.0;
    };

    let mut les = Les::new(t0, x0, 0.0, lr);
    let mut sse = 0.0;
    for (&t, &x) in times.iter().zip(values) {
        let residual = les.predict(t) - x;
        sse += residual * residual;
        les = les.feed(t, x);
    }
    sse
}
