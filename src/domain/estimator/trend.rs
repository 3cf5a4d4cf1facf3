//! Exponential trend estimator.
//!
//! trend[i] = alpha * x[i] + (1 - alpha) * trend[i-1]
//! EMA(n) is the same recurrence with alpha = 2/(n+1).

use crate::domain::error::SimulatorError;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendEstimator {
    trend: f64,
    alpha: f64,
}

impl TrendEstimator {
    pub fn new(initial: f64, alpha: f64) -> Result<Self, SimulatorError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SimulatorError::configuration(
                "TrendEstimator",
                format!("alpha must be in the range (0, 1], got {alpha}"),
            ));
        }
        Ok(TrendEstimator {
            trend: initial,
            alpha,
        })
    }

    /// EMA over `period` observations.
    pub fn ema(period: usize, initial: f64) -> Result<Self, SimulatorError> {
        if period == 0 {
            return Err(SimulatorError::configuration(
                "TrendEstimator",
                "EMA period must be positive",
            ));
        }
        Self::new(initial, ema_alpha(period))
    }

    pub fn update(&mut self, x: f64) {
        self.trend = self.alpha * x + (1.0 - self.alpha) * self.trend;
    }

    /// Re-seed the smoothed value, keeping alpha.
    pub fn reset(&mut self, initial: f64) {
        self.trend = initial;
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// k = 2/(n+1)
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}
