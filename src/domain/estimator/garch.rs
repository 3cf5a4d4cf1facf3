//! GARCH(1,1) volatility estimator.
//!
//! sigma²[t] = omega + alpha * r[t-1]² + beta * sigma²[t-1]

use tracing::warn;

use crate::domain::error::SimulatorError;

#[derive(Debug, Clone, PartialEq)]
pub struct GarchEstimator {
    sigma: f64,
    prev_sigma2: f64,
    prev_r2: f64,
    initial_sigma: f64,
    omega: f64,
    alpha: f64,
    beta: f64,
}

impl GarchEstimator {
    pub fn new(initial_sigma: f64, omega: f64, alpha: f64, beta: f64) -> Result<Self, SimulatorError> {
        if !(initial_sigma > 0.0) {
            return Err(SimulatorError::configuration(
                "GarchEstimator",
                "initial sigma must be positive",
            ));
        }
        if !(omega > 0.0 && alpha > 0.0 && beta > 0.0) {
            return Err(SimulatorError::configuration(
                "GarchEstimator",
                "omega, alpha and beta must be positive",
            ));
        }
        if alpha + beta >= 1.0 {
            warn!(alpha, beta, "GARCH alpha + beta >= 1, variance may be non-stationary");
        }
        Ok(GarchEstimator {
            sigma: initial_sigma,
            prev_sigma2: initial_sigma * initial_sigma,
            prev_r2: 0.0,
            initial_sigma,
            omega,
            alpha,
            beta,
        })
    }

    /// Feed one return. NaN or infinite input is rejected and leaves the state untouched.
    pub fn update(&mut self, r: f64) -> Result<(), SimulatorError> {
        if !r.is_finite() {
            return Err(SimulatorError::numeric(format!(
                "GARCH update received a non-finite return ({r})"
            )));
        }

        let mut sigma2 = self.omega + self.alpha * self.prev_r2 + self.beta * self.prev_sigma2;
        if sigma2 <= 0.0 {
            warn!(sigma2, "GARCH variance became non-positive, clamping");
            sigma2 = f64::EPSILON;
        }

        self.prev_sigma2 = sigma2;
        self.prev_r2 = r * r;
        self.sigma = sigma2.sqrt();
        Ok(())
    }

    /// Back to the constructed initial sigma with no previous shock.
    pub fn reset(&mut self) {
        self.sigma = self.initial_sigma;
        self.prev_sigma2 = self.initial_sigma * self.initial_sigma;
        self.prev_r2 = 0.0;
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}
