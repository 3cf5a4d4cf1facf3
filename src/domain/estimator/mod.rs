//! Online statistical estimators shared by the strategies.
//!
//! - `TrendEstimator`: exponential smoother, also used as EMA(n)
//! - `GarchEstimator`: GARCH(1,1) volatility recurrence over log returns
//! - `RollingWindow`: fixed-capacity ring buffer with mean and standard deviation

pub mod garch;
pub mod trend;
pub mod window;

pub use garch::GarchEstimator;
pub use trend::TrendEstimator;
pub use window::RollingWindow;

/// Natural log return between two consecutive prices.
pub fn log_return(price: f64, previous: f64) -> f64 {
    (price / previous).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_return_of_unchanged_price_is_zero() {
        assert_eq!(log_return(100.0, 100.0), 0.0);
    }

    #[test]
    fn log_return_is_antisymmetric() {
        let up = log_return(110.0, 100.0);
        let down = log_return(100.0, 110.0);
        assert!((up + down).abs() < 1e-12);
        assert!((up - (1.1f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn log_return_of_zero_price_is_infinite() {
        assert!(log_return(0.0, 100.0).is_infinite());
        assert!(log_return(-1.0, 100.0).is_nan());
    }
}
