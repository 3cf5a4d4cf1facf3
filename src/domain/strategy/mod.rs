//! Strategy contract and the shared run loop.
//!
//! Every strategy owns a [`Book`] and implements the per-tick hook; `execute`
//! drives the life cycle:
//! - reset the book and strategy-specific state
//! - warm-start estimators from the first price
//! - fold over the ticks in order
//! - close any open position at the last price

pub mod contrarian;
pub mod fixed_time;
pub mod macd;
pub mod mean_reversion;
pub mod random;

pub use contrarian::{ContrarianConfig, ContrarianStrategy};
pub use fixed_time::{FixedTimeConfig, FixedTimeStrategy};
pub use macd::{MacdConfig, MacdStrategy};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use random::{RandomConfig, RandomStrategy};

use tracing::{info, warn};

use crate::domain::error::SimulatorError;
use crate::domain::portfolio::{Book, SimulationResult};
use crate::domain::tick::Tick;

pub trait Strategy: Send {
    /// Registry id, also the INI section the strategy is configured from.
    fn id(&self) -> &'static str;

    fn transaction_cost(&self) -> f64;

    fn book(&self) -> &Book;

    fn book_mut(&mut self) -> &mut Book;

    /// Clear rolling buffers, counters and estimators.
    fn reset(&mut self);

    /// Seed estimators from the first price of a run.
    fn warm_start(&mut self, _first_price: f64) {}

    /// Process one tick. Must record exactly one history point for `step`.
    fn on_tick(&mut self, price: f64, step: usize, timestamp: &str) -> Result<(), SimulatorError>;

    /// Close whatever is still open after the last tick.
    fn close_out(&mut self, price: f64, step: usize) {
        let cost = self.transaction_cost();
        self.book_mut().liquidate(step, price, cost);
    }

    fn execute(&mut self, ticks: &[Tick], initial_cash: f64) -> Result<SimulationResult, SimulatorError> {
        self.book_mut().reset(initial_cash, ticks.len());
        self.reset();

        if initial_cash <= 0.0 {
            warn!(strategy = self.id(), initial_cash, "initial cash is not positive");
        }

        let (first, last) = match (ticks.first(), ticks.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                info!(strategy = self.id(), "no ticks, nothing to simulate");
                return Ok(SimulationResult::neutral(initial_cash));
            }
        };

        info!(
            strategy = self.id(),
            ticks = ticks.len(),
            initial_cash,
            first = %first.timestamp,
            last = %last.timestamp,
            "simulation started"
        );

        self.warm_start(first.price);
        for (step, tick) in ticks.iter().enumerate() {
            self.on_tick(tick.price, step, &tick.timestamp)?;
        }

        if !self.book().state.is_flat() {
            self.close_out(last.price, ticks.len() - 1);
        }

        let result = self.book_mut().take_result();
        info!(
            strategy = self.id(),
            trades = result.trades.len(),
            final_value = result.final_portfolio_value,
            profit_loss = result.profit_loss,
            "simulation finished"
        );
        Ok(result)
    }
}

pub(crate) fn check_cost(component: &str, cost: f64) -> Result<(), SimulatorError> {
    if !(cost >= 0.0) {
        return Err(SimulatorError::configuration(
            component,
            format!("transaction cost must be non-negative, got {cost}"),
        ));
    }
    Ok(())
}

/// `value` in [0, 1).
pub(crate) fn check_pct(component: &str, name: &str, value: f64) -> Result<(), SimulatorError> {
    if !(0.0..1.0).contains(&value) {
        return Err(SimulatorError::configuration(
            component,
            format!("{name} must be in [0, 1), got {value}"),
        ));
    }
    Ok(())
}

/// `value` in (0, 1].
pub(crate) fn check_position_size(component: &str, value: f64) -> Result<(), SimulatorError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(SimulatorError::configuration(
            component,
            format!("position size must be in (0, 1], got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeType;

    /// Buys one share on the first tick and never sells.
    struct BuyAndHold {
        book: Book,
        resets: usize,
    }

    impl Strategy for BuyAndHold {
        fn id(&self) -> &'static str {
            "buy_and_hold"
        }

        fn transaction_cost(&self) -> f64 {
            0.0
        }

        fn book(&self) -> &Book {
            &self.book
        }

        fn book_mut(&mut self) -> &mut Book {
            &mut self.book
        }

        fn reset(&mut self) {
            self.resets += 1;
        }

        fn on_tick(&mut self, price: f64, step: usize, _timestamp: &str) -> Result<(), SimulatorError> {
            self.book.state.last_price = price;
            if self.book.state.is_flat() && self.book.trades.is_empty() {
                self.book.open_long(step, price, 1.0, 0.0);
            }
            let point = self.book.snapshot(price, 0.0, 0.0, 0.0, 0.0);
            self.book.record(step, point);
            Ok(())
        }
    }

    fn buy_and_hold() -> BuyAndHold {
        BuyAndHold {
            book: Book::default(),
            resets: 0,
        }
    }

    #[test]
    fn empty_input_is_neutral() {
        let mut strategy = buy_and_hold();
        let result = strategy.execute(&[], 10_000.0).unwrap();
        assert_eq!(result, SimulationResult::neutral(10_000.0));
    }

    #[test]
    fn open_position_is_closed_on_last_tick() {
        let mut strategy = buy_and_hold();
        let ticks = Tick::sequence(
            &[10.0, 11.0, 12.0],
            &["2024-01-02 09:30:00", "2024-01-02 09:31:00", "2024-01-02 09:32:00"],
        );
        let result = strategy.execute(&ticks, 100.0).unwrap();

        assert_eq!(result.trades.len(), 2);
        let exit = &result.trades[1];
        assert_eq!(exit.trade_type, TradeType::ExitLong);
        assert_eq!(exit.time_step, 2);
        assert!((exit.price - 12.0).abs() < f64::EPSILON);
        assert!((result.profit_loss - 2.0).abs() < 1e-9);
        assert_eq!(result.history.len(), 3);
    }

    #[test]
    fn execute_resets_between_runs() {
        let mut strategy = buy_and_hold();
        let ticks = Tick::sequence(&[10.0, 11.0], &["a", "b"]);
        let first = strategy.execute(&ticks, 100.0).unwrap();
        let second = strategy.execute(&ticks, 100.0).unwrap();
        assert_eq!(first, second);
        assert_eq!(strategy.resets, 2);
    }

    #[test]
    fn non_positive_cash_still_runs() {
        let mut strategy = buy_and_hold();
        let ticks = Tick::sequence(&[10.0], &["a"]);
        let result = strategy.execute(&ticks, 0.0).unwrap();
        assert_eq!(result.history.len(), 1);
    }

    #[test]
    fn parameter_checks() {
        assert!(check_cost("X", 0.0).is_ok());
        assert!(check_cost("X", -0.001).is_err());
        assert!(check_cost("X", f64::NAN).is_err());

        assert!(check_pct("X", "stop loss", 0.0).is_ok());
        assert!(check_pct("X", "stop loss", 1.0).is_err());
        assert!(check_pct("X", "stop loss", -0.1).is_err());

        assert!(check_position_size("X", 1.0).is_ok());
        assert!(check_position_size("X", 0.0).is_err());
        assert!(check_position_size("X", 1.5).is_err());
    }
}
