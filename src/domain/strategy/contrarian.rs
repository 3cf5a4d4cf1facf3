//! Contrarian strategy: buy after a run of falling prices, sell after a run of
//! rising ones.
//!
//! The last `consecutive_moves + 1` prices are kept; a run of N decreases means
//! every adjacent pair in that window strictly falls. An unchanged price
//! breaks both kinds of run.

use tracing::debug;

use super::{Strategy, check_cost, check_pct, check_position_size};
use crate::domain::error::SimulatorError;
use crate::domain::estimator::RollingWindow;
use crate::domain::portfolio::Book;
use crate::domain::registry::{ParamKind, StrategyInfo, StrategyParam};
use crate::ports::config_port::ConfigPort;

pub const ID: &str = "contrarian";

const COMPONENT: &str = "Contrarian";

#[derive(Debug, Clone, PartialEq)]
pub struct ContrarianConfig {
    pub consecutive_moves: usize,
    pub position_size: f64,
    pub stop_loss_pct: f64,
    pub transaction_cost: f64,
}

impl Default for ContrarianConfig {
    fn default() -> Self {
        ContrarianConfig {
            consecutive_moves: 3,
            position_size: 0.90,
            stop_loss_pct: 0.03,
            transaction_cost: 0.001,
        }
    }
}

impl ContrarianConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimulatorError> {
        let d = ContrarianConfig::default();
        Ok(ContrarianConfig {
            consecutive_moves: config.get_count(ID, "consecutive_moves", d.consecutive_moves)?,
            position_size: config.try_double(ID, "position_size", d.position_size)?,
            stop_loss_pct: config.try_double(ID, "stop_loss_pct", d.stop_loss_pct)?,
            transaction_cost: config.try_double(ID, "transaction_cost", d.transaction_cost)?,
        })
    }
}

pub struct ContrarianStrategy {
    config: ContrarianConfig,
    window: RollingWindow,
    book: Book,
}

impl ContrarianStrategy {
    pub fn new(config: ContrarianConfig) -> Result<Self, SimulatorError> {
        if config.consecutive_moves == 0 {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "consecutive moves must be at least 1",
            ));
        }
        check_position_size(COMPONENT, config.position_size)?;
        check_pct(COMPONENT, "stop loss", config.stop_loss_pct)?;
        check_cost(COMPONENT, config.transaction_cost)?;

        Ok(ContrarianStrategy {
            window: RollingWindow::new(config.consecutive_moves + 1),
            config,
            book: Book::default(),
        })
    }

    pub fn config(&self) -> &ContrarianConfig {
        &self.config
    }

    /// Signed length of the move run ending at the latest price: negative
    /// for decreases, positive for increases, zero after a flat step.
    pub fn run_length(&self) -> i64 {
        let mut run = 0i64;
        let mut previous: Option<f64> = None;
        for price in self.window.iter() {
            if let Some(prev) = previous {
                run = if price < prev {
                    if run < 0 { run - 1 } else { -1 }
                } else if price > prev {
                    if run > 0 { run + 1 } else { 1 }
                } else {
                    0
                };
            }
            previous = Some(price);
        }
        run
    }
}

impl Strategy for ContrarianStrategy {
    fn id(&self) -> &'static str {
        ID
    }

    fn transaction_cost(&self) -> f64 {
        self.config.transaction_cost
    }

    fn book(&self) -> &Book {
        &self.book
    }

    fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn on_tick(&mut self, price: f64, step: usize, _timestamp: &str) -> Result<(), SimulatorError> {
        self.window.push(price);
        self.book.state.last_price = price;

        let run = self.run_length();
        let point = self.book.snapshot(price, run as f64, 0.0, 0.0, 0.0);
        self.book.record(step, point);

        if step % 10 == 0 {
            debug!(step, price, run, "contrarian tick");
        }

        let cost = self.config.transaction_cost;
        let state = &self.book.state;
        if state.is_long() && price < state.entry_price * (1.0 - self.config.stop_loss_pct) {
            debug!(step, price, entry = state.entry_price, "contrarian stop loss");
            let quantity = state.position;
            self.book.close_long(step, price, quantity, cost);
            return Ok(());
        }

        let needed = self.config.consecutive_moves as i64;
        if state.is_flat() && run <= -needed {
            if price <= 0.0 {
                return Ok(());
            }
            let quantity = state.cash * self.config.position_size / (price * (1.0 + cost));
            if quantity > 0.0 {
                self.book.open_long(step, price, quantity, cost);
            }
        } else if state.is_long() && run >= needed {
            let quantity = state.position;
            self.book.close_long(step, price, quantity, cost);
        }
        Ok(())
    }
}

pub fn info() -> StrategyInfo {
    StrategyInfo {
        id: ID,
        name: "Contrarian Strategy",
        description: "Buys after consecutive price decreases and sells after consecutive increases",
        parameters: vec![
            StrategyParam::new(
                "consecutive_moves",
                ParamKind::Number,
                "Length of the price run that triggers a trade",
                "3",
            ),
            StrategyParam::new("position_size", ParamKind::Number, "Fraction of cash per entry", "0.90"),
            StrategyParam::new("stop_loss_pct", ParamKind::Number, "Stop loss from entry price", "0.03"),
            StrategyParam::new("transaction_cost", ParamKind::Number, "Proportional cost per fill", "0.001"),
        ],
        factory: build_default,
        configured: build_configured,
    }
}

fn build_default() -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(ContrarianStrategy::new(ContrarianConfig::default())?))
}

fn build_configured(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(ContrarianStrategy::new(ContrarianConfig::from_config(config)?)?))
}
