//! Random trading baseline.
//!
//! Every `time_step_interval` ticks a seeded RNG decides what to do: when flat
//! it buys 1-5% of the affordable shares, when holding it flips a coin and on
//! heads sells 50-100% of the position. Optionally the position is cleared
//! when the calendar date changes.
//!
//! The RNG is re-seeded on every run so identical input gives identical trades.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{Strategy, check_cost};
use crate::domain::error::SimulatorError;
use crate::domain::portfolio::Book;
use crate::domain::registry::{ParamKind, StrategyInfo, StrategyParam};
use crate::domain::tick::date_prefix;
use crate::ports::config_port::ConfigPort;

pub const ID: &str = "random";

pub const DEFAULT_SEED: u64 = 42;

const COMPONENT: &str = "Random";

#[derive(Debug, Clone, PartialEq)]
pub struct RandomConfig {
    pub transaction_cost: f64,
    pub time_step_interval: usize,
    pub clear_at_end_of_day: bool,
    pub seed: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        RandomConfig {
            transaction_cost: 0.001,
            time_step_interval: 10,
            clear_at_end_of_day: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl RandomConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimulatorError> {
        let d = RandomConfig::default();
        let seed = config.get_count(ID, "seed", d.seed as usize)? as u64;
        Ok(RandomConfig {
            transaction_cost: config.try_double(ID, "transaction_cost", d.transaction_cost)?,
            time_step_interval: config.get_count(ID, "time_step_interval", d.time_step_interval)?,
            clear_at_end_of_day: config.try_bool(ID, "clear_at_end_of_day", d.clear_at_end_of_day)?,
            seed,
        })
    }
}

pub struct RandomStrategy {
    config: RandomConfig,
    book: Book,
    rng: StdRng,
    current_day: Option<String>,
    tick_counter: usize,
}

impl RandomStrategy {
    pub fn new(config: RandomConfig) -> Result<Self, SimulatorError> {
        check_cost(COMPONENT, config.transaction_cost)?;
        if config.time_step_interval == 0 {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "time step interval must be at least 1",
            ));
        }
        Ok(RandomStrategy {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            book: Book::default(),
            current_day: None,
            tick_counter: 0,
        })
    }

    pub fn config(&self) -> &RandomConfig {
        &self.config
    }

    /// Whether `timestamp` starts a new calendar day relative to the last tick.
    fn roll_day(&mut self, timestamp: &str) -> bool {
        let day = date_prefix(timestamp);
        let changed = self.current_day.as_deref().is_some_and(|current| current != day);
        if self.current_day.as_deref() != Some(day) {
            self.current_day = Some(day.to_string());
        }
        changed
    }

    fn buy(&mut self, step: usize, price: f64, trade_pct: f64) {
        if price <= 0.0 {
            return;
        }
        let cost = self.config.transaction_cost;
        let cash = self.book.state.cash;
        let max_quantity = (cash / (price * (1.0 + cost))).trunc();
        let mut quantity = (max_quantity * trade_pct).trunc();
        if quantity < 1.0 && max_quantity >= 1.0 {
            quantity = 1.0;
        }
        if quantity > 0.0 && cash >= quantity * price * (1.0 + cost) {
            self.book.open_long(step, price, quantity, cost);
        }
    }

    fn maybe_sell(&mut self, step: usize, price: f64) {
        let heads = self.rng.gen_range(0..=1u32) == 1;
        if !heads {
            return;
        }
        let sell_pct: f64 = self.rng.gen_range(0.5..1.0);
        let position = self.book.state.position;
        let quantity = (position * sell_pct).trunc().max(1.0).min(position);
        if quantity > 0.0 {
            self.book
                .close_long(step, price, quantity, self.config.transaction_cost);
        }
    }
}

impl Strategy for RandomStrategy {
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
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.current_day = None;
        self.tick_counter = 0;
    }

    fn on_tick(&mut self, price: f64, step: usize, timestamp: &str) -> Result<(), SimulatorError> {
        let new_day = self.roll_day(timestamp);
        if self.config.clear_at_end_of_day && new_day && self.book.state.is_long() {
            debug!(step, timestamp, "new trading day, clearing position");
            let quantity = self.book.state.position;
            self.book
                .close_long(step, price, quantity, self.config.transaction_cost);
        }

        let point = self.book.snapshot(price, 0.0, 0.0, 0.0, 0.0);
        self.book.record(step, point);
        self.book.state.last_price = price;

        if step % 10 == 0 {
            debug!(step, price, counter = self.tick_counter, "random tick");
        }

        self.tick_counter += 1;
        if self.tick_counter < self.config.time_step_interval {
            return Ok(());
        }
        self.tick_counter = 0;

        let trade_pct: f64 = self.rng.gen_range(0.01..0.05);
        if self.book.state.is_flat() {
            self.buy(step, price, trade_pct);
        } else if self.book.state.is_long() {
            self.maybe_sell(step, price);
        }
        Ok(())
    }
}

pub fn info() -> StrategyInfo {
    StrategyInfo {
        id: ID,
        name: "Random Trading Strategy",
        description: "Buys and sells small random amounts at fixed intervals as a baseline",
        parameters: vec![
            StrategyParam::new("transaction_cost", ParamKind::Number, "Proportional cost per fill", "0.001"),
            StrategyParam::new(
                "time_step_interval",
                ParamKind::Number,
                "Ticks between trading decisions",
                "10",
            ),
            StrategyParam::new(
                "clear_at_end_of_day",
                ParamKind::Boolean,
                "Sell the whole position when the date changes",
                "true",
            ),
            StrategyParam::new("seed", ParamKind::Number, "RNG seed", "42"),
        ],
        factory: build_default,
        configured: build_configured,
    }
}

fn build_default() -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(RandomStrategy::new(RandomConfig::default())?))
}

fn build_configured(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(RandomStrategy::new(RandomConfig::from_config(config)?)?))
}
