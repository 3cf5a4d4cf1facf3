//! Fixed holding-period strategy.
//!
//! Enters a long position during regular trading hours and closes it once
//! `holding_period_minutes` have elapsed on the tick clock. A cooldown,
//! counted in ticks since the last trade, spaces entries apart.

use chrono::{NaiveTime, Timelike};
use tracing::debug;

use super::{Strategy, check_cost, check_position_size};
use crate::domain::error::SimulatorError;
use crate::domain::portfolio::Book;
use crate::domain::registry::{ParamKind, StrategyInfo, StrategyParam};
use crate::domain::tick::{minutes_between, parse_timestamp};
use crate::ports::config_port::ConfigPort;

pub const ID: &str = "fixed_time";

const COMPONENT: &str = "FixedTime";

/// 09:30 inclusive.
const MARKET_OPEN: (u32, u32) = (9, 30);
/// 16:00 exclusive.
const MARKET_CLOSE_HOUR: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimeConfig {
    pub holding_period_minutes: usize,
    pub position_size: f64,
    pub cooldown_period: usize,
    pub transaction_cost: f64,
}

impl Default for FixedTimeConfig {
    fn default() -> Self {
        FixedTimeConfig {
            holding_period_minutes: 15,
            position_size: 0.90,
            cooldown_period: 0,
            transaction_cost: 0.001,
        }
    }
}

impl FixedTimeConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimulatorError> {
        let d = FixedTimeConfig::default();
        Ok(FixedTimeConfig {
            holding_period_minutes: config.get_count(
                ID,
                "holding_period_minutes",
                d.holding_period_minutes,
            )?,
            position_size: config.try_double(ID, "position_size", d.position_size)?,
            cooldown_period: config.get_count(ID, "cooldown_period_minutes", d.cooldown_period)?,
            transaction_cost: config.try_double(ID, "transaction_cost", d.transaction_cost)?,
        })
    }
}

/// True for 09:30 <= t < 16:00. Unparseable timestamps are outside hours.
pub fn within_trading_hours(timestamp: &str) -> bool {
    parse_timestamp(timestamp).is_some_and(|dt| is_market_time(dt.time()))
}

fn is_market_time(time: NaiveTime) -> bool {
    let minutes = (time.hour(), time.minute());
    minutes >= MARKET_OPEN && time.hour() < MARKET_CLOSE_HOUR
}

pub struct FixedTimeStrategy {
    config: FixedTimeConfig,
    book: Book,
    entry_timestamp: Option<String>,
    last_trade_step: Option<usize>,
}

impl FixedTimeStrategy {
    pub fn new(config: FixedTimeConfig) -> Result<Self, SimulatorError> {
        if config.holding_period_minutes == 0 {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "holding period must be at least one minute",
            ));
        }
        check_position_size(COMPONENT, config.position_size)?;
        check_cost(COMPONENT, config.transaction_cost)?;

        Ok(FixedTimeStrategy {
            config,
            book: Book::default(),
            entry_timestamp: None,
            last_trade_step: None,
        })
    }

    pub fn config(&self) -> &FixedTimeConfig {
        &self.config
    }

    fn cooldown_elapsed(&self, step: usize) -> bool {
        match self.last_trade_step {
            None => true,
            Some(last) => step.saturating_sub(last) >= self.config.cooldown_period,
        }
    }

    fn holding_complete(&self, timestamp: &str) -> bool {
        let Some(entry) = self.entry_timestamp.as_deref() else {
            return false;
        };
        let holding = i64::try_from(self.config.holding_period_minutes).unwrap_or(i64::MAX);
        minutes_between(entry, timestamp).is_some_and(|held| held >= holding)
    }
}

impl Strategy for FixedTimeStrategy {
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
        self.entry_timestamp = None;
        self.last_trade_step = None;
    }

    fn on_tick(&mut self, price: f64, step: usize, timestamp: &str) -> Result<(), SimulatorError> {
        let point = self.book.snapshot(price, 0.0, 0.0, 0.0, 0.0);
        self.book.record(step, point);

        if step % 10 == 0 {
            debug!(step, price, timestamp, "fixed time tick");
        }

        let cost = self.config.transaction_cost;
        if self.book.state.is_long() {
            if self.holding_complete(timestamp) {
                let quantity = self.book.state.position;
                self.book.close_long(step, price, quantity, cost);
                self.entry_timestamp = None;
                self.last_trade_step = Some(step);
            }
        } else if self.book.state.is_flat()
            && within_trading_hours(timestamp)
            && self.cooldown_elapsed(step)
            && price > 0.0
        {
            let budget = self.book.state.cash * self.config.position_size;
            let quantity = (budget / (price * (1.0 + cost))).trunc();
            if quantity > 0.0 {
                self.book.open_long(step, price, quantity, cost);
                self.entry_timestamp = Some(timestamp.to_string());
                self.last_trade_step = Some(step);
            }
        }

        self.book.state.last_price = price;
        Ok(())
    }
}

pub fn info() -> StrategyInfo {
    StrategyInfo {
        id: ID,
        name: "Fixed Time Interval Strategy",
        description: "Holds a long position for a fixed number of minutes during market hours",
        parameters: vec![
            StrategyParam::new(
                "holding_period_minutes",
                ParamKind::Number,
                "Minutes to hold each position",
                "15",
            ),
            StrategyParam::new("position_size", ParamKind::Number, "Fraction of cash per entry", "0.90"),
            StrategyParam::new(
                "cooldown_period_minutes",
                ParamKind::Number,
                "Ticks to wait after a trade before re-entering",
                "0",
            ),
            StrategyParam::new("transaction_cost", ParamKind::Number, "Proportional cost per fill", "0.001"),
        ],
        factory: build_default,
        configured: build_configured,
    }
}

fn build_default() -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(FixedTimeStrategy::new(FixedTimeConfig::default())?))
}

fn build_configured(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(FixedTimeStrategy::new(FixedTimeConfig::from_config(config)?)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tick::Tick;
    use crate::domain::trade::TradeType;

    /// One tick per minute starting at `start` (HH:MM on 2024-01-02).
    fn minute_ticks(start_hour: u32, start_minute: u32, prices: &[f64]) -> Vec<Tick> {
        let stamps: Vec<String> = (0..prices.len() as u32)
            .map(|i| {
                let total = start_hour * 60 + start_minute + i;
                format!("2024-01-02 {:02}:{:02}:00", total / 60, total % 60)
            })
            .collect();
        Tick::sequence(prices, &stamps)
    }

    #[test]
    fn trading_hours_boundaries() {
        assert!(within_trading_hours("2024-01-02 09:30:00"));
        assert!(within_trading_hours("2024-01-02 15:59:59"));
        assert!(!within_trading_hours("2024-01-02 09:29:59"));
        assert!(!within_trading_hours("2024-01-02 16:00:00"));
        assert!(!within_trading_hours("not a timestamp"));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(
            FixedTimeStrategy::new(FixedTimeConfig {
                holding_period_minutes: 0,
                ..FixedTimeConfig::default()
            })
            .is_err()
        );
        assert!(
            FixedTimeStrategy::new(FixedTimeConfig {
                position_size: 0.0,
                ..FixedTimeConfig::default()
            })
            .is_err()
        );
    }

    #[test]
    fn exits_after_holding_period() {
        let mut s = FixedTimeStrategy::new(FixedTimeConfig::default()).unwrap();
        let result = s.execute(&minute_ticks(9, 30, &[100.0; 16]), 10_000.0).unwrap();

        let exits: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.trade_type == TradeType::ExitLong)
            .collect();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].time_step, 15);
        assert_eq!(result.trades[0].time_step, 0);
        assert_eq!(result.trades[0].quantity, (9_000.0_f64 / (100.0 * 1.001)).trunc());
    }

    #[test]
    fn cooldown_spaces_entries() {
        let mut s = FixedTimeStrategy::new(FixedTimeConfig {
            holding_period_minutes: 2,
            cooldown_period: 3,
            ..FixedTimeConfig::default()
        })
        .unwrap();
        let result = s.execute(&minute_ticks(10, 0, &[50.0; 8]), 10_000.0).unwrap();
        let steps: Vec<(usize, TradeType)> = result
            .trades
            .iter()
            .map(|t| (t.time_step, t.trade_type))
            .collect();
        assert_eq!(
            steps,
            vec![
                (0, TradeType::Long),
                (2, TradeType::ExitLong),
                (5, TradeType::Long),
                (7, TradeType::ExitLong),
            ]
        );
    }

    #[test]
    fn no_entry_outside_hours() {
        let mut s = FixedTimeStrategy::new(FixedTimeConfig::default()).unwrap();
        let result = s.execute(&minute_ticks(8, 0, &[100.0; 30]), 10_000.0).unwrap();
        assert!(result.trades.is_empty());

        let result = s.execute(&minute_ticks(16, 0, &[100.0; 5]), 10_000.0).unwrap();
        assert!(result.trades.is_empty());
    }

    #[test]
    fn bad_timestamps_never_trade() {
        let mut s = FixedTimeStrategy::new(FixedTimeConfig::default()).unwrap();
        let ticks = Tick::sequence(&[100.0, 101.0], &["garbage", "2024-13-45 99:00:00"]);
        let result = s.execute(&ticks, 10_000.0).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.history.len(), 2);
    }

    #[test]
    fn unparseable_exit_timestamp_holds_until_close() {
        let mut s = FixedTimeStrategy::new(FixedTimeConfig {
            holding_period_minutes: 1,
            ..FixedTimeConfig::default()
        })
        .unwrap();
        let ticks = Tick::sequence(
            &[100.0, 101.0, 102.0],
            &["2024-01-02 10:00:00", "garbage", "garbage"],
        );
        let result = s.execute(&ticks, 10_000.0).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[1].time_step, 2);
    }
}
