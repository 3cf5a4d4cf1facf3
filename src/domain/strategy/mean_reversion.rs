//! Z-score mean reversion over a rolling window of prices.
//!
//! z = (price - mean) / stddev over the last `lookback` prices. Buys when the
//! price is stretched below the mean, sells short when stretched above, and
//! exits once z falls back inside the exit band. Stop loss and profit target
//! are checked first and end the tick when they fire.

use tracing::debug;

use super::{Strategy, check_cost, check_pct};
use crate::domain::error::SimulatorError;
use crate::domain::estimator::RollingWindow;
use crate::domain::portfolio::Book;
use crate::domain::registry::{ParamKind, StrategyInfo, StrategyParam};
use crate::ports::config_port::ConfigPort;

pub const ID: &str = "mean_reversion";

pub const MIN_LOOKBACK: usize = 3;

/// Share of affordable cash committed to an entry.
const CASH_BUFFER: f64 = 0.95;

const COMPONENT: &str = "MeanReversion";

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionConfig {
    pub lookback_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub stop_loss_pct: f64,
    pub profit_target_pct: f64,
    pub transaction_cost: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        MeanReversionConfig {
            lookback_period: 20,
            entry_threshold: 1.5,
            exit_threshold: 0.5,
            stop_loss_pct: 0.02,
            profit_target_pct: 0.03,
            transaction_cost: 0.001,
        }
    }
}

impl MeanReversionConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimulatorError> {
        let d = MeanReversionConfig::default();
        Ok(MeanReversionConfig {
            lookback_period: config.get_count(ID, "lookback", d.lookback_period)?,
            entry_threshold: config.try_double(ID, "entry_threshold", d.entry_threshold)?,
            exit_threshold: config.try_double(ID, "exit_threshold", d.exit_threshold)?,
            stop_loss_pct: config.try_double(ID, "stop_loss_pct", d.stop_loss_pct)?,
            profit_target_pct: config.try_double(ID, "profit_target_pct", d.profit_target_pct)?,
            transaction_cost: config.try_double(ID, "transaction_cost", d.transaction_cost)?,
        })
    }
}

pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
    window: RollingWindow,
    book: Book,
    mean: f64,
    stddev: f64,
    z_score: f64,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Result<Self, SimulatorError> {
        if config.lookback_period < MIN_LOOKBACK {
            return Err(SimulatorError::configuration(
                COMPONENT,
                format!(
                    "lookback period must be at least {MIN_LOOKBACK}, got {}",
                    config.lookback_period
                ),
            ));
        }
        if !(config.entry_threshold > 0.0) {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "entry threshold must be positive",
            ));
        }
        if !(config.exit_threshold >= 0.0) {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "exit threshold cannot be negative",
            ));
        }
        check_pct(COMPONENT, "stop loss", config.stop_loss_pct)?;
        if !(config.profit_target_pct > 0.0 && config.profit_target_pct < 1.0) {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "profit target must be in (0, 1)",
            ));
        }
        check_cost(COMPONENT, config.transaction_cost)?;

        Ok(MeanReversionStrategy {
            window: RollingWindow::new(config.lookback_period),
            config,
            book: Book::default(),
            mean: 0.0,
            stddev: 0.0,
            z_score: 0.0,
        })
    }

    pub fn config(&self) -> &MeanReversionConfig {
        &self.config
    }

    pub fn z_score(&self) -> f64 {
        self.z_score
    }

    fn update_stats(&mut self, price: f64) {
        self.mean = self.window.mean();
        self.stddev = self.window.population_stddev();
        self.z_score = if self.stddev > 0.0 {
            (price - self.mean) / self.stddev
        } else {
            0.0
        };
    }

    /// Whole shares purchasable with 95% of cash, cost included.
    fn entry_quantity(&self, price: f64) -> f64 {
        let cost = self.config.transaction_cost;
        (self.book.state.cash / (price * (1.0 + cost)) * CASH_BUFFER).trunc()
    }

    /// Returns true when a stop loss or profit target closed the position.
    fn check_risk_exits(&mut self, step: usize, price: f64) -> bool {
        let state = &self.book.state;
        let entry = state.entry_price;
        let quantity = state.position.abs();
        let cost = self.config.transaction_cost;
        let stop = self.config.stop_loss_pct;
        let target = self.config.profit_target_pct;

        if state.is_long() {
            if price < entry * (1.0 - stop) || price > entry * (1.0 + target) {
                debug!(step, price, entry, "long risk exit");
                self.book.close_long(step, price, quantity, cost);
                return true;
            }
        } else if state.is_short() && (price > entry * (1.0 + stop) || price < entry * (1.0 - target)) {
            debug!(step, price, entry, "short risk exit");
            self.book.close_short(step, price, quantity, cost);
            return true;
        }
        false
    }
}

impl Strategy for MeanReversionStrategy {
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
        self.mean = 0.0;
        self.stddev = 0.0;
        self.z_score = 0.0;
    }

    fn on_tick(&mut self, price: f64, step: usize, _timestamp: &str) -> Result<(), SimulatorError> {
        self.window.push(price);
        self.book.state.last_price = price;
        self.update_stats(price);

        let point = self
            .book
            .snapshot(price, self.z_score, 0.0, self.mean, self.stddev);
        self.book.record(step, point);

        if step % 10 == 0 {
            debug!(step, price, z = self.z_score, mean = self.mean, "mean reversion tick");
        }

        if !self.window.is_full() {
            return Ok(());
        }
        if self.check_risk_exits(step, price) {
            return Ok(());
        }

        let z = self.z_score;
        let entry = self.config.entry_threshold;
        let exit = self.config.exit_threshold;
        let cost = self.config.transaction_cost;
        let state = &self.book.state;

        if state.is_flat() && z < -entry {
            let quantity = self.entry_quantity(price);
            if quantity > 0.0 {
                self.book.open_long(step, price, quantity, cost);
            }
        } else if state.is_flat() && z > entry {
            let quantity = self.entry_quantity(price);
            if quantity > 0.0 {
                self.book.open_short(step, price, quantity, cost);
            }
        } else if state.is_long() && z.abs() < exit {
            let quantity = state.position;
            self.book.close_long(step, price, quantity, cost);
        } else if state.is_short() && z.abs() < exit {
            let quantity = state.position.abs();
            self.book.close_short(step, price, quantity, cost);
        }
        Ok(())
    }
}

pub fn info() -> StrategyInfo {
    StrategyInfo {
        id: ID,
        name: "Mean Reversion Strategy",
        description: "Trades z-score extremes of a rolling mean with stop loss and profit target",
        parameters: vec![
            StrategyParam::new("lookback", ParamKind::Number, "Rolling window length", "20"),
            StrategyParam::new("entry_threshold", ParamKind::Number, "Z-score to enter", "1.5"),
            StrategyParam::new("exit_threshold", ParamKind::Number, "Z-score to exit", "0.5"),
            StrategyParam::new("stop_loss_pct", ParamKind::Number, "Stop loss from entry price", "0.02"),
            StrategyParam::new(
                "profit_target_pct",
                ParamKind::Number,
                "Profit target from entry price",
                "0.03",
            ),
            StrategyParam::new("transaction_cost", ParamKind::Number, "Proportional cost per fill", "0.001"),
        ],
        factory: build_default,
        configured: build_configured,
    }
}

fn build_default() -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(MeanReversionStrategy::new(MeanReversionConfig::default())?))
}

fn build_configured(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SimulatorError> {
    let config = MeanReversionConfig::from_config(config)?;
    Ok(Box::new(MeanReversionStrategy::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::SimulationResult;
    use crate::domain::tick::Tick;
    use crate::domain::trade::TradeType;
    use approx::assert_relative_eq;

    fn ticks(prices: &[f64]) -> Vec<Tick> {
        let stamps: Vec<String> = (0..prices.len())
            .map(|i| format!("2024-01-02 11:{:02}:00", i % 60))
            .collect();
        Tick::sequence(prices, &stamps)
    }

    fn small_window() -> MeanReversionStrategy {
        MeanReversionStrategy::new(MeanReversionConfig {
            lookback_period: 5,
            ..MeanReversionConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        let bad = [
            MeanReversionConfig {
                lookback_period: 2,
                ..MeanReversionConfig::default()
            },
            MeanReversionConfig {
                entry_threshold: 0.0,
                ..MeanReversionConfig::default()
            },
            MeanReversionConfig {
                exit_threshold: -0.1,
                ..MeanReversionConfig::default()
            },
            MeanReversionConfig {
                stop_loss_pct: 1.0,
                ..MeanReversionConfig::default()
            },
            MeanReversionConfig {
                profit_target_pct: 0.0,
                ..MeanReversionConfig::default()
            },
            MeanReversionConfig {
                transaction_cost: -1.0,
                ..MeanReversionConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                MeanReversionStrategy::new(config),
                Err(SimulatorError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn constant_prices_never_trade() {
        let mut s = MeanReversionStrategy::new(MeanReversionConfig::default()).unwrap();
        let result = s.execute(&ticks(&[50.0; 100]), 10_000.0).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_portfolio_value, 10_000.0);
        assert!(result.history.iter().all(|p| p.indicator_a == 0.0));
    }

    #[test]
    fn no_trades_before_window_fills() {
        let mut s = small_window();
        // a sharp drop on tick 3 would qualify but the window holds only 4 prices
        let result = s.execute(&ticks(&[100.0, 100.0, 100.0, 80.0]), 10_000.0).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.history.len(), 4);
    }

    #[test]
    fn drop_below_band_buys_whole_shares() {
        let mut s = small_window();
        let result = s
            .execute(&ticks(&[100.0, 100.0, 100.0, 100.0, 90.0]), 10_000.0)
            .unwrap();

        // window [100,100,100,100,90]: mean 98, stddev 4, z = -2
        assert!((result.history[4].indicator_a + 2.0).abs() < 1e-12);
        assert!((result.history[4].trend - 98.0).abs() < 1e-12);
        assert!((result.history[4].volatility - 4.0).abs() < 1e-12);

        let entry = &result.trades[0];
        assert_eq!(entry.trade_type, TradeType::Long);
        assert_eq!(entry.time_step, 4);
        let expected = (10_000.0 / (90.0 * 1.001) * 0.95_f64).trunc();
        assert_eq!(entry.quantity, expected);
        assert_eq!(entry.quantity.fract(), 0.0);
    }

    #[test]
    fn spike_above_band_sells_short() {
        let mut s = small_window();
        let result = s
            .execute(&ticks(&[100.0, 100.0, 100.0, 100.0, 110.0]), 10_000.0)
            .unwrap();
        assert_eq!(result.trades[0].trade_type, TradeType::Short);
        let last = result.trades.last().unwrap();
        assert_eq!(last.trade_type, TradeType::ExitShort);
        assert_eq!(last.time_step, 4);
    }

    #[test]
    fn profit_target_exits_before_signal() {
        let mut s = small_window();
        let result = s
            .execute(
                &ticks(&[100.0, 100.0, 100.0, 100.0, 90.0, 93.0]),
                10_000.0,
            )
            .unwrap();
        // 93 > 90 * 1.03 so the target fires on tick 5
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[1].trade_type, TradeType::ExitLong);
        assert_eq!(result.trades[1].time_step, 5);
    }

    #[test]
    fn stop_loss_exits_long() {
        let mut s = small_window();
        let result = s
            .execute(
                &ticks(&[100.0, 100.0, 100.0, 100.0, 90.0, 88.0, 88.0]),
                10_000.0,
            )
            .unwrap();
        // 88 < 90 * 0.98
        assert_eq!(result.trades[1].trade_type, TradeType::ExitLong);
        assert_eq!(result.trades[1].time_step, 5);
    }

    /// Short 86 shares at 110 on tick 4, then follow `rest`.
    fn short_then(rest: &[f64]) -> SimulationResult {
        let mut prices = vec![100.0, 100.0, 100.0, 100.0, 110.0];
        prices.extend_from_slice(rest);
        small_window().execute(&ticks(&prices), 10_000.0).unwrap()
    }

    fn cover_cash_delta(result: &SimulationResult, step: usize) -> f64 {
        result.history[step + 1].cash - result.history[step].cash
    }

    #[test]
    fn stop_loss_covers_short() {
        // 112.5 > 110 * 1.02
        let result = short_then(&[112.5, 112.5]);
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].quantity, 86.0);
        let cover = &result.trades[1];
        assert_eq!(cover.trade_type, TradeType::ExitShort);
        assert_eq!(cover.time_step, 5);
        assert_relative_eq!(
            cover_cash_delta(&result, 5),
            -86.0 * 112.5 * 1.001,
            max_relative = 1e-12
        );
    }

    #[test]
    fn profit_target_covers_short() {
        // 106.5 < 110 * 0.97 while z is still about 0.76, above the exit band
        let result = short_then(&[106.5, 106.5]);
        assert_eq!(result.trades.len(), 2);
        let cover = &result.trades[1];
        assert_eq!(cover.trade_type, TradeType::ExitShort);
        assert_eq!(cover.time_step, 5);
        assert!(result.history[5].indicator_a > 0.5);
        assert_relative_eq!(
            cover_cash_delta(&result, 5),
            -86.0 * 106.5 * 1.001,
            max_relative = 1e-12
        );
    }

    #[test]
    fn reverting_z_covers_short() {
        // z falls 0.99, 0.65, 0.34 with the price held inside both risk bands
        let result = short_then(&[108.0, 108.0, 108.0, 108.0]);
        assert_eq!(result.trades.len(), 2);
        let cover = &result.trades[1];
        assert_eq!(cover.trade_type, TradeType::ExitShort);
        assert_eq!(cover.time_step, 7);
        assert!(result.history[6].indicator_a >= 0.5);
        assert!(result.history[7].indicator_a < 0.5);
        assert_relative_eq!(
            cover_cash_delta(&result, 7),
            -86.0 * 108.0 * 1.001,
            max_relative = 1e-12
        );
    }

    #[test]
    fn cash_conservation_on_round_trip() {
        let mut s = small_window();
        let result = s
            .execute(
                &ticks(&[100.0, 100.0, 100.0, 100.0, 90.0, 93.0]),
                10_000.0,
            )
            .unwrap();
        let mut cash = 10_000.0;
        for t in &result.trades {
            match t.trade_type {
                TradeType::Long | TradeType::ExitShort => cash -= t.quantity * t.price * 1.001,
                TradeType::Short | TradeType::ExitLong => cash += t.quantity * t.price * 0.999,
            }
        }
        assert!((cash - result.final_portfolio_value).abs() < 1e-6);
    }

    #[test]
    fn from_config_reads_lookback() {
        let adapter = crate::adapters::file_config_adapter::FileConfigAdapter::from_string(
            "[mean_reversion]\nlookback = 7\nentry_threshold = 2.0\n",
        )
        .unwrap();
        let config = MeanReversionConfig::from_config(&adapter).unwrap();
        assert_eq!(config.lookback_period, 7);
        assert_eq!(config.entry_threshold, 2.0);
        assert_eq!(config.exit_threshold, 0.5);
    }
}
