//! MACD crossover strategy with GARCH-scaled trend bands.
//!
//! Per tick:
//! - MACD line = EMA(fast) - EMA(slow), signal line = EMA(signal) of the MACD line
//! - GARCH(1,1) volatility over log returns, floored at `MIN_SIGMA`
//! - bands around the smoothed trend: trend * (1 -/+ k * sigma)
//!
//! Goes long when the MACD line is above the signal line, short when it is
//! below, and exits on the opposing crossover or a stop loss from the entry
//! price. With `use_trend_band` a long entry also needs the price above the
//! upper band and a short entry needs it below the lower band.

use tracing::{debug, warn};

use super::{Strategy, check_cost, check_pct};
use crate::domain::error::SimulatorError;
use crate::domain::estimator::{GarchEstimator, TrendEstimator, log_return};
use crate::domain::portfolio::Book;
use crate::domain::registry::{ParamKind, StrategyInfo, StrategyParam};
use crate::domain::trade::TradeType;
use crate::ports::config_port::ConfigPort;

pub const ID: &str = "macd";

/// Lower bound applied to the GARCH sigma before it widens the bands.
pub const MIN_SIGMA: f64 = 0.01;

const COMPONENT: &str = "MACD";

#[derive(Debug, Clone, PartialEq)]
pub struct MacdConfig {
    pub vol_estimate: f64,
    pub trend_alpha: f64,
    pub garch_omega: f64,
    pub garch_alpha: f64,
    pub garch_beta: f64,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub trade_threshold_factor: f64,
    pub stop_loss_pct: f64,
    pub transaction_cost: f64,
    pub use_trend_band: bool,
}

impl Default for MacdConfig {
    fn default() -> Self {
        MacdConfig {
            vol_estimate: 0.02,
            trend_alpha: 0.3,
            garch_omega: 1e-6,
            garch_alpha: 0.1,
            garch_beta: 0.85,
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            trade_threshold_factor: 0.05,
            stop_loss_pct: 0.02,
            transaction_cost: 0.001,
            use_trend_band: false,
        }
    }
}

impl MacdConfig {
    /// Read the `[macd]` section; missing keys keep their defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimulatorError> {
        let d = MacdConfig::default();
        Ok(MacdConfig {
            vol_estimate: config.try_double(ID, "vol_estimate", d.vol_estimate)?,
            trend_alpha: config.try_double(ID, "trend_alpha", d.trend_alpha)?,
            garch_omega: config.try_double(ID, "garch_omega", d.garch_omega)?,
            garch_alpha: config.try_double(ID, "garch_alpha", d.garch_alpha)?,
            garch_beta: config.try_double(ID, "garch_beta", d.garch_beta)?,
            fast_period: config.get_count(ID, "fast_period", d.fast_period)?,
            slow_period: config.get_count(ID, "slow_period", d.slow_period)?,
            signal_period: config.get_count(ID, "signal_period", d.signal_period)?,
            trade_threshold_factor: config.try_double(
                ID,
                "trade_threshold_factor",
                d.trade_threshold_factor,
            )?,
            stop_loss_pct: config.try_double(ID, "stop_loss_pct", d.stop_loss_pct)?,
            transaction_cost: config.try_double(ID, "transaction_cost", d.transaction_cost)?,
            use_trend_band: config.try_bool(ID, "use_trend_band", d.use_trend_band)?,
        })
    }
}

pub struct MacdStrategy {
    config: MacdConfig,
    trend: TrendEstimator,
    garch: GarchEstimator,
    fast: TrendEstimator,
    slow: TrendEstimator,
    signal: TrendEstimator,
    book: Book,
    current_macd: f64,
    current_signal: f64,
    sizing_warned: bool,
}

impl MacdStrategy {
    pub fn new(config: MacdConfig) -> Result<Self, SimulatorError> {
        if config.fast_period == 0 || config.slow_period == 0 || config.signal_period == 0 {
            return Err(SimulatorError::configuration(COMPONENT, "EMA periods must be positive"));
        }
        if config.fast_period >= config.slow_period {
            return Err(SimulatorError::configuration(
                COMPONENT,
                format!(
                    "fast period ({}) must be smaller than slow period ({})",
                    config.fast_period, config.slow_period
                ),
            ));
        }
        if !(config.trade_threshold_factor >= 0.0) {
            return Err(SimulatorError::configuration(
                COMPONENT,
                "trade threshold factor must be non-negative",
            ));
        }
        check_pct(COMPONENT, "stop loss", config.stop_loss_pct)?;
        check_cost(COMPONENT, config.transaction_cost)?;

        let trend = TrendEstimator::new(0.0, config.trend_alpha)?;
        let garch = GarchEstimator::new(
            config.vol_estimate,
            config.garch_omega,
            config.garch_alpha,
            config.garch_beta,
        )?;
        let fast = TrendEstimator::ema(config.fast_period, 0.0)?;
        let slow = TrendEstimator::ema(config.slow_period, 0.0)?;
        let signal = TrendEstimator::ema(config.signal_period, 0.0)?;

        Ok(MacdStrategy {
            config,
            trend,
            garch,
            fast,
            slow,
            signal,
            book: Book::default(),
            current_macd: 0.0,
            current_signal: 0.0,
            sizing_warned: false,
        })
    }

    pub fn config(&self) -> &MacdConfig {
        &self.config
    }

    pub fn current_macd(&self) -> f64 {
        self.current_macd
    }

    pub fn current_signal(&self) -> f64 {
        self.current_signal
    }

    /// Commit all cash to a new position, cost included.
    fn enter(&mut self, step: usize, price: f64, trade_type: TradeType) {
        let cash = self.book.state.cash;
        if cash <= 0.0 || price <= 0.0 {
            // once per run; later misses go to debug
            if self.sizing_warned {
                debug!(step, cash, price, "cannot size a MACD entry");
            } else {
                warn!(step, cash, price, "cannot size a MACD entry, further misses logged at debug");
                self.sizing_warned = true;
            }
            return;
        }
        let cost = self.config.transaction_cost;
        let quantity = cash / (price * (1.0 + cost));
        let total = quantity * price * (1.0 + cost);
        self.book.fill(step, trade_type, price, quantity, -total);
    }

    fn exit_long(&mut self, step: usize, price: f64) {
        let quantity = self.book.state.position;
        self.book
            .close_long(step, price, quantity, self.config.transaction_cost);
    }

    /// Covering credits the short's P&L net of cost.
    fn exit_short(&mut self, step: usize, price: f64) {
        let quantity = self.book.state.position.abs();
        let pnl = quantity * (self.book.state.entry_price - price);
        let proceeds = pnl * (1.0 - self.config.transaction_cost);
        self.book
            .fill(step, TradeType::ExitShort, price, quantity, proceeds);
    }

    fn check_stop_loss(&mut self, step: usize, price: f64) {
        let entry = self.book.state.entry_price;
        if entry <= 0.0 {
            return;
        }
        let stop = self.config.stop_loss_pct;
        if self.book.state.is_long() && price < entry * (1.0 - stop) {
            debug!(step, price, entry, "long stop loss");
            self.exit_long(step, price);
        } else if self.book.state.is_short() && price > entry * (1.0 + stop) {
            debug!(step, price, entry, "short stop loss");
            self.exit_short(step, price);
        }
    }
}

impl Strategy for MacdStrategy {
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
        self.trend.reset(0.0);
        self.fast.reset(0.0);
        self.slow.reset(0.0);
        self.signal.reset(0.0);
        self.garch.reset();
        self.current_macd = 0.0;
        self.current_signal = 0.0;
        self.sizing_warned = false;
    }

    fn warm_start(&mut self, first_price: f64) {
        self.trend.reset(first_price);
        self.fast.reset(first_price);
        self.slow.reset(first_price);
        self.signal.reset(0.0);
    }

    fn on_tick(&mut self, price: f64, step: usize, _timestamp: &str) -> Result<(), SimulatorError> {
        self.trend.update(price);
        self.fast.update(price);
        self.slow.update(price);
        self.current_macd = self.fast.trend() - self.slow.trend();
        self.signal.update(self.current_macd);
        self.current_signal = self.signal.trend();

        let last_price = self.book.state.last_price;
        if step > 0 && last_price > 0.0 {
            self.garch.update(log_return(price, last_price))?;
        }
        self.book.state.last_price = price;

        let trend = self.trend.trend();
        let sigma = self.garch.sigma().max(MIN_SIGMA);
        let band = self.config.trade_threshold_factor * sigma;
        let lower_band = trend * (1.0 - band);
        let upper_band = trend * (1.0 + band);

        let point = self
            .book
            .snapshot(price, self.current_macd, self.current_signal, trend, sigma);
        self.book.record(step, point);

        if step % 10 == 0 {
            debug!(
                step,
                price,
                macd = self.current_macd,
                signal = self.current_signal,
                sigma,
                lower_band,
                upper_band,
                "macd tick"
            );
        }

        let bullish = self.current_macd > self.current_signal;
        let bearish = self.current_macd < self.current_signal;
        let banded = self.config.use_trend_band;

        if bullish && self.book.state.is_flat() && (!banded || price > upper_band) {
            self.enter(step, price, TradeType::Long);
        }
        if bearish && self.book.state.is_long() {
            self.exit_long(step, price);
        }
        if bearish && self.book.state.is_flat() && (!banded || price < lower_band) {
            self.enter(step, price, TradeType::Short);
        }
        if bullish && self.book.state.is_short() {
            self.exit_short(step, price);
        }
        self.check_stop_loss(step, price);
        Ok(())
    }

    fn close_out(&mut self, price: f64, step: usize) {
        if self.book.state.is_long() {
            self.exit_long(step, price);
        } else if self.book.state.is_short() {
            self.exit_short(step, price);
        }
    }
}

pub fn info() -> StrategyInfo {
    StrategyInfo {
        id: ID,
        name: "MACD Crossover Strategy",
        description: "Trades MACD/signal line crossovers with GARCH volatility bands and a stop loss",
        parameters: vec![
            StrategyParam::new("vol_estimate", ParamKind::Number, "Initial GARCH volatility", "0.02"),
            StrategyParam::new("trend_alpha", ParamKind::Number, "Trend smoothing factor", "0.3"),
            StrategyParam::new("garch_omega", ParamKind::Number, "GARCH long-run variance weight", "0.000001"),
            StrategyParam::new("garch_alpha", ParamKind::Number, "GARCH shock weight", "0.1"),
            StrategyParam::new("garch_beta", ParamKind::Number, "GARCH persistence", "0.85"),
            StrategyParam::new("fast_period", ParamKind::Number, "Fast EMA period", "12"),
            StrategyParam::new("slow_period", ParamKind::Number, "Slow EMA period", "26"),
            StrategyParam::new("signal_period", ParamKind::Number, "Signal line EMA period", "9"),
            StrategyParam::new(
                "trade_threshold_factor",
                ParamKind::Number,
                "Band width in units of sigma",
                "0.05",
            ),
            StrategyParam::new("stop_loss_pct", ParamKind::Number, "Stop loss from entry price", "0.02"),
            StrategyParam::new("transaction_cost", ParamKind::Number, "Proportional cost per fill", "0.001"),
            StrategyParam::new(
                "use_trend_band",
                ParamKind::Boolean,
                "Only enter on a breakout beyond the volatility band",
                "false",
            ),
        ],
        factory: build_default,
        configured: build_configured,
    }
}

fn build_default() -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(MacdStrategy::new(MacdConfig::default())?))
}

fn build_configured(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SimulatorError> {
    Ok(Box::new(MacdStrategy::new(MacdConfig::from_config(config)?)?))
}
