//! Portfolio state, per-tick history and the simulation result.

use serde::Serialize;
use tracing::debug;

use super::trade::{Trade, TradeType};

/// Cash and a single signed position (+ long, - short).
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub position: f64,
    pub entry_price: f64,
    pub last_price: f64,
}

impl PortfolioState {
    pub fn new(cash: f64) -> Self {
        PortfolioState {
            cash,
            position: 0.0,
            entry_price: 0.0,
            last_price: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.position > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.position < 0.0
    }

    /// cash + position * price
    pub fn value_at(&self, price: f64) -> f64 {
        self.cash + self.position * price
    }
}

/// Per-tick snapshot. The meaning of `indicator_a`, `indicator_b`, `trend` and
/// `volatility` depends on the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalDataPoint {
    pub indicator_a: f64,
    pub indicator_b: f64,
    pub portfolio_value: f64,
    pub position: f64,
    pub cash: f64,
    pub trend: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub final_portfolio_value: f64,
    pub profit_loss: f64,
    pub trades: Vec<Trade>,
    pub history: Vec<HistoricalDataPoint>,
}

impl SimulationResult {
    pub fn neutral(initial_cash: f64) -> Self {
        SimulationResult {
            final_portfolio_value: initial_cash,
            profit_loss: 0.0,
            trades: Vec::new(),
            history: Vec::new(),
        }
    }

    /// The trade recorded at `time_step`, if any (first one wins).
    pub fn trade_at(&self, time_step: usize) -> Option<&Trade> {
        self.trades.iter().find(|t| t.time_step == time_step)
    }
}

/// Everything a strategy mutates during one run: portfolio state, trade log
/// and per-tick history.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub initial_cash: f64,
    pub state: PortfolioState,
    pub trades: Vec<Trade>,
    pub history: Vec<HistoricalDataPoint>,
}

impl Default for Book {
    fn default() -> Self {
        Book::new(0.0)
    }
}

impl Book {
    pub fn new(initial_cash: f64) -> Self {
        Book {
            initial_cash,
            state: PortfolioState::new(initial_cash),
            trades: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn reset(&mut self, initial_cash: f64, expected_ticks: usize) {
        self.initial_cash = initial_cash;
        self.state = PortfolioState::new(initial_cash);
        self.trades.clear();
        self.history.clear();
        self.history.reserve(expected_ticks);
    }

    /// Snapshot of the current state valued at `price`.
    pub fn snapshot(
        &self,
        price: f64,
        indicator_a: f64,
        indicator_b: f64,
        trend: f64,
        volatility: f64,
    ) -> HistoricalDataPoint {
        HistoricalDataPoint {
            indicator_a,
            indicator_b,
            portfolio_value: self.state.value_at(price),
            position: self.state.position,
            cash: self.state.cash,
            trend,
            volatility,
        }
    }

    /// Write the history entry for `step`, replacing any earlier one.
    pub fn record(&mut self, step: usize, point: HistoricalDataPoint) {
        if step < self.history.len() {
            self.history[step] = point;
        } else {
            self.history.push(point);
        }
    }

    /// Apply a fill: move `cash_delta` into cash, adjust the position by the
    /// signed quantity and log the trade. Entries set the entry price; a fill
    /// that leaves the book flat clears it.
    pub fn fill(
        &mut self,
        step: usize,
        trade_type: TradeType,
        price: f64,
        quantity: f64,
        cash_delta: f64,
    ) {
        self.state.cash += cash_delta;
        self.state.position += trade_type.position_sign() * quantity;
        if trade_type.is_entry() {
            self.state.entry_price = price;
        } else if self.state.is_flat() {
            self.state.entry_price = 0.0;
        }
        let trade = Trade::new(step, trade_type, price, quantity);
        debug!(
            step,
            trade = %trade.trade_type,
            side = %trade.side,
            price,
            quantity,
            cash = self.state.cash,
            "fill"
        );
        self.trades.push(trade);
    }

    /// Buy `quantity` and pay `quantity * price * (1 + cost_rate)`.
    pub fn open_long(&mut self, step: usize, price: f64, quantity: f64, cost_rate: f64) {
        let cost = quantity * price * (1.0 + cost_rate);
        self.fill(step, TradeType::Long, price, quantity, -cost);
    }

    /// Sell `quantity` of a long and receive `quantity * price * (1 - cost_rate)`.
    pub fn close_long(&mut self, step: usize, price: f64, quantity: f64, cost_rate: f64) {
        let proceeds = quantity * price * (1.0 - cost_rate);
        self.fill(step, TradeType::ExitLong, price, quantity, proceeds);
    }

    /// Sell short `quantity` and receive `quantity * price * (1 - cost_rate)`.
    pub fn open_short(&mut self, step: usize, price: f64, quantity: f64, cost_rate: f64) {
        let proceeds = quantity * price * (1.0 - cost_rate);
        self.fill(step, TradeType::Short, price, quantity, proceeds);
    }

    /// Buy back `quantity` of a short and pay `quantity * price * (1 + cost_rate)`.
    pub fn close_short(&mut self, step: usize, price: f64, quantity: f64, cost_rate: f64) {
        let cost = quantity * price * (1.0 + cost_rate);
        self.fill(step, TradeType::ExitShort, price, quantity, -cost);
    }

    /// Close whatever is open at `price`: sell a long, cover a short.
    pub fn liquidate(&mut self, step: usize, price: f64, cost_rate: f64) {
        let quantity = self.state.position.abs();
        if self.state.is_long() {
            self.close_long(step, price, quantity, cost_rate);
        } else if self.state.is_short() {
            self.close_short(step, price, quantity, cost_rate);
        }
    }

    /// Hand out the run's result, leaving the logs empty.
    pub fn take_result(&mut self) -> SimulationResult {
        SimulationResult {
            final_portfolio_value: self.state.cash,
            profit_loss: self.state.cash - self.initial_cash,
            trades: std::mem::take(&mut self.trades),
            history: std::mem::take(&mut self.history),
        }
    }
}
