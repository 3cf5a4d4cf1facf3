#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use ticksim::domain::error::SimulatorError;
use ticksim::domain::portfolio::SimulationResult;
pub use ticksim::domain::tick::Tick;
use ticksim::domain::trade::{Side, Trade};
use ticksim::ports::report_port::ReportPort;
use ticksim::ports::tick_port::TickPort;

/// Serves canned ticks, filtered by date prefix like the CSV source.
pub struct MockTickPort {
    pub ticks: Vec<Tick>,
    pub error: Option<String>,
}

impl MockTickPort {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self { ticks, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            ticks: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl TickPort for MockTickPort {
    fn fetch_ticks(&self, date: Option<NaiveDate>) -> Result<Vec<Tick>, SimulatorError> {
        if let Some(reason) = &self.error {
            return Err(SimulatorError::Data {
                reason: reason.clone(),
            });
        }
        let prefix = date.map(|d| d.to_string());
        Ok(self
            .ticks
            .iter()
            .filter(|t| prefix.as_deref().is_none_or(|p| t.timestamp.starts_with(p)))
            .enumerate()
            .map(|(index, t)| Tick::new(t.price, t.timestamp.clone(), index))
            .collect())
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<(SimulationResult, usize, PathBuf)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(
        &self,
        result: &SimulationResult,
        ticks: &[Tick],
        output_path: &Path,
    ) -> Result<(), SimulatorError> {
        self.calls
            .borrow_mut()
            .push((result.clone(), ticks.len(), output_path.to_path_buf()));
        Ok(())
    }
}

/// `"YYYY-MM-DD HH:MM:SS"` for `minute` minutes after `hour:00` on `day`.
pub fn stamp(day: &str, hour: u32, minute: u32) -> String {
    let total = hour * 60 + minute;
    format!("{day} {:02}:{:02}:00", (total / 60) % 24, total % 60)
}

/// One tick per minute from 09:30 on `day`.
pub fn minute_ticks(day: &str, prices: &[f64]) -> Vec<Tick> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Tick::new(p, stamp(day, 9, 30 + i as u32), i))
        .collect()
}

/// Linear ramp of `count` prices from `start` to `end` inclusive.
pub fn ramp(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![start; count];
    }
    (0..count)
        .map(|i| start + (end - start) * i as f64 / (count - 1) as f64)
        .collect()
}

/// Deterministic zig-zag around `base`.
pub fn wave(base: f64, amplitude: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| base + amplitude * ((i as f64) * 0.45).sin() + 0.01 * i as f64)
        .collect()
}

/// Apply each fill to `initial_cash`: sells add `qty * price * (1 - cost)`,
/// buys subtract `qty * price * (1 + cost)`.
pub fn replay_cash(initial_cash: f64, trades: &[Trade], cost: f64) -> f64 {
    trades.iter().fold(initial_cash, |cash, t| match t.side {
        Side::Sell => cash + t.quantity * t.price * (1.0 - cost),
        Side::Buy => cash - t.quantity * t.price * (1.0 + cost),
    })
}

/// Net signed position implied by the trade log.
pub fn replay_position(trades: &[Trade]) -> f64 {
    trades.iter().fold(0.0, |pos, t| match t.side {
        Side::Buy => pos + t.quantity,
        Side::Sell => pos - t.quantity,
    })
}
