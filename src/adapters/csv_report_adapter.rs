//! CSV report writer.
//!
//! Writes one row per tick to the requested path and the trade log to a
//! sibling `<stem>_trades.csv`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::domain::error::SimulatorError;
use crate::domain::portfolio::SimulationResult;
use crate::domain::tick::Tick;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    step: usize,
    timestamp: &'a str,
    price: f64,
    indicator_a: f64,
    indicator_b: f64,
    portfolio_value: f64,
    position: f64,
    cash: f64,
    trend: f64,
    volatility: f64,
    trade: String,
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// `runs/out.csv` -> `runs/out_trades.csv`
    pub fn trades_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        output_path.with_file_name(format!("{stem}_trades.csv"))
    }
}

fn csv_error(path: &Path, e: csv::Error) -> SimulatorError {
    SimulatorError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &SimulationResult,
        ticks: &[Tick],
        output_path: &Path,
    ) -> Result<(), SimulatorError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(|e| csv_error(output_path, e))?;
        for (step, (point, tick)) in result.history.iter().zip(ticks).enumerate() {
            let trade = result
                .trades
                .iter()
                .filter(|t| t.time_step == step)
                .map(|t| t.trade_type.to_string())
                .collect::<Vec<_>>()
                .join("|");
            writer
                .serialize(HistoryRow {
                    step,
                    timestamp: &tick.timestamp,
                    price: tick.price,
                    indicator_a: point.indicator_a,
                    indicator_b: point.indicator_b,
                    portfolio_value: point.portfolio_value,
                    position: point.position,
                    cash: point.cash,
                    trend: point.trend,
                    volatility: point.volatility,
                    trade,
                })
                .map_err(|e| csv_error(output_path, e))?;
        }
        writer.flush()?;

        let trades_path = Self::trades_path(output_path);
        let mut writer = csv::Writer::from_path(&trades_path).map_err(|e| csv_error(&trades_path, e))?;
        for trade in &result.trades {
            writer
                .serialize(trade)
                .map_err(|e| csv_error(&trades_path, e))?;
        }
        writer.flush()?;

        info!(
            history = %output_path.display(),
            trades = %trades_path.display(),
            "report written"
        );
        Ok(())
    }
}
