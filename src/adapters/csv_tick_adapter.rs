//! CSV tick source.
//!
//! Expects a header row with at least `timestamp` and `close` columns, e.g. the
//! `timestamp,open,high,low,close,volume` layout of intraday bar exports.
//! Other columns are ignored. Rows are replayed in file order; a row whose
//! timestamp is earlier than the previous kept row is a data error.

use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::SimulatorError;
use crate::domain::tick::{Tick, parse_timestamp};
use crate::ports::tick_port::TickPort;

#[derive(Debug, Deserialize)]
struct TickRecord {
    timestamp: String,
    close: f64,
}

pub struct CsvTickAdapter {
    path: PathBuf,
}

impl CsvTickAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse CSV content already in memory.
    pub fn parse(content: &str, date: Option<NaiveDate>) -> Result<Vec<Tick>, SimulatorError> {
        let prefix = date.map(|d| d.format("%Y-%m-%d").to_string());
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut records = Vec::new();
        let mut previous: Option<(usize, NaiveDateTime)> = None;

        for (row, result) in rdr.deserialize::<TickRecord>().enumerate() {
            let record = result.map_err(|e| SimulatorError::Data {
                reason: format!("row {}: {}", row + 1, e),
            })?;
            if !record.close.is_finite() {
                return Err(SimulatorError::Data {
                    reason: format!("row {}: close price is not finite", row + 1),
                });
            }
            if let Some(prefix) = &prefix {
                if !record.timestamp.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            // unparseable stamps are kept and left to the strategies
            if let Some(current) = parse_timestamp(&record.timestamp) {
                if let Some((previous_row, previous_time)) = previous {
                    if current < previous_time {
                        return Err(SimulatorError::Data {
                            reason: format!(
                                "row {}: timestamp {} is earlier than row {}",
                                row + 1,
                                record.timestamp,
                                previous_row + 1
                            ),
                        });
                    }
                }
                previous = Some((row, current));
            }
            records.push(record);
        }

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(index, r)| Tick::new(r.close, r.timestamp, index))
            .collect())
    }
}

impl TickPort for CsvTickAdapter {
    fn fetch_ticks(&self, date: Option<NaiveDate>) -> Result<Vec<Tick>, SimulatorError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SimulatorError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let ticks = Self::parse(&content, date)?;
        debug!(path = %self.path.display(), count = ticks.len(), "loaded ticks");
        Ok(ticks)
    }
}
