//! Tick data access port trait.

use chrono::NaiveDate;

use crate::domain::error::SimulatorError;
use crate::domain::tick::Tick;

pub trait TickPort {
    /// Ticks in time order, re-indexed from 0. `date` keeps only that day.
    fn fetch_ticks(&self, date: Option<NaiveDate>) -> Result<Vec<Tick>, SimulatorError>;
}
