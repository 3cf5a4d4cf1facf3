//! Simulation report port trait.

use std::path::Path;

use crate::domain::error::SimulatorError;
use crate::domain::portfolio::SimulationResult;
use crate::domain::tick::Tick;

/// Port for writing a finished run. `ticks` are the ticks the run consumed,
/// index-aligned with `result.history`.
pub trait ReportPort {
    fn write(
        &self,
        result: &SimulationResult,
        ticks: &[Tick],
        output_path: &Path,
    ) -> Result<(), SimulatorError>;
}
