//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::csv_tick_adapter::CsvTickAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::SimulatorError;
use crate::domain::portfolio::SimulationResult;
use crate::domain::registry::{self, StrategyRegistry};
use crate::domain::strategy::Strategy;
use crate::domain::tick::Tick;
use crate::domain::trade::TradeType;
use crate::ports::report_port::ReportPort;
use crate::ports::tick_port::TickPort;

pub const DEFAULT_STRATEGY: &str = "macd";
pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

#[derive(Parser, Debug)]
#[command(name = "ticksim", about = "Tick-by-tick trading strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available strategies and their parameters
    Strategies,
    /// Replay a tick file through one strategy
    Simulate {
        /// CSV with `timestamp` and `close` columns
        #[arg(short, long)]
        ticks: PathBuf,
        #[arg(short, long, default_value = DEFAULT_STRATEGY)]
        strategy: String,
        #[arg(short = 'c', long, default_value_t = DEFAULT_INITIAL_CASH)]
        initial_cash: f64,
        /// Only replay ticks from this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// INI file with one section per strategy id
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// History CSV; the trade log goes next to it as `<name>_trades.csv`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Strategies => run_strategies(),
        Command::Simulate {
            ticks,
            strategy,
            initial_cash,
            date,
            params,
            output,
        } => run_simulate(
            &ticks,
            &strategy,
            initial_cash,
            date.as_deref(),
            params.as_deref(),
            output.as_deref(),
        ),
    }
}

fn run_strategies() -> ExitCode {
    print!("{}", format_strategies(registry::global()));
    ExitCode::SUCCESS
}

fn run_simulate(
    ticks_path: &Path,
    strategy_id: &str,
    initial_cash: f64,
    date: Option<&str>,
    params_path: Option<&Path>,
    output_path: Option<&Path>,
) -> ExitCode {
    let date = match date.map(parse_date).transpose() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut strategy = match build_strategy(registry::global(), strategy_id, params_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Loading ticks from {}", ticks_path.display());
    let tick_port = CsvTickAdapter::new(ticks_path);
    let (ticks, result) = match simulate(&tick_port, strategy.as_mut(), initial_cash, date) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(strategy_id, ticks.len(), initial_cash, &result);

    if let Some(output) = output_path {
        if let Err(e) = CsvReportAdapter::new().write(&result, &ticks, output) {
            eprintln!("error: failed to write report: {e}");
            return (&e).into();
        }
        eprintln!(
            "\nReport written to: {} (trades: {})",
            output.display(),
            CsvReportAdapter::trades_path(output).display()
        );
    }
    ExitCode::SUCCESS
}

pub fn parse_date(value: &str) -> Result<NaiveDate, SimulatorError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        SimulatorError::configuration("--date", format!("invalid date '{value}' (expected YYYY-MM-DD)"))
    })
}

/// Look up `id`, configured from `params_path` when one is given.
pub fn build_strategy(
    registry: &StrategyRegistry,
    id: &str,
    params_path: Option<&Path>,
) -> Result<Box<dyn Strategy>, SimulatorError> {
    match params_path {
        Some(path) => {
            eprintln!("Loading parameters from {}", path.display());
            let params = FileConfigAdapter::from_file(path)?;
            registry.create_configured(id, &params)
        }
        None => registry.create(id),
    }
}

/// Fetch ticks and run one simulation over them.
pub fn simulate(
    tick_port: &dyn TickPort,
    strategy: &mut dyn Strategy,
    initial_cash: f64,
    date: Option<NaiveDate>,
) -> Result<(Vec<Tick>, SimulationResult), SimulatorError> {
    let ticks = tick_port.fetch_ticks(date)?;
    if ticks.is_empty() {
        match date {
            Some(date) => {
                return Err(SimulatorError::NoTicks {
                    date: date.to_string(),
                });
            }
            None => warn!("tick source is empty"),
        }
    }
    let result = strategy.execute(&ticks, initial_cash)?;
    Ok((ticks, result))
}

pub fn format_strategies(registry: &StrategyRegistry) -> String {
    let mut out = String::new();
    for info in registry.all().values() {
        let _ = writeln!(out, "{} - {}", info.id, info.name);
        let _ = writeln!(out, "    {}", info.description);
        for param in &info.parameters {
            let _ = writeln!(
                out,
                "    {:<24} {:<8} default {:<10} {}",
                param.name, param.kind, param.default_value, param.description
            );
        }
        out.push('\n');
    }
    out
}

pub fn print_summary(strategy_id: &str, tick_count: usize, initial_cash: f64, result: &SimulationResult) {
    let count = |kind: TradeType| result.trades.iter().filter(|t| t.trade_type == kind).count();
    let return_pct = if initial_cash > 0.0 {
        result.profit_loss / initial_cash * 100.0
    } else {
        0.0
    };

    eprintln!("\n=== Simulation Results ===");
    eprintln!("Strategy:         {}", strategy_id);
    eprintln!("Ticks:            {}", tick_count);
    eprintln!("Initial Cash:     {:.2}", initial_cash);
    eprintln!("Final Value:      {:.2}", result.final_portfolio_value);
    eprintln!("Profit/Loss:      {:.2} ({:.2}%)", result.profit_loss, return_pct);
    eprintln!("Total Trades:     {}", result.trades.len());
    eprintln!(
        "  Long/Exit:      {}/{}",
        count(TradeType::Long),
        count(TradeType::ExitLong)
    );
    eprintln!(
        "  Short/Cover:    {}/{}",
        count(TradeType::Short),
        count(TradeType::ExitShort)
    );
}
