//! Strategy catalog: id -> metadata and factories.
//!
//! Built once by [`StrategyRegistry::builtin`]; [`global`] hands out a
//! process-wide instance that is read-only after construction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use tracing::warn;

use crate::domain::error::SimulatorError;
use crate::domain::strategy::{Strategy, contrarian, fixed_time, macd, mean_reversion, random};
use crate::ports::config_port::ConfigPort;

pub type StrategyFactory = fn() -> Result<Box<dyn Strategy>, SimulatorError>;
pub type ConfiguredFactory = fn(&dyn ConfigPort) -> Result<Box<dyn Strategy>, SimulatorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Boolean,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Number => write!(f, "number"),
            ParamKind::Boolean => write!(f, "boolean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParam {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub default_value: &'static str,
}

impl StrategyParam {
    pub const fn new(
        name: &'static str,
        kind: ParamKind,
        description: &'static str,
        default_value: &'static str,
    ) -> Self {
        StrategyParam {
            name,
            kind,
            description,
            default_value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<StrategyParam>,
    /// Default-configured instance.
    pub factory: StrategyFactory,
    /// Instance configured from the INI section named after `id`.
    pub configured: ConfiguredFactory,
}

#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, StrategyInfo>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the five built-in strategies.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for info in [
            macd::info(),
            mean_reversion::info(),
            contrarian::info(),
            fixed_time::info(),
            random::info(),
        ] {
            let id = info.id;
            if !registry.register(info) {
                warn!(id, "duplicate built-in strategy id ignored");
            }
        }
        registry
    }

    /// Insert `info` unless its id is taken. Existing entries are never replaced.
    pub fn register(&mut self, info: StrategyInfo) -> bool {
        if self.strategies.contains_key(info.id) {
            return false;
        }
        self.strategies.insert(info.id, info);
        true
    }

    pub fn all(&self) -> &BTreeMap<&'static str, StrategyInfo> {
        &self.strategies
    }

    pub fn get(&self, id: &str) -> Option<&StrategyInfo> {
        self.strategies.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.strategies.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.keys().copied()
    }

    fn lookup(&self, id: &str) -> Result<&StrategyInfo, SimulatorError> {
        self.get(id).ok_or_else(|| SimulatorError::UnknownStrategy { id: id.to_string() })
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Strategy>, SimulatorError> {
        (self.lookup(id)?.factory)()
    }

    pub fn create_configured(
        &self,
        id: &str,
        config: &dyn ConfigPort,
    ) -> Result<Box<dyn Strategy>, SimulatorError> {
        (self.lookup(id)?.configured)(config)
    }
}

/// Process-wide registry of the built-in strategies.
pub fn global() -> &'static StrategyRegistry {
    static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();
    REGISTRY.get_or_init(StrategyRegistry::builtin)
}
