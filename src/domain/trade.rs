//! Trade log entries.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    Long,
    Short,
    ExitLong,
    ExitShort,
}

impl TradeType {
    /// Opening buys and covering buys take cash; the rest are sells.
    pub fn side(&self) -> Side {
        match self {
            TradeType::Long | TradeType::ExitShort => Side::Buy,
            TradeType::Short | TradeType::ExitLong => Side::Sell,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, TradeType::Long | TradeType::Short)
    }

    /// Sign applied to the quantity when updating the signed position.
    pub fn position_sign(&self) -> f64 {
        match self.side() {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Long => write!(f, "LONG"),
            TradeType::Short => write!(f, "SHORT"),
            TradeType::ExitLong => write!(f, "EXIT_LONG"),
            TradeType::ExitShort => write!(f, "EXIT_SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub time_step: usize,
    pub trade_type: TradeType,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
}

impl Trade {
    pub fn new(time_step: usize, trade_type: TradeType, price: f64, quantity: f64) -> Self {
        Trade {
            time_step,
            trade_type,
            side: trade_type.side(),
            price,
            quantity,
        }
    }

    pub fn notional(&self) -> f64 {
        self.quantity * self.price
    }
}
