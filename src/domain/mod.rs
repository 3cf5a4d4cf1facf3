//! Core domain types and logic.

pub mod error;
pub mod estimator;
pub mod portfolio;
pub mod registry;
pub mod strategy;
pub mod tick;
pub mod trade;
