//! Core domain types and logic.

pub mod series;
pub mod ohlcv;
pub mod indicator;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod config_validation;
pub mod error;
