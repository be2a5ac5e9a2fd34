//! Technical indicators over price series.
//!
//! - `IndicatorPoint`: a single point with a validity flag for warm-up bars
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series of indicator points
//!
//! The RSI-style oscillator is total over its input and returns a plain
//! [`TimeSeries`](crate::domain::series::TimeSeries) instead; see [`rsi`].

pub mod rsi;
pub mod sma;

pub use rsi::{compute_oscillator, NEUTRAL_OSCILLATOR};
pub use sma::calculate_sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `index` if the indicator has warmed up there.
    pub fn valid_value(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}
