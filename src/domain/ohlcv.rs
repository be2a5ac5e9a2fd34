//! OHLCV bar representation.

use crate::domain::error::BacktestError;
use crate::domain::series::TimeSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Closing prices as a price series. Bars must already be sorted by date;
/// duplicate or out-of-order dates are rejected.
pub fn close_series(bars: &[OhlcvBar]) -> Result<TimeSeries, BacktestError> {
    TimeSeries::from_points(bars.iter().map(|b| (b.date, b.close)))
}
