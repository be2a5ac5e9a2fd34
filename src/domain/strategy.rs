//! Signal policies that turn a price series into target positions.
//!
//! The engine only sees the resulting position series, so any policy that
//! implements [`PositionPolicy`] can be backtested.

use crate::domain::error::BacktestError;
use crate::domain::indicator::{calculate_sma, compute_oscillator};
use crate::domain::series::TimeSeries;
use chrono::NaiveDate;

pub trait PositionPolicy {
    fn name(&self) -> String;

    /// Target position for each bar, decided with information up to and
    /// including that bar's close.
    fn positions(&self, prices: &TimeSeries) -> Result<TimeSeries, BacktestError>;
}

/// Long when the fast SMA is above the slow SMA and the RSI sits inside
/// `[rsi_low, rsi_high]`; flat otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaRsiPolicy {
    pub fast: usize,
    pub slow: usize,
    pub rsi_length: usize,
    pub rsi_low: f64,
    pub rsi_high: f64,
}

impl Default for SmaRsiPolicy {
    fn default() -> Self {
        Self {
            fast: 10,
            slow: 30,
            rsi_length: 14,
            rsi_low: 35.0,
            rsi_high: 65.0,
        }
    }
}

impl SmaRsiPolicy {
    /// Bars needed before every indicator has warmed up.
    pub fn warmup_bars(&self) -> usize {
        self.fast.max(self.slow).max(self.rsi_length)
    }
}

impl PositionPolicy for SmaRsiPolicy {
    fn name(&self) -> String {
        format!(
            "SMA({}) > SMA({}) & RSI({}) in [{}, {}]",
            self.fast, self.slow, self.rsi_length, self.rsi_low, self.rsi_high
        )
    }

    fn positions(&self, prices: &TimeSeries) -> Result<TimeSeries, BacktestError> {
        let fast = calculate_sma(prices, self.fast);
        let slow = calculate_sma(prices, self.slow);
        let rsi = compute_oscillator(prices, self.rsi_length)?;

        let signal: Vec<f64> = rsi
            .values()
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                let trending = match (fast.valid_value(i), slow.valid_value(i)) {
                    (Some(f), Some(s)) => f > s,
                    _ => false,
                };
                let in_band = r >= self.rsi_low && r <= self.rsi_high;
                if trending && in_band { 1.0 } else { 0.0 }
            })
            .collect();

        TimeSeries::new(prices.dates().to_vec(), signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeMarker {
    pub date: NaiveDate,
    pub kind: MarkerKind,
}

/// Dates where the position steps from flat to long (entry) or long to
/// flat (exit).
pub fn trade_markers(positions: &TimeSeries) -> Vec<TradeMarker> {
    positions
        .dates()
        .iter()
        .skip(1)
        .zip(positions.values().windows(2))
        .filter_map(|(&date, w)| {
            let kind = match w[1] - w[0] {
                d if d == 1.0 => MarkerKind::Entry,
                d if d == -1.0 => MarkerKind::Exit,
                _ => return None,
            };
            Some(TradeMarker { date, kind })
        })
        .collect()
}
