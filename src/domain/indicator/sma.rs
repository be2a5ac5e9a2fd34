//! Simple moving average of closing prices.
//!
//! SMA(n)[i] = mean(close[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::series::TimeSeries;

pub fn calculate_sma(prices: &TimeSeries, period: usize) -> IndicatorSeries {
    let closes = prices.values();
    let mut values = Vec::with_capacity(closes.len());

    for (i, &date) in prices.dates().iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;
        let value = if valid {
            closes[i + 1 - period..=i].iter().sum::<f64>() / period as f64
        } else {
            0.0
        };
        values.push(IndicatorPoint { date, valid, value });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
