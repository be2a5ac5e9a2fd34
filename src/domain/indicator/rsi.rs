//! RSI-style momentum oscillator.
//!
//! Average gain/loss are trailing simple means over `window` periods (not
//! Wilder smoothing):
//! - d[t] = close[t] - close[t-1]; the first bar has no change and counts
//!   as zero in both channels
//! - gain = max(d, 0), loss = max(-d, 0)
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! Warm-up: the first `window - 1` bars read 50 so range filters evaluate
//! deterministically. If avg_loss == 0 the value is 100.

use crate::domain::error::BacktestError;
use crate::domain::series::TimeSeries;

/// Value reported while the trailing window is still filling.
pub const NEUTRAL_OSCILLATOR: f64 = 50.0;

const OSCILLATOR_CEILING: f64 = 100.0;

pub fn compute_oscillator(prices: &TimeSeries, window: usize) -> Result<TimeSeries, BacktestError> {
    if window == 0 {
        return Err(BacktestError::invalid("oscillator window must be at least 1"));
    }

    let closes = prices.values();
    let n = closes.len();

    let mut gains = Vec::with_capacity(n);
    let mut losses = Vec::with_capacity(n);
    gains.push(0.0);
    losses.push(0.0);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }
    gains.truncate(n);
    losses.truncate(n);

    let values = (0..n)
        .map(|i| {
            if i + 1 < window {
                return NEUTRAL_OSCILLATOR;
            }
            let start = i + 1 - window;
            let avg_gain = gains[start..=i].iter().sum::<f64>() / window as f64;
            let avg_loss = losses[start..=i].iter().sum::<f64>() / window as f64;
            if avg_loss == 0.0 {
                OSCILLATOR_CEILING
            } else {
                100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
            }
        })
        .collect();

    Ok(TimeSeries::from_parts(prices.dates().to_vec(), values))
}
