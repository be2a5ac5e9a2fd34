//! Performance metrics over a backtest's equity curve and returns.
//!
//! All outputs are finite: short histories and zero-variance return streams
//! resolve to 0 instead of dividing by zero.

use super::backtest::TRADING_DAYS_PER_YEAR;
use super::series::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsReport {
    pub total_return_pct: f64,
    pub cagr_pct: f64,
    /// Most negative peak-to-trough decline, as a percentage (<= 0).
    pub max_drawdown_pct: f64,
    /// Annualized Sharpe ratio of excess returns.
    pub sharpe: f64,
}

pub fn report(equity_curve: &TimeSeries, returns: &TimeSeries, risk_free_series: &TimeSeries) -> MetricsReport {
    let final_equity = equity_curve.last().map(|(_, e)| e).unwrap_or(1.0);
    let total_return = final_equity - 1.0;

    let cagr = compute_cagr(final_equity, returns.len());
    let max_drawdown = drawdown_series(equity_curve)
        .values()
        .iter()
        .copied()
        .fold(0.0_f64, f64::min);
    let sharpe = compute_sharpe(&excess_over_union(returns, risk_free_series));

    MetricsReport {
        total_return_pct: total_return * 100.0,
        cagr_pct: cagr * 100.0,
        max_drawdown_pct: max_drawdown * 100.0,
        sharpe,
    }
}

/// equity[t] / max(equity[..=t]) - 1 for every period.
pub fn drawdown_series(equity_curve: &TimeSeries) -> TimeSeries {
    let mut peak = f64::NEG_INFINITY;
    let values = equity_curve
        .values()
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            if peak > 0.0 { e / peak - 1.0 } else { 0.0 }
        })
        .collect();
    TimeSeries::from_parts(equity_curve.dates().to_vec(), values)
}

fn compute_cagr(final_equity: f64, periods: usize) -> f64 {
    if periods <= 1 {
        return 0.0;
    }
    if final_equity <= 0.0 {
        return -1.0;
    }
    let years = periods as f64 / TRADING_DAYS_PER_YEAR;
    let cagr = final_equity.powf(1.0 / years) - 1.0;
    if cagr.is_finite() { cagr } else { 0.0 }
}

/// returns - rf over the union of both indices; a date present in only one
/// series contributes 0.
fn excess_over_union(returns: &TimeSeries, risk_free: &TimeSeries) -> Vec<f64> {
    let (rd, rv) = (returns.dates(), returns.values());
    let (fd, fv) = (risk_free.dates(), risk_free.values());
    let mut excess = Vec::with_capacity(rd.len().max(fd.len()));
    let (mut i, mut j) = (0, 0);

    while i < rd.len() || j < fd.len() {
        match (rd.get(i), fd.get(j)) {
            (Some(a), Some(b)) if a == b => {
                excess.push(rv[i] - fv[j]);
                i += 1;
                j += 1;
            }
            (Some(a), Some(b)) if a < b => {
                excess.push(0.0);
                i += 1;
            }
            (Some(_), None) => {
                excess.push(0.0);
                i += 1;
            }
            _ => {
                excess.push(0.0);
                j += 1;
            }
        }
    }

    excess
}

fn compute_sharpe(excess: &[f64]) -> f64 {
    if excess.len() < 2 {
        return 0.0;
    }

    if excess.iter().all(|&r| r == excess[0]) {
        return 0.0;
    }

    let n = excess.len() as f64;
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    // Summation error of the mean is bounded by n ulps of the largest value.
    let scale = excess.iter().fold(mean.abs(), |m, r| m.max(r.abs()));
    if stddev.is_nan() || stddev <= n * f64::EPSILON * scale {
        return 0.0;
    }

    let sharpe = TRADING_DAYS_PER_YEAR.sqrt() * mean / stddev;
    if sharpe.is_finite() { sharpe } else { 0.0 }
}
