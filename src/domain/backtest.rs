//! Vectorized backtest engine.
//!
//! Converts a price series and a target-position series into realized
//! strategy returns and a compounding equity curve. A position decided on
//! bar t-1 earns the return of bar t; the first bar always runs flat.
//!
//! BacktestConfig holds the run parameters read from configuration.

use crate::domain::error::BacktestError;
use crate::domain::series::TimeSeries;
use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Annual rate as a fraction (0.05 = 5%).
    pub risk_free_rate: f64,
}

/// Per-period output of [`backtest`], all sharing the price index.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Positions after the one-bar execution lag.
    pub effective_positions: TimeSeries,
    /// Close-to-close price returns of the underlying.
    pub market_returns: TimeSeries,
    /// Realized strategy returns.
    pub returns: TimeSeries,
    pub excess_returns: TimeSeries,
    pub risk_free_series: TimeSeries,
    pub equity_curve: TimeSeries,
}

impl BacktestResult {
    /// Growth of one unit of capital at the last bar (1.0 when empty).
    pub fn final_equity(&self) -> f64 {
        self.equity_curve.last().map(|(_, e)| e).unwrap_or(1.0)
    }
}

/// Convert an annual rate into the compounding-equivalent per-period rate.
pub fn periodic_risk_free_rate(annual_rate: f64) -> Result<f64, BacktestError> {
    if !annual_rate.is_finite() || annual_rate < -1.0 {
        return Err(BacktestError::invalid(format!(
            "risk-free rate must be finite and >= -1, got {}",
            annual_rate
        )));
    }
    Ok((1.0 + annual_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0)
}

pub fn backtest(
    prices: &TimeSeries,
    positions: &TimeSeries,
    risk_free_annual_rate: f64,
) -> Result<BacktestResult, BacktestError> {
    validate_prices(prices)?;
    let rf_period = periodic_risk_free_rate(risk_free_annual_rate)?;

    let aligned = positions.reindex_like(prices, 0.0);
    let effective_positions = aligned.shift(1, 0.0);
    check_shape(prices, &effective_positions, "effective positions")?;

    let closes = prices.values();
    let mut market = Vec::with_capacity(closes.len());
    market.push(0.0);
    market.extend(closes.windows(2).map(|w| w[1] / w[0] - 1.0));
    let market_returns = TimeSeries::from_parts(prices.dates().to_vec(), market);

    let returns = effective_positions.zip_with(&market_returns, "strategy returns", |p, r| p * r)?;

    if let Some((date, value)) = returns.iter().find(|&(_, r)| !(r > -1.0 && r.is_finite())) {
        return Err(BacktestError::ReturnOutOfDomain { date, value });
    }

    let risk_free_series = TimeSeries::constant_like(prices, rf_period);
    let excess_returns = returns.zip_with(&risk_free_series, "excess returns", |r, rf| r - rf)?;

    let equity: Vec<f64> = returns
        .values()
        .iter()
        .scan(1.0, |equity, &r| {
            *equity *= 1.0 + r;
            Some(*equity)
        })
        .collect();
    let equity_curve = TimeSeries::from_parts(prices.dates().to_vec(), equity);
    check_shape(prices, &equity_curve, "equity curve")?;

    tracing::debug!(
        periods = prices.len(),
        invested = effective_positions.values().iter().filter(|&&p| p != 0.0).count(),
        final_equity = equity_curve.last().map(|(_, e)| e),
        "backtest complete"
    );

    Ok(BacktestResult {
        effective_positions,
        market_returns,
        returns,
        excess_returns,
        risk_free_series,
        equity_curve,
    })
}

fn validate_prices(prices: &TimeSeries) -> Result<(), BacktestError> {
    if prices.is_empty() {
        return Err(BacktestError::invalid("price series is empty"));
    }
    if let Some((date, price)) = prices.iter().find(|&(_, p)| !(p > 0.0 && p.is_finite())) {
        return Err(BacktestError::invalid(format!(
            "price on {} must be positive and finite, got {}",
            date, price
        )));
    }
    Ok(())
}

fn check_shape(expected: &TimeSeries, actual: &TimeSeries, context: &str) -> Result<(), BacktestError> {
    if expected.same_index(actual) {
        Ok(())
    } else {
        Err(BacktestError::ShapeMismatch {
            context: context.to_string(),
            expected: expected.len(),
            actual: actual.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_points(values.iter().enumerate().map(|(i, &v)| (day(i), v))).unwrap()
    }

    #[test]
    fn worked_example_always_long() {
        let prices = series(&[100.0, 110.0, 99.0, 108.9]);
        let positions = series(&[1.0, 1.0, 1.0, 1.0]);
        let result = backtest(&prices, &positions, 0.0).unwrap();

        assert_eq!(result.effective_positions.values(), &[0.0, 1.0, 1.0, 1.0]);

        let expected_returns = [0.0, 0.10, -0.10, 0.10];
        let expected_equity = [1.0, 1.10, 0.99, 1.089];
        for i in 0..4 {
            assert_relative_eq!(result.returns.values()[i], expected_returns[i], epsilon = 1e-12);
            assert_relative_eq!(result.equity_curve.values()[i], expected_equity[i], epsilon = 1e-12);
        }
        assert_relative_eq!(result.final_equity(), 1.089, epsilon = 1e-12);
    }

    #[test]
    fn first_effective_position_is_flat() {
        let prices = series(&[10.0, 11.0]);
        let positions = series(&[1.0, 1.0]);
        let result = backtest(&prices, &positions, 0.0).unwrap();
        assert_eq!(result.effective_positions.values()[0], 0.0);
        assert_eq!(result.returns.values()[0], 0.0);
        assert_eq!(result.equity_curve.values()[0], 1.0);
    }

    #[test]
    fn signal_earns_next_bar_only() {
        // Signal turns on at bar 2; bar 2's +50% must not be earned.
        let prices = series(&[100.0, 100.0, 150.0, 165.0]);
        let positions = series(&[0.0, 0.0, 1.0, 1.0]);
        let result = backtest(&prices, &positions, 0.0).unwrap();

        assert_eq!(result.returns.values()[2], 0.0);
        assert_relative_eq!(result.returns.values()[3], 0.10, epsilon = 1e-12);
    }

    #[test]
    fn missing_positions_treated_as_flat() {
        let prices = series(&[100.0, 101.0, 102.0, 103.0]);
        let positions = TimeSeries::from_points([(day(1), 1.0), (day(40), 1.0)]).unwrap();
        let result = backtest(&prices, &positions, 0.0).unwrap();

        assert_eq!(result.effective_positions.values(), &[0.0, 0.0, 1.0, 0.0]);
        assert!(result.returns.same_index(&prices));
    }

    #[test]
    fn empty_positions_run_flat() {
        let prices = series(&[100.0, 120.0]);
        let result = backtest(&prices, &TimeSeries::default(), 0.0).unwrap();
        assert_eq!(result.equity_curve.values(), &[1.0, 1.0]);
    }

    #[test]
    fn fractional_and_short_positions_accepted() {
        let prices = series(&[100.0, 110.0, 121.0]);
        let positions = series(&[-0.5, 0.5, 0.0]);
        let result = backtest(&prices, &positions, 0.0).unwrap();

        assert_relative_eq!(result.returns.values()[1], -0.05, epsilon = 1e-12);
        assert_relative_eq!(result.returns.values()[2], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn risk_free_conversion() {
        let prices = series(&[100.0, 100.0]);
        let result = backtest(&prices, &series(&[0.0, 0.0]), 0.05).unwrap();
        let daily = 1.05_f64.powf(1.0 / 252.0) - 1.0;

        for &rf in result.risk_free_series.values() {
            assert_relative_eq!(rf, daily, epsilon = 1e-15);
        }
        for &ex in result.excess_returns.values() {
            assert_relative_eq!(ex, -daily, epsilon = 1e-15);
        }
    }

    #[test]
    fn risk_free_zero_and_total_loss_rate() {
        assert_eq!(periodic_risk_free_rate(0.0).unwrap(), 0.0);
        assert_eq!(periodic_risk_free_rate(-1.0).unwrap(), -1.0);
        assert!(periodic_risk_free_rate(-1.5).is_err());
        assert!(periodic_risk_free_rate(f64::NAN).is_err());
        assert!(periodic_risk_free_rate(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn rejects_empty_prices() {
        let err = backtest(&TimeSeries::default(), &TimeSeries::default(), 0.0).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_non_positive_prices() {
        for bad in [0.0, -1.0, f64::NAN] {
            let prices = series(&[100.0, bad]);
            let err = backtest(&prices, &series(&[1.0, 1.0]), 0.0).unwrap_err();
            assert!(matches!(err, BacktestError::InvalidInput { .. }));
        }
    }

    #[test]
    fn flags_wipeout_return() {
        // 2x leverage through a 60% drop would take equity negative.
        let prices = series(&[100.0, 100.0, 40.0]);
        let positions = series(&[2.0, 2.0, 2.0]);
        let err = backtest(&prices, &positions, 0.0).unwrap_err();
        assert!(matches!(err, BacktestError::ReturnOutOfDomain { date, .. } if date == day(2)));
    }

    #[test]
    fn flags_exact_total_loss() {
        let prices = series(&[100.0, 100.0, 200.0]);
        let positions = series(&[-1.0, -1.0, -1.0]);
        let err = backtest(&prices, &positions, 0.0).unwrap_err();
        assert!(matches!(err, BacktestError::ReturnOutOfDomain { value, .. } if value == -1.0));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let prices = series(&[100.0, 103.0, 99.5, 101.2, 104.9]);
        let positions = series(&[1.0, 0.0, 1.0, 1.0, 0.0]);
        let a = backtest(&prices, &positions, 0.02).unwrap();
        let b = backtest(&prices, &positions, 0.02).unwrap();
        assert_eq!(a, b);
    }
}
