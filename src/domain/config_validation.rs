//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. The symbol is
//! checked by `cli::build_backtest_config`, after any `--symbol` override.

use crate::domain::error::EodtraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    validate_data(config)?;
    validate_dates(config)?;
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    check_int_range(config, "fast_sma", 10, 2, 200)?;
    check_int_range(config, "slow_sma", 30, 3, 400)?;
    check_int_range(config, "rsi_length", 14, 2, 50)?;
    let low = check_double_range(config, "rsi_low", 35.0, 0.0, 100.0)?;
    let high = check_double_range(config, "rsi_high", 65.0, 0.0, 100.0)?;
    if low > high {
        return Err(invalid(
            "strategy",
            "rsi_low",
            "rsi_low must not exceed rsi_high".into(),
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: String) -> EodtraderError {
    EodtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    match config.get_string("data", "csv_dir") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(EodtraderError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_dir".to_string(),
            })
        }
    }
    if config.get_int("data", "cache_entries", 1) < 1 {
        return Err(invalid(
            "data",
            "cache_entries",
            "cache_entries must be at least 1".into(),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    let start_date = config.get_date("backtest", "start_date")?;
    let end_date = config.get_date("backtest", "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date".into(),
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    let value = config.get_double("backtest", "initial_capital", 10_000.0);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive".into(),
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1".into(),
        ));
    }
    Ok(())
}

fn check_int_range(
    config: &dyn ConfigPort,
    key: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, EodtraderError> {
    let value = config.get_int("strategy", key, default);
    if value < min || value > max {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be between {} and {}", key, min, max),
        ));
    }
    Ok(value)
}

fn check_double_range(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
    min: f64,
    max: f64,
) -> Result<f64, EodtraderError> {
    let value = config.get_double("strategy", key, default);
    if !(min..=max).contains(&value) {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be between {} and {}", key, min, max),
        ));
    }
    Ok(value)
}
