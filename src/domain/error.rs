//! Domain error types.

use chrono::NaiveDate;

/// Errors raised at the boundary of the backtest engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BacktestError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Aligned series disagree in length or index. Indicates a defect in
    /// alignment, not a user error.
    #[error("shape mismatch in {context}: expected {expected} points, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("strategy return {value} on {date} is outside the supported domain (must be > -100%)")]
    ReturnOutOfDomain { date: NaiveDate, value: f64 },
}

impl BacktestError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BacktestError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Top-level error type for eodtrader.
#[derive(Debug, thiserror::Error)]
pub enum EodtraderError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EodtraderError> for std::process::ExitCode {
    fn from(err: &EodtraderError) -> Self {
        let code: u8 = match err {
            EodtraderError::Io(_) => 1,
            EodtraderError::ConfigParse { .. }
            | EodtraderError::ConfigMissing { .. }
            | EodtraderError::ConfigInvalid { .. } => 2,
            EodtraderError::DataSource { .. } => 3,
            EodtraderError::NoData { .. } | EodtraderError::InsufficientData { .. } => 5,
            EodtraderError::Backtest(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
