//! eodtrader: end-of-day strategy backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The engine entry points are
//! [`compute_oscillator`], [`backtest`] and [`report`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

pub use domain::backtest::{backtest, BacktestResult};
pub use domain::indicator::compute_oscillator;
pub use domain::metrics::{report, MetricsReport};
pub use domain::series::TimeSeries;
