//! Report generation port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EodtraderError;
use crate::domain::series::TimeSeries;

/// Port for exporting a finished backtest.
pub trait ReportPort {
    fn write(
        &self,
        prices: &TimeSeries,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), EodtraderError>;
}
