//! CSV export of a backtest's per-period series.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EodtraderError;
use crate::domain::metrics::drawdown_series;
use crate::domain::series::TimeSeries;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 9] = [
    "date",
    "close",
    "position",
    "market_return",
    "strategy_return",
    "excess_return",
    "risk_free",
    "equity",
    "drawdown",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_to<W: std::io::Write>(
        writer: W,
        prices: &TimeSeries,
        result: &BacktestResult,
    ) -> Result<(), EodtraderError> {
        let columns = [
            prices,
            &result.effective_positions,
            &result.market_returns,
            &result.returns,
            &result.excess_returns,
            &result.risk_free_series,
            &result.equity_curve,
        ];
        if let Some(bad) = columns.iter().find(|s| !s.same_index(prices)) {
            return Err(crate::domain::error::BacktestError::ShapeMismatch {
                context: "report columns".into(),
                expected: prices.len(),
                actual: bad.len(),
            }
            .into());
        }
        let drawdown = drawdown_series(&result.equity_curve);

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER).map_err(csv_error)?;

        for (i, date) in prices.dates().iter().enumerate() {
            let mut row = vec![date.format("%Y-%m-%d").to_string()];
            row.extend(columns.iter().map(|s| s.values()[i].to_string()));
            row.push(drawdown.values()[i].to_string());
            wtr.write_record(&row).map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> EodtraderError {
    EodtraderError::Io(std::io::Error::other(e))
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        prices: &TimeSeries,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), EodtraderError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_to(file, prices, result)?;
        tracing::info!(path = output_path, rows = prices.len(), "wrote CSV report");
        Ok(())
    }
}
