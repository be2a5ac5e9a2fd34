//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` files with a header row naming at least
//! `date,open,high,low,close,volume` (any order, case-insensitive).

use crate::domain::error::EodtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, EodtraderError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| EodtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let headers = rdr.headers().map_err(|e| EodtraderError::DataSource {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let mut idx = [0usize; 6];
        for (slot, name) in idx.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| EodtraderError::DataSource {
                    reason: format!("missing {} column in {}", name, path.display()),
                })?;
        }

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| EodtraderError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(&record, idx[0], "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                EodtraderError::DataSource {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: parse_field(&record, idx[1], "open")?,
                high: parse_field(&record, idx[2], "high")?,
                low: parse_field(&record, idx[3], "low")?,
                close: parse_field(&record, idx[4], "close")?,
                volume: parse_field(&record, idx[5], "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, EodtraderError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| EodtraderError::DataSource {
            reason: format!("missing {} column", name),
        })
}

fn parse_field<T>(record: &csv::StringRecord, idx: usize, name: &str) -> Result<T, EodtraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    field(record, idx, name)?
        .parse()
        .map_err(|e| EodtraderError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EodtraderError> {
        let mut bars = self.read_bars(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        tracing::debug!(symbol, bars = bars.len(), %start_date, %end_date, "loaded CSV bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EodtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EodtraderError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EodtraderError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EodtraderError> {
        let bars = self.read_bars(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
