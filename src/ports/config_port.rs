//! Configuration access port.

use crate::domain::error::EodtraderError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// A required `YYYY-MM-DD` date.
    fn get_date(&self, section: &str, key: &str) -> Result<NaiveDate, EodtraderError> {
        let raw = self
            .get_string(section, key)
            .ok_or_else(|| EodtraderError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            EodtraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }
        })
    }
}
