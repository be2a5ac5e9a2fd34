//! Date-indexed series of `f64` values.
//!
//! `TimeSeries` is the single concrete series type used for prices, positions,
//! returns, risk-free rates and equity. Its index is strictly increasing, which
//! is checked once at construction, so downstream arithmetic never has to
//! sniff shapes at runtime.

use crate::domain::error::BacktestError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from parallel date and value vectors.
    ///
    /// Fails with `ShapeMismatch` when the vectors differ in length and with
    /// `InvalidInput` when the dates are not strictly increasing.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, BacktestError> {
        if dates.len() != values.len() {
            return Err(BacktestError::ShapeMismatch {
                context: "series construction".into(),
                expected: dates.len(),
                actual: values.len(),
            });
        }

        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(BacktestError::invalid(format!(
                "index is not strictly increasing: {} followed by {}",
                w[0], w[1]
            )));
        }

        Ok(Self { dates, values })
    }

    pub fn from_points<I>(points: I) -> Result<Self, BacktestError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let (dates, values): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        Self::new(dates, values)
    }

    /// A series with `other`'s index and `value` everywhere.
    pub fn constant_like(other: &TimeSeries, value: f64) -> Self {
        Self {
            dates: other.dates.clone(),
            values: vec![value; other.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| self.values[i])
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        match (self.dates.last(), self.values.last()) {
            (Some(&d), Some(&v)) => Some((d, v)),
            _ => None,
        }
    }

    pub fn same_index(&self, other: &TimeSeries) -> bool {
        self.dates == other.dates
    }

    /// Values of `self` at each date of `other`, with `fill` where `self` has
    /// no observation. Dates only present in `self` are dropped.
    pub fn reindex_like(&self, other: &TimeSeries, fill: f64) -> Self {
        let mut values = Vec::with_capacity(other.len());
        let mut j = 0;

        for &date in &other.dates {
            while j < self.dates.len() && self.dates[j] < date {
                j += 1;
            }
            if j < self.dates.len() && self.dates[j] == date {
                values.push(self.values[j]);
            } else {
                values.push(fill);
            }
        }

        Self {
            dates: other.dates.clone(),
            values,
        }
    }

    /// Lag values forward by `periods` on the same index; the first
    /// `periods` slots take `fill`.
    pub fn shift(&self, periods: usize, fill: f64) -> Self {
        let n = self.len();
        let lead = periods.min(n);
        let mut values = Vec::with_capacity(n);
        values.extend(std::iter::repeat_n(fill, lead));
        values.extend_from_slice(&self.values[..n - lead]);

        Self {
            dates: self.dates.clone(),
            values,
        }
    }

    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            dates: self.dates.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Element-wise combination of two series sharing one index.
    pub fn zip_with<F>(&self, other: &TimeSeries, context: &str, f: F) -> Result<Self, BacktestError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if !self.same_index(other) {
            return Err(BacktestError::ShapeMismatch {
                context: context.to_string(),
                expected: self.len(),
                actual: other.len(),
            });
        }

        Ok(Self {
            dates: self.dates.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Build from parts already known to share a valid index.
    pub(crate) fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }
}
