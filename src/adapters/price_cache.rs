//! Memoizing decorator for any [`DataPort`].
//!
//! Entries are keyed by (symbol, start, end). Capacity is bounded and the
//! oldest insertion is evicted first. Failed fetches are never cached, and
//! `refresh` forces a re-read of a single entry.

use crate::domain::error::EodtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_CACHE_ENTRIES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            start_date,
            end_date,
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Vec<OhlcvBar>>,
    order: VecDeque<CacheKey>,
}

impl CacheState {
    fn insert(&mut self, key: CacheKey, bars: Vec<OhlcvBar>, capacity: usize) {
        if self.entries.insert(key.clone(), bars).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    tracing::debug!(symbol = %oldest.symbol, "evicting cached prices");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) -> bool {
        self.order.retain(|k| k != key);
        self.entries.remove(key).is_some()
    }
}

pub struct PriceCache<P: DataPort> {
    inner: P,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<P: DataPort> PriceCache<P> {
    /// `capacity` is clamped to at least one entry.
    pub fn new(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        self.lock()
            .entries
            .contains_key(&CacheKey::new(symbol, start_date, end_date))
    }

    /// Drop one entry; returns whether it was cached.
    pub fn invalidate(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        self.lock()
            .remove(&CacheKey::new(symbol, start_date, end_date))
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    /// Re-fetch from the underlying port and replace the cached entry. On
    /// failure the previous entry is left untouched.
    pub fn refresh(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EodtraderError> {
        let bars = self.inner.fetch_ohlcv(symbol, start_date, end_date)?;
        let key = CacheKey::new(symbol, start_date, end_date);
        let mut state = self.lock();
        state.remove(&key);
        state.insert(key, bars.clone(), self.capacity);
        Ok(bars)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: DataPort> DataPort for PriceCache<P> {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EodtraderError> {
        let key = CacheKey::new(symbol, start_date, end_date);
        if let Some(bars) = self.lock().entries.get(&key) {
            tracing::debug!(symbol, "price cache hit");
            return Ok(bars.clone());
        }

        tracing::debug!(symbol, "price cache miss");
        let bars = self.inner.fetch_ohlcv(symbol, start_date, end_date)?;
        self.lock().insert(key, bars.clone(), self.capacity);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EodtraderError> {
        self.inner.list_symbols()
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EodtraderError> {
        self.inner.get_data_range(symbol)
    }
}
