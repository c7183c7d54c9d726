//! Symbol identity, metadata and the deferred values accessor.
//!
//! A [`Symbol`] carries everything known about an instrument without holding
//! any of its data: the values are produced on demand by a [`ValuesLoader`]
//! each time [`Symbol::values`] is called.

use crate::data::DataError;
use chrono::{Datelike, NaiveDate};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Global primary key of a symbol: `namespace/ticker`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    pub namespace: String,
    pub ticker: String,
}

impl SymbolId {
    pub fn new(namespace: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ticker: ticker.into(),
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.ticker)
    }
}

/// Identifier string without a usable `namespace/ticker` split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed identifier '{id}': expected 'namespace/ticker'")]
pub struct MalformedId {
    pub id: String,
}

impl FromStr for SymbolId {
    type Err = MalformedId;

    /// Splits on the first `/`. Both halves must be non-empty after trimming.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MalformedId { id: s.to_string() };
        let (namespace, ticker) = s.split_once('/').ok_or_else(malformed)?;
        let (namespace, ticker) = (namespace.trim(), ticker.trim());
        if namespace.is_empty() || ticker.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(namespace, ticker))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Currency {
    Rub,
    Usd,
    Eur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityType {
    StockEtf,
    Currency,
    Inflation,
    Index,
    MutualFund,
}

/// Sampling granularity of a value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    Day,
    Month,
}

/// A calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Truncates a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Month string that is not a valid `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed month period '{period}': expected YYYY-MM")]
pub struct MalformedPeriod {
    pub period: String,
}

impl FromStr for MonthPeriod {
    type Err = MalformedPeriod;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MalformedPeriod {
            period: s.to_string(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

/// Inclusive month range used to filter a value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueWindow {
    pub start: MonthPeriod,
    pub end: MonthPeriod,
}

impl ValueWindow {
    pub fn new(start: MonthPeriod, end: MonthPeriod) -> Self {
        Self { start, end }
    }

    /// True if the month of `date` lies within `[start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let period = MonthPeriod::from_date(date);
        self.start <= period && period <= self.end
    }
}

/// Optional, provider-dependent metadata of a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolInfo {
    pub isin: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<Currency>,
    pub security_type: Option<SecurityType>,
    pub period: Option<Period>,
    pub adjusted_close: Option<bool>,
    /// First date with data, when the provider publishes it.
    pub start_date: Option<NaiveDate>,
    /// Last date with data, when the provider publishes it.
    pub end_date: Option<NaiveDate>,
}

/// Deferred producer of a symbol's value series.
///
/// Every call may hit a remote endpoint; implementations own whatever they
/// need (URL, row id) by value so that distinct symbols never share state.
pub trait ValuesLoader: Send + Sync {
    /// Fetch the series as a frame with columns `date` and `close`, keeping
    /// only rows inside `window` when one is given.
    fn load(&self, window: Option<ValueWindow>) -> Result<DataFrame, DataError>;
}

/// A resolved instrument: identity, metadata and a values accessor.
#[derive(Clone, Serialize)]
pub struct Symbol {
    #[serde(flatten)]
    pub id: SymbolId,
    #[serde(flatten)]
    pub info: SymbolInfo,
    #[serde(skip)]
    values: Arc<dyn ValuesLoader>,
}

impl Symbol {
    pub fn new(id: SymbolId, info: SymbolInfo, values: Arc<dyn ValuesLoader>) -> Self {
        Self { id, info, values }
    }

    pub fn namespace(&self) -> &str {
        &self.id.namespace
    }

    pub fn ticker(&self) -> &str {
        &self.id.ticker
    }

    /// Fetch the value series. The result is not retained by the symbol.
    pub fn values(&self, window: Option<ValueWindow>) -> Result<DataFrame, DataError> {
        self.values.load(window)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.info == other.info
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("id", &self.id)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespace_and_ticker() {
        let id: SymbolId = "micex/SBER".parse().unwrap();
        assert_eq!(id, SymbolId::new("micex", "SBER"));
        assert_eq!(id.to_string(), "micex/SBER");
    }

    #[test]
    fn splits_on_first_slash_only() {
        let id: SymbolId = "nlu/a/b".parse().unwrap();
        assert_eq!(id.namespace, "nlu");
        assert_eq!(id.ticker, "a/b");
    }

    #[test]
    fn rejects_missing_separator() {
        let err = "SBER".parse::<SymbolId>().unwrap_err();
        assert_eq!(err.id, "SBER");
    }

    #[test]
    fn rejects_empty_halves() {
        assert!("/SBER".parse::<SymbolId>().is_err());
        assert!("micex/".parse::<SymbolId>().is_err());
        assert!(" / ".parse::<SymbolId>().is_err());
    }

    #[test]
    fn month_period_ordering_is_chronological() {
        let a = MonthPeriod::new(2015, 12).unwrap();
        let b = MonthPeriod::new(2016, 1).unwrap();
        assert!(a < b);
        assert_eq!("2016-01".parse::<MonthPeriod>().unwrap(), b);
        assert_eq!(b.to_string(), "2016-01");
    }

    #[test]
    fn month_period_rejects_bad_month() {
        assert!(MonthPeriod::new(2016, 13).is_none());
        assert!("2016-00".parse::<MonthPeriod>().is_err());
        let err = "2016".parse::<MonthPeriod>().unwrap_err();
        assert_eq!(err.period, "2016");
        assert_eq!(
            err.to_string(),
            "malformed month period '2016': expected YYYY-MM"
        );
    }

    #[test]
    fn window_is_inclusive_at_month_granularity() {
        let window = ValueWindow::new(
            MonthPeriod::new(2016, 2).unwrap(),
            MonthPeriod::new(2016, 4).unwrap(),
        );
        let d = |m, day| NaiveDate::from_ymd_opt(2016, m, day).unwrap();
        assert!(!window.contains(d(1, 31)));
        assert!(window.contains(d(2, 1)));
        assert!(window.contains(d(4, 30)));
        assert!(!window.contains(d(5, 1)));
    }
}
