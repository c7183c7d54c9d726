//! Symbol sources: provider plugins that enumerate one group of instruments.
//!
//! - [`SingleItemSource`]: one instrument, eager metadata, lazy values
//! - [`CatalogSource`]: an index file lists many instruments
//! - [`WindowedCatalogSource`]: catalog with valid date ranges and cached,
//!   month-windowed values
//! - [`QuandlSource`]: computed on demand from a third-party API

pub mod catalog;
pub mod quandl;
pub mod single;
pub mod windowed;

pub use catalog::{CatalogColumns, CatalogOptions, CatalogSource};
pub use quandl::{QuandlSource, QUANDL_KEY_VAR, QUANDL_NAMESPACE};
pub use single::{SingleItemOptions, SingleItemSource};
pub use windowed::{WindowedCatalogOptions, WindowedCatalogSource};

use crate::data::{series, DataError, TableFetcher};
use crate::registry::LookupError;
use crate::symbol::{Symbol, ValueWindow, ValuesLoader};
use polars::prelude::DataFrame;
use std::sync::Arc;

/// A provider that owns one namespace (or part of one) and lists its symbols.
///
/// `enumerate` is called once when the registry is built but must stay safe
/// to call again: it never mutates state outside the source.
pub trait SymbolSource: Send + Sync {
    fn namespace(&self) -> &str;

    fn enumerate(&self) -> Vec<Symbol>;
}

/// A namespace whose symbols are built on request instead of enumerated.
pub trait ComputedSource: Send + Sync {
    fn namespace(&self) -> &str;

    fn resolve(&self, ticker: &str) -> Result<Symbol, LookupError>;
}

/// Default value column of tab-separated series.
pub(crate) fn default_value_column() -> String {
    series::CLOSE_COLUMN.to_string()
}

/// Join a base URL and a relative path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Fetches one fixed URL on every call.
pub(crate) struct UrlLoader {
    pub url: String,
    pub value_column: String,
    pub fetcher: Arc<dyn TableFetcher>,
}

impl ValuesLoader for UrlLoader {
    fn load(&self, window: Option<ValueWindow>) -> Result<DataFrame, DataError> {
        let table = self.fetcher.fetch(&self.url)?;
        series::table_to_frame(&table, &self.value_column, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/data/", "/a.csv"), "http://h/data/a.csv");
        assert_eq!(join_url("http://h/data", "a.csv"), "http://h/data/a.csv");
    }
}
