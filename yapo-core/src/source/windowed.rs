//! Catalog whose rows carry a valid date range and whose values are filtered
//! to a month window.
//!
//! Filtered frames are cached per `(row id, window)` in a bounded LRU cache
//! shared by all rows of the source. The recorded date range is metadata
//! only: windows outside it are not rejected, they just come back short.

use super::catalog::ID_PLACEHOLDER;
use super::{default_value_column, join_url, SymbolSource};
use crate::data::cache::DEFAULT_CAPACITY;
use crate::data::series::{self, parse_date};
use crate::data::{DataError, LruCache, Table, TableFetcher};
use crate::symbol::{Symbol, SymbolId, SymbolInfo, ValueWindow, ValuesLoader};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

type WindowKey = (String, Option<ValueWindow>);
type WindowCache = LruCache<WindowKey, DataFrame>;

fn default_id_column() -> String {
    "name".to_string()
}

fn default_start_column() -> String {
    "date_start".to_string()
}

fn default_end_column() -> String {
    "date_end".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowedCatalogOptions {
    pub namespace: String,
    pub index_path: String,
    /// Per-row series path with `{id}` substituted.
    pub values_path: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_start_column")]
    pub start_column: String,
    #[serde(default = "default_end_column")]
    pub end_column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Unset means the global setting, or 512 when built directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,
    #[serde(default)]
    pub defaults: SymbolInfo,
}

#[derive(Debug, Clone, PartialEq)]
struct WindowedRow {
    id: String,
    start: NaiveDate,
    end: NaiveDate,
}

pub struct WindowedCatalogSource {
    namespace: String,
    data_url: String,
    values_path: String,
    value_column: String,
    defaults: SymbolInfo,
    rows: Vec<WindowedRow>,
    fetcher: Arc<dyn TableFetcher>,
    cache: Arc<WindowCache>,
}

impl WindowedCatalogSource {
    /// Fetch and parse the index, including each row's date range.
    pub fn connect(
        data_url: &str,
        options: WindowedCatalogOptions,
        fetcher: Arc<dyn TableFetcher>,
    ) -> Result<Self, DataError> {
        let index_url = join_url(data_url, &options.index_path);
        let index = fetcher.fetch(&index_url)?;
        let rows = parse_index(&index, &options, &index_url)?;
        let cache_capacity = options.cache_capacity.unwrap_or(DEFAULT_CAPACITY);

        info!(
            namespace = %options.namespace,
            rows = rows.len(),
            cache_capacity,
            "windowed catalog index loaded"
        );

        Ok(Self {
            namespace: options.namespace,
            data_url: data_url.to_string(),
            values_path: options.values_path,
            value_column: options.value_column,
            defaults: options.defaults,
            rows,
            fetcher,
            cache: Arc::new(LruCache::new(cache_capacity)),
        })
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Number of cached `(row id, window)` frames.
    pub fn cached_frames(&self) -> usize {
        self.cache.len()
    }

    fn row_symbol(&self, row: &WindowedRow) -> Symbol {
        let mut info = self.defaults.clone();
        info.start_date = Some(row.start);
        info.end_date = Some(row.end);

        let loader = WindowedLoader {
            row_id: row.id.clone(),
            url: join_url(&self.data_url, &self.values_path.replace(ID_PLACEHOLDER, &row.id)),
            value_column: self.value_column.clone(),
            fetcher: self.fetcher.clone(),
            cache: self.cache.clone(),
        };
        Symbol::new(
            SymbolId::new(self.namespace.clone(), row.id.clone()),
            info,
            Arc::new(loader),
        )
    }
}

impl SymbolSource for WindowedCatalogSource {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn enumerate(&self) -> Vec<Symbol> {
        self.rows.iter().map(|row| self.row_symbol(row)).collect()
    }
}

struct WindowedLoader {
    row_id: String,
    url: String,
    value_column: String,
    fetcher: Arc<dyn TableFetcher>,
    cache: Arc<WindowCache>,
}

impl ValuesLoader for WindowedLoader {
    fn load(&self, window: Option<ValueWindow>) -> Result<DataFrame, DataError> {
        let key = (self.row_id.clone(), window);
        if let Some(df) = self.cache.get(&key) {
            debug!(row = %self.row_id, ?window, "value cache hit");
            return Ok(df);
        }

        debug!(row = %self.row_id, ?window, "value cache miss");
        let table = self.fetcher.fetch(&self.url)?;
        let df = series::table_to_frame(&table, &self.value_column, window)?;
        self.cache.insert(key, df.clone());
        Ok(df)
    }
}

fn parse_index(
    index: &Table,
    options: &WindowedCatalogOptions,
    index_url: &str,
) -> Result<Vec<WindowedRow>, DataError> {
    let id_col = index.require_column(&options.id_column, index_url)?;
    let start_col = index.require_column(&options.start_column, index_url)?;
    let end_col = index.require_column(&options.end_column, index_url)?;

    let date = |row: usize, col: usize, name: &str| -> Result<NaiveDate, DataError> {
        let raw = index.cell(row, col).unwrap_or_default();
        parse_date(raw).ok_or_else(|| {
            DataError::Parse(format!("{index_url}: bad {name} '{raw}' at row {}", row + 1))
        })
    };

    (0..index.len())
        .map(|row| {
            let id = index.cell(row, id_col).ok_or_else(|| {
                DataError::Parse(format!(
                    "{index_url}: empty '{}' at row {}",
                    options.id_column,
                    row + 1
                ))
            })?;
            Ok(WindowedRow {
                id: id.to_string(),
                start: date(row, start_col, &options.start_column)?,
                end: date(row, end_col, &options.end_column)?,
            })
        })
        .collect()
}
