//! Catalog source: an index file lists many instruments of one namespace.
//!
//! The index is fetched once, when the source is connected. Each row becomes
//! a symbol whose loader owns that row's URL, so symbols built in the same
//! loop never share a row.

use super::{default_value_column, join_url, SymbolSource, UrlLoader};
use crate::data::{DataError, Table, TableFetcher};
use crate::symbol::{Symbol, SymbolId, SymbolInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Placeholder for the row id in [`CatalogOptions::values_path`].
pub const ID_PLACEHOLDER: &str = "{id}";

/// Index column names. Only `id` is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogColumns {
    pub id: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub isin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogOptions {
    pub namespace: String,
    /// Index path relative to the data URL.
    pub index_path: String,
    /// Per-row series path relative to the data URL, with `{id}` substituted.
    pub values_path: String,
    pub columns: CatalogColumns,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Metadata shared by every row; row columns override it.
    #[serde(default)]
    pub defaults: SymbolInfo,
}

#[derive(Debug, Clone, PartialEq)]
struct CatalogRow {
    id: String,
    short_name: Option<String>,
    long_name: Option<String>,
    isin: Option<String>,
}

pub struct CatalogSource {
    namespace: String,
    data_url: String,
    values_path: String,
    value_column: String,
    defaults: SymbolInfo,
    rows: Vec<CatalogRow>,
    fetcher: Arc<dyn TableFetcher>,
}

impl CatalogSource {
    /// Fetch and parse the index. Any failure here is fatal for the source.
    pub fn connect(
        data_url: &str,
        options: CatalogOptions,
        fetcher: Arc<dyn TableFetcher>,
    ) -> Result<Self, DataError> {
        let index_url = join_url(data_url, &options.index_path);
        let index = fetcher.fetch(&index_url)?;
        let rows = parse_index(&index, &options.columns, &index_url)?;

        info!(
            namespace = %options.namespace,
            rows = rows.len(),
            "catalog index loaded"
        );

        Ok(Self {
            namespace: options.namespace,
            data_url: data_url.to_string(),
            values_path: options.values_path,
            value_column: options.value_column,
            defaults: options.defaults,
            rows,
            fetcher,
        })
    }

    /// Number of index rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_url(&self, id: &str) -> String {
        join_url(&self.data_url, &self.values_path.replace(ID_PLACEHOLDER, id))
    }

    fn row_symbol(&self, row: &CatalogRow) -> Symbol {
        let mut info = self.defaults.clone();
        if row.short_name.is_some() {
            info.short_name = row.short_name.clone();
        }
        if row.long_name.is_some() {
            info.long_name = row.long_name.clone();
        }
        if row.isin.is_some() {
            info.isin = row.isin.clone();
        }

        let loader = UrlLoader {
            url: self.row_url(&row.id),
            value_column: self.value_column.clone(),
            fetcher: self.fetcher.clone(),
        };
        Symbol::new(
            SymbolId::new(self.namespace.clone(), row.id.clone()),
            info,
            Arc::new(loader),
        )
    }
}

impl SymbolSource for CatalogSource {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn enumerate(&self) -> Vec<Symbol> {
        self.rows.iter().map(|row| self.row_symbol(row)).collect()
    }
}

fn parse_index(
    index: &Table,
    columns: &CatalogColumns,
    index_url: &str,
) -> Result<Vec<CatalogRow>, DataError> {
    let id_col = index.require_column(&columns.id, index_url)?;
    let optional = |name: &Option<String>| -> Result<Option<usize>, DataError> {
        name.as_deref()
            .map(|n| index.require_column(n, index_url))
            .transpose()
    };
    let short_col = optional(&columns.short_name)?;
    let long_col = optional(&columns.long_name)?;
    let isin_col = optional(&columns.isin)?;

    let text = |row: usize, col: Option<usize>| {
        col.and_then(|c| index.cell(row, c)).map(String::from)
    };

    (0..index.len())
        .map(|row| {
            let id = index.cell(row, id_col).ok_or_else(|| {
                DataError::Parse(format!("{index_url}: empty '{}' at row {}", columns.id, row + 1))
            })?;
            Ok(CatalogRow {
                id: id.to_string(),
                short_name: text(row, short_col),
                long_name: text(row, long_col),
                isin: text(row, isin_col),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryFetcher;
    use crate::symbol::{Currency, Period, SecurityType};

    const INDEX_URL: &str = "http://data/moex/stock_etf/stocks_list.csv";
    const INDEX: &str = "SECID\tSHORTNAME\tNAME\tISIN\n\
                         SBER\tСбербанк\tСбербанк России ПАО ао\tRU0009029540\n\
                         GAZP\tГазпром\tГазпром ПАО ао\tRU0007661625\n";

    fn micex_options() -> CatalogOptions {
        CatalogOptions {
            namespace: "micex".into(),
            index_path: "moex/stock_etf/stocks_list.csv".into(),
            values_path: "moex/stock_etf/{id}.csv".into(),
            columns: CatalogColumns {
                id: "SECID".into(),
                short_name: Some("SHORTNAME".into()),
                long_name: Some("NAME".into()),
                isin: Some("ISIN".into()),
            },
            value_column: "close".into(),
            defaults: SymbolInfo {
                exchange: Some("MICEX".into()),
                currency: Some(Currency::Rub),
                security_type: Some(SecurityType::StockEtf),
                period: Some(Period::Day),
                adjusted_close: Some(true),
                ..Default::default()
            },
        }
    }

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with_document(INDEX_URL, INDEX)
            .with_document("http://data/moex/stock_etf/SBER.csv", "date\tclose\n2016-01-04\t100\n")
            .with_document(
                "http://data/moex/stock_etf/GAZP.csv",
                "date\tclose\n2016-01-04\t130\n2016-01-05\t131\n",
            )
    }

    fn micex(fetcher: Arc<MemoryFetcher>) -> CatalogSource {
        CatalogSource::connect("http://data", micex_options(), fetcher).unwrap()
    }

    #[test]
    fn each_row_keeps_its_own_metadata() {
        let source =
            CatalogSource::connect("http://data/", micex_options(), Arc::new(fetcher())).unwrap();
        let symbols = source.enumerate();

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].ticker(), "SBER");
        assert_eq!(symbols[0].info.isin.as_deref(), Some("RU0009029540"));
        assert_eq!(symbols[0].info.short_name.as_deref(), Some("Сбербанк"));
        assert_eq!(symbols[1].ticker(), "GAZP");
        assert_eq!(symbols[1].info.isin.as_deref(), Some("RU0007661625"));
        assert_eq!(symbols[1].info.exchange.as_deref(), Some("MICEX"));
    }

    #[test]
    fn each_row_loads_its_own_series() {
        let fetcher = Arc::new(fetcher());
        let source = micex(fetcher.clone());
        let symbols = source.enumerate();

        assert_eq!(symbols[0].values(None).unwrap().height(), 1);
        assert_eq!(symbols[1].values(None).unwrap().height(), 2);
        assert_eq!(fetcher.fetch_count("http://data/moex/stock_etf/SBER.csv"), 1);
        assert_eq!(fetcher.fetch_count("http://data/moex/stock_etf/GAZP.csv"), 1);
    }

    #[test]
    fn index_is_fetched_once_at_connect() {
        let fetcher = Arc::new(fetcher());
        let source = micex(fetcher.clone());
        source.enumerate();
        source.enumerate();
        assert_eq!(fetcher.fetch_count(INDEX_URL), 1);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn unreachable_index_fails_construction() {
        let fetcher = Arc::new(MemoryFetcher::new());
        let result = CatalogSource::connect("http://data", micex_options(), fetcher);
        assert!(matches!(result, Err(DataError::HttpStatus { status: 404, .. })));
    }

    #[test]
    fn index_without_id_column_fails_construction() {
        let fetcher = MemoryFetcher::new().with_document(INDEX_URL, "TICKER\nSBER\n");
        let result = CatalogSource::connect("http://data", micex_options(), Arc::new(fetcher));
        assert!(matches!(result, Err(DataError::MissingColumn { .. })));
    }

    #[test]
    fn id_only_catalog_has_no_names() {
        let fetcher = MemoryFetcher::new()
            .with_document("http://data/mut_rus/mut_rus.csv", "id\n2277\n0164\n");
        let options = CatalogOptions {
            namespace: "nlu".into(),
            index_path: "mut_rus/mut_rus.csv".into(),
            values_path: "mut_rus/{id}".into(),
            columns: CatalogColumns {
                id: "id".into(),
                short_name: None,
                long_name: None,
                isin: None,
            },
            value_column: "close".into(),
            defaults: SymbolInfo::default(),
        };
        let source = CatalogSource::connect("http://data", options, Arc::new(fetcher)).unwrap();
        let tickers: Vec<_> = source.enumerate().iter().map(|s| s.ticker().to_string()).collect();
        assert_eq!(tickers, vec!["2277", "0164"]);
        assert_eq!(source.row_url("0164"), "http://data/mut_rus/0164");
    }
}
