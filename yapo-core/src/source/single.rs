//! Source of exactly one instrument backed by one URL.

use super::{default_value_column, join_url, SymbolSource, UrlLoader};
use crate::data::TableFetcher;
use crate::symbol::{Symbol, SymbolId, SymbolInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SingleItemOptions {
    pub namespace: String,
    pub ticker: String,
    /// Path of the series, relative to the data URL.
    pub path: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default)]
    pub info: SymbolInfo,
}

pub struct SingleItemSource {
    symbol: Symbol,
}

impl SingleItemSource {
    /// No I/O happens here; the series is fetched afresh on each values call.
    pub fn new(data_url: &str, options: SingleItemOptions, fetcher: Arc<dyn TableFetcher>) -> Self {
        let loader = UrlLoader {
            url: join_url(data_url, &options.path),
            value_column: options.value_column,
            fetcher,
        };
        let symbol = Symbol::new(
            SymbolId::new(options.namespace, options.ticker),
            options.info,
            Arc::new(loader),
        );
        Self { symbol }
    }
}

impl SymbolSource for SingleItemSource {
    fn namespace(&self) -> &str {
        self.symbol.namespace()
    }

    fn enumerate(&self) -> Vec<Symbol> {
        vec![self.symbol.clone()]
    }
}
