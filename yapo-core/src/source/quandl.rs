//! The computed `quandl` namespace.
//!
//! Symbols are never enumerated; any ticker resolves to a symbol whose values
//! come from the `EOD/{ticker}` dataset collapsed to monthly granularity. The
//! API key is checked when the namespace is first used, not at construction.

use super::ComputedSource;
use crate::data::{series, DataError, MarketApi};
use crate::registry::LookupError;
use crate::symbol::{Symbol, SymbolId, SymbolInfo, ValueWindow, ValuesLoader};
use polars::prelude::DataFrame;
use std::sync::Arc;

pub const QUANDL_NAMESPACE: &str = "quandl";

/// Environment variable that supplies the API key.
pub const QUANDL_KEY_VAR: &str = "QUANDL_KEY";

const DATASET_PREFIX: &str = "EOD/";
const MONTHLY: &str = "monthly";

pub struct QuandlSource {
    api: Arc<dyn MarketApi>,
    api_key: Option<String>,
}

impl QuandlSource {
    pub fn new(api: Arc<dyn MarketApi>, api_key: Option<String>) -> Self {
        Self {
            api,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

impl ComputedSource for QuandlSource {
    fn namespace(&self) -> &str {
        QUANDL_NAMESPACE
    }

    fn resolve(&self, ticker: &str) -> Result<Symbol, LookupError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| LookupError::MissingCredential {
                namespace: QUANDL_NAMESPACE.to_string(),
                variable: QUANDL_KEY_VAR.to_string(),
            })?;

        let loader = QuandlLoader {
            dataset: format!("{DATASET_PREFIX}{ticker}"),
            api_key,
            api: self.api.clone(),
        };
        Ok(Symbol::new(
            SymbolId::new(QUANDL_NAMESPACE, ticker),
            SymbolInfo::default(),
            Arc::new(loader),
        ))
    }
}

struct QuandlLoader {
    dataset: String,
    api_key: String,
    api: Arc<dyn MarketApi>,
}

impl ValuesLoader for QuandlLoader {
    fn load(&self, window: Option<ValueWindow>) -> Result<DataFrame, DataError> {
        let points = self.api.get(&self.dataset, MONTHLY, &self.api_key)?;
        series::points_to_frame(&series::apply_window(points, window))
    }
}
