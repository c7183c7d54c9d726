//! The owned context object: a built registry plus the resolution entry points.

use crate::config::Settings;
use crate::data::{DataError, HttpFetcher, MarketApi, QuandlApi, TableFetcher};
use crate::registry::{LookupError, Registry};
use crate::resolve::{self, Resolution};
use crate::source::{ComputedSource, QuandlSource};
use crate::symbol::{Symbol, SymbolId, ValueWindow};
use polars::prelude::DataFrame;
use std::sync::Arc;
use tracing::info;

/// Everything needed to answer `info` queries.
///
/// Construction performs all index fetches; once built the library is
/// read-only and can be shared between threads.
pub struct Library {
    registry: Registry,
}

impl Library {
    /// Build with HTTP transport for both the tabular endpoints and the market API.
    pub fn connect(settings: &Settings) -> Result<Self, DataError> {
        let timeout = settings.request_timeout();
        let fetcher = Arc::new(HttpFetcher::new(timeout)?);
        let api = Arc::new(QuandlApi::new(settings.quandl_url.clone(), timeout)?);
        Self::with_transport(settings, fetcher, api)
    }

    /// Build with caller-supplied transport.
    pub fn with_transport(
        settings: &Settings,
        fetcher: Arc<dyn TableFetcher>,
        api: Arc<dyn MarketApi>,
    ) -> Result<Self, DataError> {
        info!(
            data_url = %settings.data_url,
            sources = settings.sources.len(),
            "connecting sources"
        );
        let sources = settings.connect_sources(fetcher)?;
        let computed: Vec<Box<dyn ComputedSource>> = vec![Box::new(QuandlSource::new(
            api,
            settings.quandl_api_key.clone(),
        ))];
        Ok(Self::from_registry(Registry::build(&sources, computed)))
    }

    pub fn from_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn lookup(&self, namespace: &str, ticker: &str) -> Result<Symbol, LookupError> {
        self.registry.lookup(namespace, ticker)
    }

    pub fn lookup_id(&self, id: &SymbolId) -> Result<Symbol, LookupError> {
        self.registry.lookup_id(id)
    }

    /// Resolve `id` and load its value series in one step.
    pub fn values(
        &self,
        id: &SymbolId,
        window: Option<ValueWindow>,
    ) -> Result<DataFrame, LookupError> {
        let symbol = self.registry.lookup_id(id)?;
        Ok(symbol.values(window)?)
    }

    /// Resolve a comma-separated identifier string. See [`resolve::info`].
    pub fn info(&self, ids: &str) -> Result<Resolution, LookupError> {
        resolve::info(&self.registry, ids)
    }
}
