//! The symbol registry: one flat, read-only collection of every source's symbols.
//!
//! Built once from an ordered list of sources. Order is preserved (source
//! order, then each source's enumeration order). Lookups require exactly one
//! match; duplicates are reported as a configuration error when they are hit.
//! Computed namespaces bypass the collection entirely.

use crate::data::DataError;
use crate::source::{ComputedSource, SymbolSource};
use crate::symbol::{MalformedId, Symbol, SymbolId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from symbol resolution.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("symbol {namespace}/{ticker} is not found")]
    NotFound { namespace: String, ticker: String },

    #[error(
        "configuration error: {count} symbols registered as {namespace}/{ticker}"
    )]
    Ambiguous {
        namespace: String,
        ticker: String,
        count: usize,
    },

    #[error("configuration error: namespace '{namespace}' needs {variable} to be set")]
    MissingCredential { namespace: String, variable: String },

    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedId),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl LookupError {
    /// True for errors caused by source setup rather than by the request.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Ambiguous { .. } | Self::MissingCredential { .. })
    }
}

pub struct Registry {
    symbols: Vec<Symbol>,
    index: HashMap<SymbolId, Vec<usize>>,
    computed: Vec<Box<dyn ComputedSource>>,
}

impl Registry {
    /// Enumerate every source in order and concatenate the results.
    pub fn build(
        sources: &[Box<dyn SymbolSource>],
        computed: Vec<Box<dyn ComputedSource>>,
    ) -> Self {
        let mut symbols = Vec::new();
        for source in sources {
            symbols.extend(source.enumerate());
        }

        let mut index: HashMap<SymbolId, Vec<usize>> = HashMap::new();
        for (i, symbol) in symbols.iter().enumerate() {
            index.entry(symbol.id.clone()).or_default().push(i);
        }

        let duplicates = index.values().filter(|hits| hits.len() > 1).count();
        if duplicates > 0 {
            warn!(duplicates, "registry contains duplicate identifiers");
        }
        info!(
            sources = sources.len(),
            computed = computed.len(),
            symbols = symbols.len(),
            "symbol registry built"
        );

        Self {
            symbols,
            index,
            computed,
        }
    }

    /// Resolve `namespace/ticker` to exactly one symbol.
    pub fn lookup(&self, namespace: &str, ticker: &str) -> Result<Symbol, LookupError> {
        if let Some(source) = self.computed.iter().find(|c| c.namespace() == namespace) {
            return source.resolve(ticker);
        }

        let key = SymbolId::new(namespace, ticker);
        match self.index.get(&key).map(Vec::as_slice) {
            None | Some([]) => Err(LookupError::NotFound {
                namespace: namespace.to_string(),
                ticker: ticker.to_string(),
            }),
            Some([only]) => Ok(self.symbols[*only].clone()),
            Some(hits) => {
                warn!(%key, count = hits.len(), "ambiguous lookup");
                Err(LookupError::Ambiguous {
                    namespace: namespace.to_string(),
                    ticker: ticker.to_string(),
                    count: hits.len(),
                })
            }
        }
    }

    pub fn lookup_id(&self, id: &SymbolId) -> Result<Symbol, LookupError> {
        self.lookup(&id.namespace, &id.ticker)
    }

    /// Every registered symbol, in build order. Computed namespaces are not listed.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Every registered identifier, in build order.
    pub fn list(&self) -> Vec<&SymbolId> {
        self.symbols.iter().map(|s| &s.id).collect()
    }

    /// Registered symbols of one namespace, in build order.
    pub fn namespace_symbols<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.symbols.iter().filter(move |s| s.namespace() == namespace)
    }

    /// Namespaces served on demand rather than from the collection.
    pub fn computed_namespaces(&self) -> Vec<&str> {
        self.computed.iter().map(|c| c.namespace()).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
