//! In-memory transport: serves fixed documents by URL and counts fetches.
//!
//! Used for offline runs and tests. Unknown URLs fail like a 404 would.

use super::provider::{DataError, Table, TableFetcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register tab-separated `body` under `url`.
    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }

    /// Number of fetches issued for `url`, successful or not.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .map(|f| f.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of fetches issued overall.
    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl TableFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Table, DataError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(url.to_string()).or_default() += 1;
        }

        let body = self.documents.get(url).ok_or_else(|| DataError::HttpStatus {
            url: url.to_string(),
            status: 404,
        })?;
        Table::from_tsv(body)
    }
}
