//! Transport traits, the parsed table type, and structured error types.
//!
//! The [`TableFetcher`] and [`MarketApi`] traits abstract over remote
//! endpoints so sources can be driven by HTTP in production and by
//! in-memory fixtures in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One observation of a value series before it becomes a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Structured error types for transport and parsing.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing column '{column}' in {context}")]
    MissingColumn { column: String, context: String },

    #[error("market API error: {0}")]
    Api(String),
}

/// A tab-separated document: one header row and string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse tab-separated text. Short rows are allowed; missing cells read as empty.
    pub fn from_tsv(text: &str) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| DataError::Parse(format!("header row: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| DataError::Parse(format!("row {}: {e}", i + 1)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`column`](Self::column) but fails with [`DataError::MissingColumn`].
    pub fn require_column(&self, name: &str, context: &str) -> Result<usize, DataError> {
        self.column(name).ok_or_else(|| DataError::MissingColumn {
            column: name.to_string(),
            context: context.to_string(),
        })
    }

    /// Trimmed cell contents; `None` for empty or absent cells.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}

/// Fetches a tab-separated table from a URL.
///
/// Implementations do not retry; every failure is returned to the caller.
pub trait TableFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Table, DataError>;
}

/// Third-party market-data API returning adjusted closes for a dataset code.
pub trait MarketApi: Send + Sync {
    /// Fetch `dataset` collapsed to `collapse` granularity (e.g. `"monthly"`),
    /// sorted by date ascending.
    fn get(&self, dataset: &str, collapse: &str, api_key: &str)
        -> Result<Vec<RawPoint>, DataError>;
}
