//! HTTP transport for tab-separated endpoints.

use super::provider::{DataError, Table, TableFetcher};
use std::time::Duration;
use tracing::debug;

/// Blocking HTTP fetcher with a fixed request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// Prefix parse failures with the URL they came from.
fn with_url(url: &str, err: DataError) -> DataError {
    match err {
        DataError::Parse(msg) => DataError::Parse(format!("{url}: {msg}")),
        other => other,
    }
}

impl TableFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Table, DataError> {
        debug!(url, "fetching table");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::Network(format!("reading body of {url}: {e}")))?;

        Table::from_tsv(&body).map_err(|e| with_url(url, e))
    }
}
