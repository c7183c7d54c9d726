//! Quandl v3 dataset API client.
//!
//! Reads `datasets/{code}.json`, locating the `Date` and `Adj_Close` columns
//! by name in `column_names`. Rows come back newest-first; they are returned
//! oldest-first.

use super::provider::{DataError, MarketApi, RawPoint};
use super::series::parse_date;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DATE_COLUMN: &str = "Date";
const ADJ_CLOSE_COLUMN: &str = "Adj_Close";

#[derive(Debug, Deserialize)]
struct DatasetResponse {
    dataset: Dataset,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    column_names: Vec<String>,
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    quandl_error: QuandlError,
}

#[derive(Debug, Deserialize)]
struct QuandlError {
    code: String,
    message: String,
}

pub struct QuandlApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl QuandlApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn dataset_url(&self, dataset: &str) -> String {
        format!("{}/datasets/{dataset}.json", self.base_url.trim_end_matches('/'))
    }
}

impl MarketApi for QuandlApi {
    fn get(
        &self,
        dataset: &str,
        collapse: &str,
        api_key: &str,
    ) -> Result<Vec<RawPoint>, DataError> {
        let url = self.dataset_url(dataset);
        debug!(dataset, collapse, "fetching market API dataset");

        let resp = self
            .client
            .get(&url)
            .query(&[("collapse", collapse), ("api_key", api_key)])
            .send()
            .map_err(|e| DataError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| DataError::Network(format!("reading body of {url}: {e}")))?;

        if !status.is_success() {
            // The API reports its own error codes; fall back to the status otherwise.
            return match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => Err(DataError::Api(format!(
                    "{}: {} ({dataset})",
                    err.quandl_error.code, err.quandl_error.message
                ))),
                Err(_) => Err(DataError::HttpStatus {
                    url,
                    status: status.as_u16(),
                }),
            };
        }

        let resp: DatasetResponse = serde_json::from_str(&body)
            .map_err(|e| DataError::Parse(format!("dataset {dataset}: {e}")))?;
        parse_dataset(dataset, resp.dataset)
    }
}

fn parse_dataset(dataset: &str, data: Dataset) -> Result<Vec<RawPoint>, DataError> {
    let find = |name: &str| {
        data.column_names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
                context: format!("dataset {dataset}"),
            })
    };
    let date_col = find(DATE_COLUMN)?;
    let value_col = find(ADJ_CLOSE_COLUMN)?;

    let mut points = Vec::with_capacity(data.data.len());
    for (i, row) in data.data.iter().enumerate() {
        let date = row
            .get(date_col)
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataError::Parse(format!("dataset {dataset}: no date at row {i}")))?;
        let date = parse_date(date)
            .ok_or_else(|| DataError::Parse(format!("dataset {dataset}: bad date '{date}'")))?;
        let value = row.get(value_col).and_then(|v| v.as_f64());
        points.push(RawPoint { date, value });
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}
