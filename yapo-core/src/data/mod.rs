//! Transport, parsing and caching for remote value series

pub mod cache;
pub mod http;
pub mod memory;
pub mod provider;
pub mod quandl;
pub mod series;

pub use cache::LruCache;
pub use http::HttpFetcher;
pub use memory::MemoryFetcher;
pub use provider::{DataError, MarketApi, RawPoint, Table, TableFetcher};
pub use quandl::QuandlApi;
