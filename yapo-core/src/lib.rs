//! Yapo Core: financial symbol registry and lazy value series.
//!
//! This crate resolves namespaced identifiers such as `micex/SBER` to symbols
//! carrying metadata (ISIN, names, currency, security type, period) and a
//! deferred accessor for the symbol's historical values:
//! - Symbol sources (single item, index catalog, windowed catalog, computed)
//! - One registry built from every source at startup
//! - Comma-separated identifier resolution with all-or-nothing semantics
//! - Tab-separated HTTP transport, Quandl API client, bounded LRU cache
//! - TOML settings with explicit environment overrides

pub mod config;
pub mod data;
pub mod library;
pub mod registry;
pub mod resolve;
pub mod source;
pub mod symbol;

pub use config::{ConfigError, Settings, SourceConfig};
pub use data::DataError;
pub use library::Library;
pub use registry::{LookupError, Registry};
pub use resolve::{info, parse_ids, Resolution};
pub use symbol::{
    Currency, MalformedId, MalformedPeriod, MonthPeriod, Period, SecurityType, Symbol, SymbolId,
    SymbolInfo, ValueWindow,
};
