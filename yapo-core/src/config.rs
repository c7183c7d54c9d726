//! Settings: endpoints, credentials and the list of configured sources.
//!
//! Loaded from TOML. Environment overrides are applied only when asked for
//! through [`Settings::with_env`]; nothing reads the environment implicitly.

use crate::data::cache::DEFAULT_CAPACITY;
use crate::data::{DataError, TableFetcher};
use crate::source::{
    CatalogColumns, CatalogOptions, CatalogSource, SingleItemOptions, SingleItemSource,
    SymbolSource, WindowedCatalogOptions, WindowedCatalogSource, QUANDL_KEY_VAR,
};
use crate::symbol::{Currency, Period, SecurityType, SymbolInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`Settings::data_url`].
pub const DATA_URL_VAR: &str = "YAPO_DATA_URL";

pub const DEFAULT_DATA_URL: &str = "http://rostsber.ru/publish/data/";
pub const DEFAULT_QUANDL_URL: &str = "https://www.quandl.com/api/v3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One configured source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    SingleItem(SingleItemOptions),
    Catalog(CatalogOptions),
    WindowedCatalog(WindowedCatalogOptions),
}

impl SourceConfig {
    pub fn namespace(&self) -> &str {
        match self {
            Self::SingleItem(o) => &o.namespace,
            Self::Catalog(o) => &o.namespace,
            Self::WindowedCatalog(o) => &o.namespace,
        }
    }

    /// Construct the source. Catalogs fetch their index here.
    ///
    /// `cache_capacity` applies to windowed catalogs that do not set their own.
    pub fn connect(
        &self,
        data_url: &str,
        cache_capacity: usize,
        fetcher: Arc<dyn TableFetcher>,
    ) -> Result<Box<dyn SymbolSource>, DataError> {
        let source: Box<dyn SymbolSource> = match self {
            Self::SingleItem(o) => Box::new(SingleItemSource::new(data_url, o.clone(), fetcher)),
            Self::Catalog(o) => Box::new(CatalogSource::connect(data_url, o.clone(), fetcher)?),
            Self::WindowedCatalog(o) => {
                let options = WindowedCatalogOptions {
                    cache_capacity: Some(o.cache_capacity.unwrap_or(cache_capacity)),
                    ..o.clone()
                };
                Box::new(WindowedCatalogSource::connect(data_url, options, fetcher)?)
            }
        };
        Ok(source)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the tab-separated endpoints.
    pub data_url: String,
    pub quandl_url: String,
    pub quandl_api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Capacity of windowed catalogs that do not set their own.
    pub cache_capacity: usize,
    pub sources: Vec<SourceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            quandl_url: DEFAULT_QUANDL_URL.to_string(),
            quandl_api_key: None,
            request_timeout_secs: 30,
            cache_capacity: DEFAULT_CAPACITY,
            sources: default_sources(),
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Missing keys take their defaults; a missing `sources` list means the
    /// built-in catalogue.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `YAPO_DATA_URL` and `QUANDL_KEY` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DATA_URL_VAR).filter(|v| !v.is_empty()) {
            self.data_url = url;
        }
        if let Some(key) = lookup(QUANDL_KEY_VAR).filter(|v| !v.is_empty()) {
            self.quandl_api_key = Some(key);
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Construct every configured source in order.
    pub fn connect_sources(
        &self,
        fetcher: Arc<dyn TableFetcher>,
    ) -> Result<Vec<Box<dyn SymbolSource>>, DataError> {
        self.sources
            .iter()
            .map(|s| s.connect(&self.data_url, self.cache_capacity, fetcher.clone()))
            .collect()
    }
}

fn single_item(namespace: &str, ticker: &str, path: &str, info: SymbolInfo) -> SourceConfig {
    SourceConfig::SingleItem(SingleItemOptions {
        namespace: namespace.into(),
        ticker: ticker.into(),
        path: path.into(),
        value_column: "close".into(),
        info,
    })
}

/// The built-in catalogue of sources, in registry order.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        single_item(
            "cbr",
            "USD",
            "currency/USD-RUB.csv",
            SymbolInfo {
                short_name: Some("Доллар США".into()),
                currency: Some(Currency::Usd),
                security_type: Some(SecurityType::Currency),
                period: Some(Period::Day),
                adjusted_close: Some(true),
                ..Default::default()
            },
        ),
        single_item(
            "infl",
            "RU",
            "inflation_ru/data.csv",
            SymbolInfo {
                short_name: Some("Инфляция РФ".into()),
                currency: Some(Currency::Rub),
                security_type: Some(SecurityType::Inflation),
                period: Some(Period::Month),
                adjusted_close: Some(false),
                ..Default::default()
            },
        ),
        single_item("infl", "EU", "inflation_eu/data.csv", SymbolInfo::default()),
        single_item("micex", "MCFTR", "moex/mcftr/data.csv", SymbolInfo::default()),
        SourceConfig::Catalog(CatalogOptions {
            namespace: "micex".into(),
            index_path: "moex/stock_etf/stocks_list.csv".into(),
            values_path: "moex/stock_etf/{id}.csv".into(),
            columns: CatalogColumns {
                id: "SECID".into(),
                short_name: Some("SHORTNAME".into()),
                long_name: Some("NAME".into()),
                isin: Some("ISIN".into()),
            },
            value_column: "close".into(),
            defaults: SymbolInfo {
                exchange: Some("MICEX".into()),
                currency: Some(Currency::Rub),
                security_type: Some(SecurityType::StockEtf),
                period: Some(Period::Day),
                adjusted_close: Some(true),
                ..Default::default()
            },
        }),
        SourceConfig::Catalog(CatalogOptions {
            namespace: "nlu".into(),
            index_path: "mut_rus/mut_rus.csv".into(),
            values_path: "mut_rus/{id}".into(),
            columns: CatalogColumns {
                id: "id".into(),
                short_name: None,
                long_name: None,
                isin: None,
            },
            value_column: "close".into(),
            defaults: SymbolInfo::default(),
        }),
        SourceConfig::WindowedCatalog(WindowedCatalogOptions {
            namespace: "index".into(),
            index_path: "index/yahoo/__index.csv".into(),
            values_path: "index/yahoo/{id}.csv".into(),
            id_column: "name".into(),
            start_column: "date_start".into(),
            end_column: "date_end".into(),
            value_column: "close".into(),
            cache_capacity: None,
            defaults: SymbolInfo {
                currency: Some(Currency::Rub),
                security_type: Some(SecurityType::Index),
                period: Some(Period::Day),
                adjusted_close: Some(true),
                ..Default::default()
            },
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryFetcher;
    use crate::symbol::{MonthPeriod, ValueWindow};
    use std::collections::HashMap;

    #[test]
    fn defaults_describe_builtin_catalogue() {
        let settings = Settings::default();
        let namespaces: Vec<_> = settings.sources.iter().map(|s| s.namespace()).collect();
        assert_eq!(namespaces, vec!["cbr", "infl", "infl", "micex", "micex", "nlu", "index"]);
        assert_eq!(settings.cache_capacity, 512);
        assert_eq!(settings.quandl_api_key, None);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn parses_tagged_sources() {
        let settings = Settings::from_toml(
            r#"
            data_url = "http://localhost:8000/"
            request_timeout_secs = 5

            [[sources]]
            type = "single_item"
            namespace = "cbr"
            ticker = "EUR"
            path = "currency/EUR-RUB.csv"
            [sources.info]
            short_name = "Euro"
            currency = "EUR"
            security_type = "CURRENCY"
            period = "DAY"

            [[sources]]
            type = "windowed_catalog"
            namespace = "index"
            index_path = "index/yahoo/__index.csv"
            values_path = "index/yahoo/{id}.csv"
            "#,
        )
        .unwrap();

        assert_eq!(settings.data_url, "http://localhost:8000/");
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.sources.len(), 2);

        match &settings.sources[0] {
            SourceConfig::SingleItem(o) => {
                assert_eq!(o.ticker, "EUR");
                assert_eq!(o.value_column, "close");
                assert_eq!(o.info.currency, Some(Currency::Eur));
                assert_eq!(o.info.isin, None);
            }
            other => panic!("expected single item, got {other:?}"),
        }
        match &settings.sources[1] {
            SourceConfig::WindowedCatalog(o) => {
                assert_eq!(o.id_column, "name");
                assert_eq!(o.cache_capacity, None);
            }
            other => panic!("expected windowed catalog, got {other:?}"),
        }
    }

    const INDEX_URL: &str = "http://data/i.csv";
    const SERIES_URL: &str = "http://data/^GSPC.csv";

    fn windowed_fetcher() -> Arc<MemoryFetcher> {
        Arc::new(
            MemoryFetcher::new()
                .with_document(
                    INDEX_URL,
                    "name\tdate_start\tdate_end\n^GSPC\t2016-01-29\t2016-03-31\n",
                )
                .with_document(
                    SERIES_URL,
                    "date\tclose\n2016-01-29\t1940.24\n2016-02-29\t1932.23\n2016-03-31\t2059.74\n",
                ),
        )
    }

    /// Loads three single-month windows, then the first one again, and
    /// returns the number of series fetches.
    fn fetches_for_three_windows_and_a_repeat(settings: &Settings) -> usize {
        let fetcher = windowed_fetcher();
        let sources = settings.connect_sources(fetcher.clone()).unwrap();
        let symbol = sources[0].enumerate().remove(0);
        let month = |m| {
            let period = MonthPeriod::new(2016, m).unwrap();
            Some(ValueWindow::new(period, period))
        };
        for m in [1, 2, 3, 1] {
            symbol.values(month(m)).unwrap();
        }
        fetcher.fetch_count(SERIES_URL)
    }

    fn windowed_toml(global: usize, per_source: Option<usize>) -> String {
        let per_source = per_source
            .map(|c| format!("cache_capacity = {c}\n"))
            .unwrap_or_default();
        format!(
            "data_url = \"http://data\"\ncache_capacity = {global}\n\n\
             [[sources]]\ntype = \"windowed_catalog\"\nnamespace = \"index\"\n\
             index_path = \"i.csv\"\nvalues_path = \"{{id}}.csv\"\n{per_source}"
        )
    }

    #[test]
    fn global_cache_capacity_applies_to_settings_built_in_code() {
        let settings = Settings {
            data_url: "http://data".into(),
            cache_capacity: 2,
            sources: vec![SourceConfig::WindowedCatalog(WindowedCatalogOptions {
                namespace: "index".into(),
                index_path: "i.csv".into(),
                values_path: "{id}.csv".into(),
                id_column: "name".into(),
                start_column: "date_start".into(),
                end_column: "date_end".into(),
                value_column: "close".into(),
                cache_capacity: None,
                defaults: SymbolInfo::default(),
            })],
            ..Settings::default()
        };
        // Capacity 2 evicts the first window before it is requested again.
        assert_eq!(fetches_for_three_windows_and_a_repeat(&settings), 4);
    }

    #[test]
    fn global_cache_capacity_applies_to_toml_sources_without_their_own() {
        let settings = Settings::from_toml(&windowed_toml(2, None)).unwrap();
        match &settings.sources[0] {
            SourceConfig::WindowedCatalog(o) => assert_eq!(o.cache_capacity, None),
            other => panic!("expected windowed catalog, got {other:?}"),
        }
        assert_eq!(fetches_for_three_windows_and_a_repeat(&settings), 4);
    }

    #[test]
    fn explicit_source_capacity_wins_over_global() {
        let settings = Settings::from_toml(&windowed_toml(2, Some(512))).unwrap();
        match &settings.sources[0] {
            SourceConfig::WindowedCatalog(o) => assert_eq!(o.cache_capacity, Some(512)),
            other => panic!("expected windowed catalog, got {other:?}"),
        }
        assert_eq!(fetches_for_three_windows_and_a_repeat(&settings), 3);
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let err = Settings::from_toml("[[sources]]\ntype = \"ftp\"\nnamespace = \"x\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn overrides_replace_url_and_key() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(DATA_URL_VAR, "http://mirror/"), (QUANDL_KEY_VAR, "secret")]);
        let settings = Settings::default().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(settings.data_url, "http://mirror/");
        assert_eq!(settings.quandl_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let settings = Settings::default().with_overrides(|_| Some(String::new()));
        assert_eq!(settings.data_url, DEFAULT_DATA_URL);
        assert_eq!(settings.quandl_api_key, None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Settings::from_file(Path::new("/nonexistent/yapo.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
