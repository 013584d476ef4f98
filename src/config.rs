use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::downloader::DEFAULT_CONCURRENCY;
use crate::error::{Error, Result};
use crate::search::{SearchRequest, DEFAULT_ENDPOINT};

pub const DEFAULT_QUERY: &str = "gatos";
pub const DEFAULT_COUNT: usize = 5;
pub const DEFAULT_OUTPUT_DIR: &str = "imagenes_descargadas";

#[derive(Clone)]
pub struct Config {
    /// Pixabay API key. Never logged.
    pub api_key: String,
    pub query: String,
    /// Number of images to request from the search API
    pub count: usize,
    pub output_dir: PathBuf,
    /// Maximum downloads in flight
    pub concurrency: usize,
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Config {
    /// Configuration with every optional value at its default.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            query: DEFAULT_QUERY.to_string(),
            count: DEFAULT_COUNT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `PIXABAY_*` variables resolved by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("PIXABAY_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("PIXABAY_API_KEY must be set"))?;

        let mut config = Self::new(api_key);

        if let Some(query) = lookup("PIXABAY_QUERY") {
            config.query = query;
        }

        if let Some(dir) = lookup("PIXABAY_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(endpoint) = lookup("PIXABAY_ENDPOINT") {
            config.endpoint = endpoint;
        }

        config.count = parse(&lookup, "PIXABAY_COUNT", config.count)?;
        config.concurrency = parse(&lookup, "PIXABAY_CONCURRENCY", config.concurrency)?;

        config.connect_timeout = Duration::from_secs(parse(
            &lookup,
            "PIXABAY_CONNECT_TIMEOUT_SECS",
            config.connect_timeout.as_secs(),
        )?);
        config.read_timeout = Duration::from_secs(parse(
            &lookup,
            "PIXABAY_READ_TIMEOUT_SECS",
            config.read_timeout.as_secs(),
        )?);

        Ok(config)
    }

    pub fn search_request(&self) -> Result<SearchRequest> {
        SearchRequest::new(self.query.as_str(), self.count)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("query", &self.query)
            .field("count", &self.count)
            .field("output_dir", &self.output_dir)
            .field("concurrency", &self.concurrency)
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

fn parse<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("{name} is not a valid number: {value:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{Config, DEFAULT_COUNT, DEFAULT_OUTPUT_DIR, DEFAULT_QUERY};
    use crate::error::Error;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("PIXABAY_API_KEY", "abc")])).unwrap();

        assert_eq!(config.api_key, "abc");
        assert_eq!(config.query, DEFAULT_QUERY);
        assert_eq!(config.count, DEFAULT_COUNT);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.endpoint, "https://pixabay.com/api/");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PIXABAY_API_KEY", "abc"),
            ("PIXABAY_QUERY", "dogs"),
            ("PIXABAY_COUNT", " 12 "),
            ("PIXABAY_OUTPUT_DIR", "/tmp/dogs"),
            ("PIXABAY_CONCURRENCY", "3"),
            ("PIXABAY_READ_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.query, "dogs");
        assert_eq!(config.count, 12);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/dogs"));
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_api_key() {
        for vars in [&[][..], &[("PIXABAY_API_KEY", "  ")][..]] {
            let error = Config::from_lookup(lookup(vars)).unwrap_err();

            assert!(matches!(error, Error::Config { .. }));
        }
    }

    #[test]
    fn test_invalid_number() {
        let error = Config::from_lookup(lookup(&[
            ("PIXABAY_API_KEY", "abc"),
            ("PIXABAY_COUNT", "many"),
        ]))
        .unwrap_err();

        assert!(error.to_string().contains("PIXABAY_COUNT"));
    }

    #[test]
    fn test_zero_count_is_rejected_as_search_request() {
        let mut config = Config::new("abc");
        config.count = 0;

        assert!(config.search_request().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config::new("super-secret");

        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
