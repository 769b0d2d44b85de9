// config.rs
use crate::scraper::ScraperError;
use std::time::Duration;
use url::form_urlencoded::byte_serialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://www.realestate.com.au";

pub const DEFAULT_RESOLUTION_TOKEN: &str = "5000x5000";

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Settings shared by every stage of the pipeline.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: Url,
    pub user_agent: String,
    /// Per-request transport timeout. `None` leaves deadlines to the caller.
    pub timeout: Option<Duration>,
    pub resolution_token: String,
    pub download_workers: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            user_agent: USER_AGENT.to_string(),
            timeout: None,
            resolution_token: DEFAULT_RESOLUTION_TOKEN.to_string(),
            download_workers: 4,
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self, ScraperError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `LISTING_*` keys resolved through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScraperError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup("LISTING_BASE_URL") {
            config = config.with_base_url(&base)?;
        }

        if let Some(agent) = lookup("LISTING_USER_AGENT") {
            config.user_agent = agent;
        }

        if let Some(secs) = lookup("LISTING_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ScraperError::Config(format!("LISTING_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        if let Some(workers) = lookup("LISTING_DOWNLOAD_WORKERS") {
            let workers: usize = workers.trim().parse().map_err(|_| {
                ScraperError::Config(format!("LISTING_DOWNLOAD_WORKERS is not a number: {workers}"))
            })?;
            config = config.with_download_workers(workers);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base: &str) -> Result<Self, ScraperError> {
        self.base_url = Url::parse(base)
            .map_err(|e| ScraperError::Config(format!("invalid base url {base:?}: {e}")))?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_download_workers(mut self, workers: usize) -> Self {
        // zero workers would never make progress
        self.download_workers = workers.max(1);
        self
    }

    /// `<origin>/buy/in-<address>/list-1`, with the address form-encoded.
    pub fn search_url(&self, address: &str) -> Result<Url, ScraperError> {
        let encoded: String = byte_serialize(address.as_bytes()).collect();
        self.base_url
            .join(&format!("/buy/in-{encoded}/list-1"))
            .map_err(|e| ScraperError::Config(format!("cannot build search url: {e}")))
    }

    /// Resolves a link read from a document against the base origin.
    pub fn resolve_link(&self, href: &str) -> Result<Url, ScraperError> {
        self.base_url
            .join(href)
            .map_err(|e| ScraperError::Parse(format!("bad link {href:?}: {e}")))
    }
}
