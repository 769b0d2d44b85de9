// fetcher.rs
use crate::config::ScraperConfig;
use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use scraper::Html;
use std::borrow::Cow;
use url::Url;

/// NUL bytes never occur in HTML but show up early in images and archives.
fn looks_binary(body: &[u8]) -> bool {
    body.iter().take(1024).any(|&b| b == 0)
}

/// A single GET against the upstream site. No retries happen at this layer.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> Result<Vec<u8>, ScraperError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<Vec<u8>, ScraperError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Network(format!("HTTP {status} for {url}")));
        }

        let body = resp
            .bytes()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(body.to_vec())
    }
}

/// Retrieves documents and raw payloads through a [`Transport`].
#[derive(Clone)]
pub struct DocumentFetcher<T = HttpTransport> {
    transport: T,
}

impl DocumentFetcher<HttpTransport> {
    pub fn http(config: &ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> DocumentFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Parses the body as HTML. Bytes that are not UTF-8 are replaced rather
    /// than rejected; only a body that is not text at all is a parse error.
    pub fn fetch(&self, url: &Url) -> Result<Html, ScraperError> {
        let body = self.fetch_bytes(url)?;
        if looks_binary(&body) {
            return Err(ScraperError::Parse(format!("{url} did not return a text document")));
        }

        let html = String::from_utf8_lossy(&body);
        if let Cow::Owned(_) = html {
            tracing::warn!(%url, "page is not valid UTF-8, decoded lossily");
        }

        Ok(Html::parse_document(&html))
    }

    pub fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ScraperError> {
        tracing::debug!(%url, "GET");
        let body = self.transport.get(url)?;
        tracing::debug!(%url, bytes = body.len(), "fetched");
        Ok(body)
    }
}
