use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTML parse error: {0}")]
    Parse(String),
    #[error("No results found for {address:?}")]
    NotFound { address: String },
    #[error("No exact matches found for {address:?}")]
    Ambiguous { address: String },
    #[error("Unexpected number of results: {count}")]
    UnexpectedResultCount { count: usize },
    #[error("Required field {field} missing (schema {schema})")]
    MissingField { field: String, schema: String },
    #[error("Malformed asset #{index}: {reason}")]
    MalformedAsset { index: usize, reason: String },
    #[error("Malformed inspection entry #{index}")]
    MalformedInspection { index: usize },
    #[error("Could not download {url}: {reason}")]
    AssetDownload { url: String, reason: String },
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("Config error: {0}")]
    Config(String),
}

impl ScraperError {
    /// True when the same call may succeed later without changing the input
    /// or the schema.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScraperError::Network(_) | ScraperError::AssetDownload { .. })
    }
}
