//! Errors raised by the crawl engine and its fetch collaborator.

use thiserror::Error;

/// Errors surfaced to the caller of a crawl.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// Seed URL could not be parsed; nothing was crawled
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Reasons a single page yields no links.
///
/// These never leave the crawl: the branch simply ends as a leaf.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("not an HTML page (content type: {})", .0.as_deref().unwrap_or("none"))]
    ContentType(Option<String>),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Transport(Box::new(error))
    }
}
