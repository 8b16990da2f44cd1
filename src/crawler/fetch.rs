use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::config::CrawlerConfig;
use crate::error::FetchError;

/// What came back from a single GET
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Transport used by the crawler to download pages
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_document(&self, url: &Url) -> Result<FetchedDocument, FetchError>;
}

/// reqwest-backed [`Fetcher`] with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_document(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(FetchedDocument {
            status,
            content_type,
            body,
        })
    }
}
