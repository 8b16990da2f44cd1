use std::sync::Arc;

/// Default timeout for page requests in seconds
pub const PAGE_REQUEST_TIMEOUT_SEC: u64 = 10;
/// Default number of buffered discovery events before publishing waits
pub const DISCOVERY_STREAM_CAPACITY: usize = 100;
/// Default number of fetches allowed to run at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

const DEFAULT_USER_AGENT: &str = concat!("site-tree/", env!("CARGO_PKG_VERSION"));

/// Which `Content-Type` values count as an HTML page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTypePolicy {
    /// Header must be exactly `text/html`
    Exact,
    /// Media type must be `text/html`, parameters such as `charset` are ignored
    #[default]
    MediaType,
}

impl ContentTypePolicy {
    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return false;
        };
        match self {
            ContentTypePolicy::Exact => content_type == "text/html",
            ContentTypePolicy::MediaType => content_type
                .split(';')
                .next()
                .map(|essence| essence.trim().eq_ignore_ascii_case("text/html"))
                .unwrap_or(false),
        }
    }
}

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub request_timeout_sec: u64,
    /// `None` spawns fetches without any cap
    pub max_concurrency: Option<usize>,
    pub stream_capacity: usize,
    pub content_type_policy: ContentTypePolicy,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self {
            request_timeout_sec: PAGE_REQUEST_TIMEOUT_SEC,
            max_concurrency: Some(DEFAULT_MAX_CONCURRENCY),
            stream_capacity: DISCOVERY_STREAM_CAPACITY,
            content_type_policy: ContentTypePolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_request_timeout(mut self, timeout_sec: u64) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        // a zero-permit semaphore would never let a fetch through
        self.max_concurrency = max_concurrency.filter(|n| *n > 0);
        self
    }

    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity.max(1);
        self
    }

    pub fn with_content_type_policy(mut self, policy: ContentTypePolicy) -> Self {
        self.content_type_policy = policy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

pub type CrawlerConfigRef = Arc<CrawlerConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_policy_rejects_parameters() {
        let policy = ContentTypePolicy::Exact;
        assert!(policy.accepts(Some("text/html")));
        assert!(!policy.accepts(Some("text/html; charset=utf-8")));
        assert!(!policy.accepts(None));
    }

    #[test]
    fn test_media_type_policy_ignores_parameters() {
        let policy = ContentTypePolicy::MediaType;
        assert!(policy.accepts(Some("text/html")));
        assert!(policy.accepts(Some("Text/HTML; charset=utf-8")));
        assert!(!policy.accepts(Some("application/json")));
        assert!(!policy.accepts(Some("text/htmlx")));
        assert!(!policy.accepts(None));
    }

    #[test]
    fn test_zero_concurrency_means_unbounded() {
        let config = CrawlerConfig::new().with_max_concurrency(Some(0));
        assert_eq!(config.max_concurrency, None);
    }
}
