pub mod config;
pub mod fetch;
pub mod runner;
pub mod scrape;
pub mod state;
pub mod stream;
pub mod tree;
pub mod visited;


pub use config::{
    ContentTypePolicy, CrawlerConfig, CrawlerConfigRef, DEFAULT_MAX_CONCURRENCY,
    DISCOVERY_STREAM_CAPACITY, PAGE_REQUEST_TIMEOUT_SEC,
};
pub use fetch::{FetchedDocument, Fetcher, HttpFetcher};
pub use runner::{CrawlReport, Crawler, LiveCrawl};
pub use scrape::{JAVASCRIPT_VOID, extract_hrefs, fetch_links, links_from_document, resolve_href};
pub use state::{BaseHost, CrawlStatsSnapshot};
pub use stream::{Discovery, DiscoveryReceiver, DiscoverySink, discovery_channel};
pub use tree::{NodeId, Tree, TreeRef, UrlNode};
pub use visited::VisitedSet;
