pub mod config;
pub mod crawler;
pub mod error;
pub mod live;
pub mod render;
pub mod server;

pub use crawler::{CrawlReport, Crawler, CrawlerConfig, UrlNode};
pub use error::{CrawlError, FetchError};
