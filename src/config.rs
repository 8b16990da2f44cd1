use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::crawler::{ContentTypePolicy, CrawlerConfig};
/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    File(PathBuf),
    /// Stdout carries program output and no log file was given
    Off,
}

/// Logging flags shared by both binaries
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct LogArgs {
    /// Write logs to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl LogArgs {
    /// Picks the log destination. With `stdout_taken` the log never goes to stdout.
    pub fn target(&self, stdout_taken: bool) -> LogTarget {
        match &self.log_file {
            Some(path) => LogTarget::File(path.clone()),
            None if stdout_taken => LogTarget::Off,
            None => LogTarget::Stdout,
        }
    }

    /// Starts the global log2 logger, filtered to this crate's modules
    pub fn start(&self, target: &LogTarget) {
        let logger = match target {
            LogTarget::Off => return,
            LogTarget::Stdout => log2::stdout(),
            LogTarget::File(path) => log2::open(&path.to_string_lossy()),
        };
        logger
            .module(true) // include module name
            .module_with_line(true) // include line number from module
            .module_filter(|module| module.starts_with("site_tree")) // include only modules having this pattern
            .compress(false) // compress output
            .level(self.log_level.to_string()) // level of logging (trace -
            .start();
    }
}

/// Fetch flags shared by both binaries, turned into a [`CrawlerConfig`]
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct FetchArgs {
    /// Maximum number of simultaneous fetches, 0 for no limit
    #[arg(short, long, default_value = "32")]
    pub concurrency: usize,
    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,
    /// Only accept pages served with exactly `text/html`
    #[arg(long)]
    pub strict_content_type: bool,
    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl FetchArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout == 0 {
            anyhow::bail!("timeout must be greater than 0");
        }
        Ok(())
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        let policy = if self.strict_content_type {
            ContentTypePolicy::Exact
        } else {
            ContentTypePolicy::MediaType
        };
        let mut config = CrawlerConfig::new()
            .with_request_timeout(self.timeout)
            .with_max_concurrency(Some(self.concurrency))
            .with_content_type_policy(policy);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }
}

/// This struct is supposed to receive all program arguments while CrawlerConfig
/// Describes only the Crawler
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Seed URL; only pages on its host are followed
    #[arg(short, long)]
    pub domain: String,
    /// Maximum link depth to crawl
    #[arg(long, default_value = "3")]
    pub depth: usize,
    /// Write server-sent events to stdout instead of printing the final tree
    #[arg(long)]
    pub stream: bool,
    /// Seconds without a discovery before a keep-alive event is sent
    #[arg(long, default_value = "30")]
    pub keep_alive: u64,
    /// Output file for the final tree as JSON
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,
    #[command(flatten)]
    pub fetch: FetchArgs,
    #[command(flatten)]
    pub log: LogArgs,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.domain.trim().is_empty() {
            anyhow::bail!("No domain provided");
        }
        if self.depth < 1 {
            anyhow::bail!("depth must be greater than 0");
        }
        if self.keep_alive == 0 {
            anyhow::bail!("keep_alive must be greater than 0");
        }
        self.fetch.validate()
    }

    /// In stream mode stdout holds the event stream, so logs go to the log file or nowhere
    pub fn log_target(&self) -> LogTarget {
        self.log.target(self.stream)
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        self.fetch.crawler_config()
    }
}

/// Arguments of the HTTP front end
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Streams site crawls over HTTP as server-sent events", long_about = None)]
pub struct ServeConfig {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,
    /// Seconds without a discovery before a keep-alive event is sent
    #[arg(long, default_value = "30")]
    pub keep_alive: u64,
    #[command(flatten)]
    pub fetch: FetchArgs,
    #[command(flatten)]
    pub log: LogArgs,
}

impl ServeConfig {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.keep_alive == 0 {
            anyhow::bail!("keep_alive must be greater than 0");
        }
        self.fetch.validate()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = Config::try_parse_from(["site-tree", "--domain", "https://example.com"])?;
        cfg.validate()?;
        assert_eq!(cfg.depth, 3);
        assert_eq!(cfg.keep_alive, 30);
        assert_eq!(cfg.log.log_level.to_string(), "info");
        assert_eq!(cfg.log_target(), LogTarget::Stdout);

        let crawler_config = cfg.crawler_config();
        assert_eq!(crawler_config.request_timeout_sec, 10);
        assert_eq!(crawler_config.max_concurrency, Some(32));
        assert_eq!(crawler_config.content_type_policy, ContentTypePolicy::MediaType);
        Ok(())
    }

    #[test]
    fn test_zero_depth_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let cfg =
            Config::try_parse_from(["site-tree", "--domain", "https://example.com", "--depth", "0"])?;
        assert!(cfg.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_zero_timeout_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = Config::try_parse_from([
            "site-tree",
            "--domain",
            "https://example.com",
            "--timeout",
            "0",
        ])?;
        assert!(cfg.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_flags_reach_crawler_config() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = Config::try_parse_from([
            "site-tree",
            "--domain",
            "https://example.com",
            "--concurrency",
            "0",
            "--strict-content-type",
            "--user-agent",
            "site-tree-test/1.0",
        ])?;
        let crawler_config = cfg.crawler_config();
        assert_eq!(crawler_config.max_concurrency, None);
        assert_eq!(crawler_config.content_type_policy, ContentTypePolicy::Exact);
        assert_eq!(crawler_config.user_agent, "site-tree-test/1.0");
        Ok(())
    }

    #[test]
    fn test_stream_mode_keeps_logs_off_stdout() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = Config::try_parse_from([
            "site-tree",
            "--domain",
            "https://example.com",
            "--stream",
        ])?;
        assert_eq!(cfg.log_target(), LogTarget::Off);

        let cfg = Config::try_parse_from([
            "site-tree",
            "--domain",
            "https://example.com",
            "--stream",
            "--log-file",
            "logs/crawl.log",
        ])?;
        assert_eq!(cfg.log_target(), LogTarget::File(PathBuf::from("logs/crawl.log")));
        Ok(())
    }

    #[test]
    fn test_domain_is_required() {
        assert!(Config::try_parse_from(["site-tree"]).is_err());
    }

    #[test]
    fn test_serve_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = ServeConfig::try_parse_from(["site-tree-api"])?;
        cfg.validate()?;
        assert_eq!(cfg.listen, "0.0.0.0:8080".parse::<SocketAddr>()?);
        assert_eq!(cfg.keep_alive, 30);
        assert_eq!(cfg.log.target(false), LogTarget::Stdout);
        assert_eq!(cfg.fetch.crawler_config().max_concurrency, Some(32));
        Ok(())
    }
}
