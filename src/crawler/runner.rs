use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use log2::*;
use tokio::task::JoinHandle;
use url::Url;

use super::config::{CrawlerConfig, CrawlerConfigRef};
use super::fetch::{Fetcher, HttpFetcher};
use super::scrape::fetch_links;
use super::state::{CrawlSession, CrawlSessionRef, CrawlStatsSnapshot};
use super::stream::{Discovery, DiscoveryReceiver, DiscoverySink, discovery_channel};
use super::tree::{NodeId, Tree, TreeRef, UrlNode};
use crate::error::{CrawlError, FetchError};

/// Outcome of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub root: UrlNode,
    pub stats: CrawlStatsSnapshot,
    /// Distinct URLs claimed for fetching
    pub visited: usize,
    pub elapsed: Duration,
}

/// A crawl running in the background
pub struct LiveCrawl {
    /// Yields one event per attached node, then `None` once the crawl is done
    pub events: DiscoveryReceiver,
    /// Tree as it is being built
    pub tree: TreeRef,
    pub handle: JoinHandle<CrawlReport>,
}

/// Crawls one host starting from a seed URL.
///
/// Each call to [`Crawler::crawl`], [`Crawler::run`] or [`Crawler::stream`] starts a
/// fresh session, so one `Crawler` can serve many independent crawls.
#[derive(Clone)]
pub struct Crawler {
    config: CrawlerConfigRef,
    fetcher: Arc<dyn Fetcher>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: CrawlerConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls from `seed` and returns the tree of same-host pages.
    pub async fn crawl(&self, seed: &str, max_depth: usize) -> Result<UrlNode, CrawlError> {
        Ok(self.run(seed, max_depth).await?.root)
    }

    /// Like [`Crawler::crawl`] but also reports statistics.
    pub async fn run(&self, seed: &str, max_depth: usize) -> Result<CrawlReport, CrawlError> {
        let session = self.session(seed, max_depth, None)?;
        Ok(run_session(session).await)
    }

    /// Starts a crawl in the background and streams each discovered node.
    pub fn stream(&self, seed: &str, max_depth: usize) -> Result<LiveCrawl, CrawlError> {
        let (sink, events) = discovery_channel(self.config.stream_capacity);
        let session = self.session(seed, max_depth, Some(sink))?;
        let tree = Arc::clone(&session.tree);
        let handle = tokio::spawn(run_session(session));
        Ok(LiveCrawl {
            events,
            tree,
            handle,
        })
    }

    fn session(
        &self,
        seed: &str,
        max_depth: usize,
        discoveries: Option<DiscoverySink>,
    ) -> Result<CrawlSessionRef, CrawlError> {
        let seed_url = parse_seed(seed)?;
        Ok(Arc::new(CrawlSession::new(
            seed,
            &seed_url,
            max_depth,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.config),
            discoveries,
        )))
    }
}

fn parse_seed(seed: &str) -> Result<Url, CrawlError> {
    Url::parse(seed).map_err(|source| CrawlError::InvalidSeed {
        url: seed.to_string(),
        source,
    })
}

async fn run_session(session: CrawlSessionRef) -> CrawlReport {
    let started = Instant::now();
    let root_url = session.tree.url(Tree::ROOT).unwrap_or_default();
    info!("Crawling {} up to depth {}", root_url, session.max_depth);

    // visited keys are normalized so `https://host` and `https://host/` collide
    let seed_key = Url::parse(&root_url)
        .map(String::from)
        .unwrap_or(root_url);
    dispatch(&session, seed_key, Tree::ROOT, 0);
    session.in_flight.wait_idle().await;

    if let Some(sink) = &session.discoveries {
        sink.close();
    }

    let report = CrawlReport {
        root: session.tree.snapshot(),
        stats: session.stats.snapshot(),
        visited: session.visited.len(),
        elapsed: started.elapsed(),
    };
    info!(
        "Crawl finished: {} pages fetched, {} nodes in tree, took {:?}",
        report.stats.pages_fetched,
        report.root.len(),
        report.elapsed
    );
    report
}

/// Spawns a visit task, counted by the session before it starts
fn dispatch(session: &CrawlSessionRef, url: String, node: NodeId, depth: usize) {
    let guard = session.in_flight.enter();
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let _guard = guard;
        visit(session, url, node, depth).await;
    });
}

async fn visit(session: CrawlSessionRef, url: String, node: NodeId, depth: usize) {
    if depth > session.max_depth {
        debug!("Max depth {} reached for {}", session.max_depth, url);
        return;
    }
    if !session.visited.try_mark(&url) {
        debug!("Already visited {}", url);
        return;
    }

    let Ok(page_url) = Url::parse(&url) else {
        debug!("Skipping unparseable URL {}", url);
        return;
    };

    let links = {
        let _permit = match &session.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };
        session.stats.pages_fetched.fetch_add(1, Ordering::Relaxed);
        match fetch_links(
            session.fetcher.as_ref(),
            &page_url,
            session.config.content_type_policy,
        )
        .await
        {
            Ok(links) => links,
            Err(e) => {
                session.stats.pages_failed.fetch_add(1, Ordering::Relaxed);
                debug!("Failed to crawl {}: {}", url, e);
                return;
            }
        }
    };
    debug!("Found {} links on {} at depth {}", links.len(), url, depth);

    for link in links {
        let Ok(parsed) = Url::parse(&link) else {
            continue;
        };
        if !session.base_host.matches(&parsed) {
            session
                .stats
                .foreign_links_skipped
                .fetch_add(1, Ordering::Relaxed);
            debug!("Skipped foreign host link: {}", link);
            continue;
        }

        let child = session.tree.attach(node, link.clone());
        session.stats.nodes_discovered.fetch_add(1, Ordering::Relaxed);

        if let Some(sink) = &session.discoveries {
            sink.publish(Discovery {
                node: child,
                parent: node,
                url: link.clone(),
                depth: depth + 1,
            })
            .await;
        }

        if depth < session.max_depth {
            dispatch(&session, link, child, depth + 1);
        }
    }
}
