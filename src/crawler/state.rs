use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, Semaphore};
use url::Url;

use super::config::CrawlerConfig;
use super::fetch::Fetcher;
use super::stream::DiscoverySink;
use super::tree::{Tree, TreeRef};
use super::visited::VisitedSet;

/// Host and effective port links must share with the seed to be followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseHost {
    host: Option<String>,
    port: Option<u16>,
}

impl BaseHost {
    pub fn of(url: &Url) -> Self {
        Self {
            host: url.host_str().map(str::to_string),
            port: url.port_or_known_default(),
        }
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.host.is_some()
            && self.host.as_deref() == url.host_str()
            && self.port == url.port_or_known_default()
    }
}

/// Counters collected while crawling
#[derive(Debug, Default)]
pub struct CrawlStats {
    /// Fetch attempts, one per URL won from the visited set
    pub pages_fetched: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub nodes_discovered: AtomicUsize,
    pub foreign_links_skipped: AtomicUsize,
}

/// Plain copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatsSnapshot {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub nodes_discovered: usize,
    pub foreign_links_skipped: usize,
}

impl CrawlStats {
    pub fn snapshot(&self) -> CrawlStatsSnapshot {
        CrawlStatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            nodes_discovered: self.nodes_discovered.load(Ordering::Relaxed),
            foreign_links_skipped: self.foreign_links_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Counts dispatched tasks that have not finished yet
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements its [`InFlight`] counter when dropped
#[derive(Debug)]
pub struct TaskGuard {
    in_flight: Arc<InFlight>,
}

impl InFlight {
    /// Must be called before the task is spawned
    pub fn enter(self: &Arc<Self>) -> TaskGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            in_flight: Arc::clone(self),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolves once every guard handed out so far has been dropped
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.in_flight.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.in_flight.idle.notify_waiters();
        }
    }
}

/// Everything one crawl invocation shares between its tasks
pub struct CrawlSession {
    pub base_host: BaseHost,
    pub max_depth: usize,
    pub visited: VisitedSet,
    pub tree: TreeRef,
    pub stats: CrawlStats,
    pub in_flight: Arc<InFlight>,
    pub discoveries: Option<DiscoverySink>,
    pub limiter: Option<Semaphore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub config: Arc<CrawlerConfig>,
}

impl CrawlSession {
    pub fn new(
        seed: &str,
        seed_url: &Url,
        max_depth: usize,
        fetcher: Arc<dyn Fetcher>,
        config: Arc<CrawlerConfig>,
        discoveries: Option<DiscoverySink>,
    ) -> Self {
        Self {
            base_host: BaseHost::of(seed_url),
            max_depth,
            visited: VisitedSet::new(),
            tree: Arc::new(Tree::with_root(seed)),
            stats: CrawlStats::default(),
            in_flight: Arc::new(InFlight::default()),
            discoveries,
            limiter: config.max_concurrency.map(Semaphore::new),
            fetcher,
            config,
        }
    }
}

pub type CrawlSessionRef = Arc<CrawlSession>;
