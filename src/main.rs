use anyhow::Result;
use log2::*;
use site_tree::crawler::Crawler;
use site_tree::live::{self, SseEnd};
use site_tree::{UrlNode, config, render};
use std::path::Path;
use std::time::{Duration, Instant};

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    cfg.validate()?;
    cfg.log.start(&cfg.log_target());

    info!("Crawling domain: {}", cfg.domain);
    info!("Crawling depth: {}", cfg.depth);

    let crawler = Crawler::new(cfg.crawler_config())?;

    let root = if cfg.stream {
        let mut live_crawl = crawler.stream(&cfg.domain, cfg.depth)?;
        let mut out = tokio::io::stdout();
        let end = live::write_sse(
            &mut out,
            &mut live_crawl.events,
            &live_crawl.tree,
            Duration::from_secs(cfg.keep_alive),
        )
        .await;
        if end == SseEnd::Disconnected {
            // nobody is reading anymore; in-flight fetches die with the runtime
            live_crawl.handle.abort();
            return Ok(());
        }
        live_crawl.handle.await?.root
    } else {
        let report = crawler.run(&cfg.domain, cfg.depth).await?;
        debug!(
            "Fetched {} pages, {} failed, {} foreign links skipped",
            report.stats.pages_fetched, report.stats.pages_failed, report.stats.foreign_links_skipped
        );
        println!("Crawling took {:?}", report.elapsed);
        print!("{}", render::render_tree(&report.root));
        report.root
    };

    if let Some(path) = &cfg.output_file {
        write_tree(path, &root)?;
        info!("Tree written to {:?}", path);
    }
    debug!("Total run time: {:?}", START_TIME.elapsed());

    Ok(())
}

fn write_tree(path: &Path, root: &UrlNode) -> Result<()> {
    let json = serde_json::to_string_pretty(root)?;
    std::fs::write(path, json)?;
    Ok(())
}
