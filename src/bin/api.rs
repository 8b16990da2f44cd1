use anyhow::Result;
use log2::*;
use site_tree::config::ServeConfig;
use site_tree::crawler::Crawler;
use site_tree::server::{self, ServerState};
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ServeConfig::new();
    cfg.validate()?;
    cfg.log.start(&cfg.log.target(false));

    let crawler = Crawler::new(cfg.fetch.crawler_config())?;
    let state = ServerState::new(crawler, Duration::from_secs(cfg.keep_alive));

    let listener = TcpListener::bind(cfg.listen).await?;
    server::serve(listener, state, server::shutdown_signal()).await?;
    info!("Server exiting");

    Ok(())
}
