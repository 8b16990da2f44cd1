//! HTTP front end: `GET /crawl?domain=..&depth=..` streams a crawl as server-sent events.
//!
//! The response body is fed by [`live::write_sse`] through an in-memory pipe. When the
//! client goes away the pipe breaks, the writer reports a disconnect and the crawl's
//! join handle is aborted.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log2::*;
use serde::Deserialize;
use tokio::io::DuplexStream;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::sleep;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;

use crate::crawler::{Crawler, LiveCrawl};
use crate::live::{self, SseEnd};

/// Seed used when the request names no domain
pub const DEFAULT_DOMAIN: &str = "https://example.com";
pub const DEFAULT_DEPTH: usize = 2;
/// How long open streams may keep running once shutdown starts
pub const SHUTDOWN_GRACE_SEC: u64 = 5;

const SSE_PIPE_BYTES: usize = 64 * 1024;

/// Shared by every request
#[derive(Clone)]
pub struct ServerState {
    crawler: Crawler,
    keep_alive: Duration,
}

impl ServerState {
    pub fn new(crawler: Crawler, keep_alive: Duration) -> Self {
        Self {
            crawler,
            keep_alive,
        }
    }
}

/// Query string of `/crawl`
#[derive(Debug, Default, Deserialize)]
pub struct CrawlParams {
    pub domain: Option<String>,
    pub depth: Option<String>,
}

impl CrawlParams {
    /// Seed and depth with defaults filled in
    pub fn resolve(self) -> Result<(String, usize), &'static str> {
        let depth = match self.depth.as_deref() {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| "Invalid depth parameter")?,
            None => DEFAULT_DEPTH,
        };
        let domain = self.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
        Ok((domain, depth))
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/crawl", get(crawl))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn crawl(State(state): State<ServerState>, Query(params): Query<CrawlParams>) -> Response {
    let (domain, depth) = match params.resolve() {
        Ok(resolved) => resolved,
        Err(message) => return bad_request(message.to_string()),
    };
    let live_crawl = match state.crawler.stream(&domain, depth) {
        Ok(live_crawl) => live_crawl,
        Err(e) => return bad_request(e.to_string()),
    };
    info!("Streaming crawl of {} up to depth {}", domain, depth);

    let (writer, reader) = tokio::io::duplex(SSE_PIPE_BYTES);
    tokio::spawn(pump(live_crawl, writer, state.keep_alive));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response()
}

/// Writes frames into the response pipe until the crawl ends or the client leaves
async fn pump(live_crawl: LiveCrawl, mut writer: DuplexStream, keep_alive: Duration) {
    let LiveCrawl {
        mut events,
        tree,
        handle,
    } = live_crawl;
    match live::write_sse(&mut writer, &mut events, &tree, keep_alive).await {
        SseEnd::Finished => match handle.await {
            Ok(report) => info!(
                "Stream finished: {} nodes, {} pages fetched",
                report.root.len(),
                report.stats.pages_fetched
            ),
            Err(e) => warn!("Crawl task failed: {}", e),
        },
        SseEnd::Disconnected => {
            info!("Client has disconnected");
            handle.abort();
        }
    }
}

/// Serves `/crawl` on `listener` until `shutdown` resolves.
///
/// Open streams then get [`SHUTDOWN_GRACE_SEC`] to finish before the server gives up
/// on them.
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    let stopping = Arc::new(Notify::new());
    let trigger = Arc::clone(&stopping);
    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        shutdown.await;
        info!("Shutting down server...");
        trigger.notify_one();
    });

    tokio::select! {
        result = server.into_future() => result,
        () = async {
            stopping.notified().await;
            sleep(Duration::from_secs(SHUTDOWN_GRACE_SEC)).await;
        } => {
            warn!("Server forced to shutdown after {}s", SHUTDOWN_GRACE_SEC);
            Ok(())
        }
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
