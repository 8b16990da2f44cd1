//! Server-sent-event framing for a crawl in progress.
//!
//! Every discovery is turned into a `data:` frame holding a JSON snapshot of the tree
//! so far. When nothing arrives for `keep_alive`, a comment frame keeps the connection
//! open. The writer is any async sink, usually an HTTP response body or stdout.

use std::time::Duration;

use log2::*;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, sleep};

use crate::crawler::{DiscoveryReceiver, Tree};

/// Idle time before a keep-alive frame is written
pub const KEEP_ALIVE_INTERVAL_SEC: u64 = 30;

const KEEP_ALIVE_FRAME: &str = ": keep-alive\n\n";

/// Why [`write_sse`] stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseEnd {
    /// The crawl closed its discovery stream
    Finished,
    /// A write failed, the consumer is gone
    Disconnected,
}

/// `data:` frame carrying the current tree as JSON
pub fn snapshot_frame(tree: &Tree) -> serde_json::Result<String> {
    let json = serde_json::to_string(&tree.snapshot())?;
    Ok(format!("data: {}\n\n", json))
}

async fn write_frame<W>(writer: &mut W, frame: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}

/// Streams `events` to `writer` until the crawl ends or the consumer disconnects.
pub async fn write_sse<W>(
    writer: &mut W,
    events: &mut DiscoveryReceiver,
    tree: &Tree,
    keep_alive: Duration,
) -> SseEnd
where
    W: AsyncWrite + Unpin,
{
    let idle = sleep(keep_alive);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(discovery) = event else {
                    debug!("Discovery stream closed");
                    return SseEnd::Finished;
                };
                let frame = match snapshot_frame(tree) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Failed to serialize tree after {}: {}", discovery.url, e);
                        continue;
                    }
                };
                if let Err(e) = write_frame(writer, &frame).await {
                    info!("Client has disconnected: {}", e);
                    return SseEnd::Disconnected;
                }
                idle.as_mut().reset(Instant::now() + keep_alive);
            }
            () = &mut idle => {
                if let Err(e) = write_frame(writer, KEEP_ALIVE_FRAME).await {
                    info!("Client has disconnected during keep-alive: {}", e);
                    return SseEnd::Disconnected;
                }
                idle.as_mut().reset(Instant::now() + keep_alive);
            }
        }
    }
}
