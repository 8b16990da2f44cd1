use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::tree::NodeId;

/// A node at the moment it was attached to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub node: NodeId,
    pub parent: NodeId,
    pub url: String,
    /// Depth of the new node, the seed being 0
    pub depth: usize,
}

pub type DiscoveryReceiver = mpsc::Receiver<Discovery>;

/// Producer side of the discovery stream.
///
/// Open until [`DiscoverySink::close`] runs; receivers then see `None` once the buffer
/// is drained.
#[derive(Debug)]
pub struct DiscoverySink {
    tx: Mutex<Option<mpsc::Sender<Discovery>>>,
}

/// Bounded discovery channel holding up to `capacity` unread events
pub fn discovery_channel(capacity: usize) -> (DiscoverySink, DiscoveryReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        DiscoverySink {
            tx: Mutex::new(Some(tx)),
        },
        rx,
    )
}

impl DiscoverySink {
    /// Waits only while the buffer is full. No-op once closed or when nobody listens.
    pub async fn publish(&self, discovery: Discovery) {
        let tx = self.tx.lock().clone();
        let Some(tx) = tx else {
            return;
        };
        if tx.send(discovery).await.is_err() {
            log2::debug!("Discovery receiver dropped, closing stream");
            self.close();
        }
    }

    /// Returns `true` for the call that actually closed the stream
    pub fn close(&self) -> bool {
        self.tx.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::tree::Tree;

    fn discovery(url: &str) -> Discovery {
        Discovery {
            node: Tree::ROOT,
            parent: Tree::ROOT,
            url: url.to_string(),
            depth: 1,
        }
    }

    #[tokio::test]
    async fn test_close_ends_stream_after_buffered_events() {
        let (sink, mut rx) = discovery_channel(4);
        sink.publish(discovery("https://example.com/a")).await;
        sink.publish(discovery("https://example.com/b")).await;
        assert!(sink.close());
        assert!(!sink.close());

        assert_eq!(rx.recv().await.unwrap().url, "https://example.com/a");
        assert_eq!(rx.recv().await.unwrap().url, "https://example.com/b");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_after_close_is_dropped() {
        let (sink, mut rx) = discovery_channel(4);
        sink.close();
        sink.publish(discovery("https://example.com/late")).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_block() {
        let (sink, rx) = discovery_channel(1);
        drop(rx);
        for i in 0..10 {
            sink.publish(discovery(&format!("https://example.com/{i}"))).await;
        }
        assert!(sink.is_closed());
    }
}
