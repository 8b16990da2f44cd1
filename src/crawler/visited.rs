use std::collections::HashSet;

use parking_lot::Mutex;

/// URLs already claimed for fetching during one crawl.
///
/// Only grows. Each URL is handed out to exactly one caller of [`VisitedSet::try_mark`].
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url` if absent. Returns `true` when this call claimed it.
    pub fn try_mark(&self, url: &str) -> bool {
        self.urls.lock().insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_second_mark_loses() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.try_mark("https://example.com/a"));
        assert!(!visited.try_mark("https://example.com/a"));
        assert!(visited.try_mark("https://example.com/b"));
        assert_eq!(visited.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_only_one_concurrent_winner() {
        let visited = Arc::new(VisitedSet::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..64 {
            let visited = Arc::clone(&visited);
            let winners = Arc::clone(&winners);
            handles.push(tokio::spawn(async move {
                if visited.try_mark("https://example.com/race") {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(visited.contains("https://example.com/race"));
    }
}
