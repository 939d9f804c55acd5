use std::sync::{Arc, Mutex};

/// Shared append-only collection of matched lines.
///
/// All workers of one run push into the same sink; the consumer may take
/// snapshots concurrently with the appends. Every append is atomic under
/// the lock, so the final collection is exactly the union of all matches
/// found, in arrival order. Arrival order is not corpus order: the
/// corpus is shuffled before partitioning and workers complete
/// independently.
#[derive(Debug, Clone, Default)]
pub struct MatchSink {
    matches: Arc<Mutex<Vec<String>>>,
}

impl MatchSink {
    /// Creates a new empty sink
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a matched line
    pub fn push(&self, line: String) {
        self.matches.lock().unwrap().push(line);
    }

    /// Number of matches appended so far
    pub fn len(&self) -> usize {
        self.matches.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.lock().unwrap().is_empty()
    }

    /// Copies the current contents. Safe to call while workers are still
    /// appending; the copy reflects some consistent prefix of the appends.
    pub fn snapshot(&self) -> Vec<String> {
        self.matches.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_and_snapshot() {
        let sink = MatchSink::new();
        assert!(sink.is_empty());

        sink.push("Banana".to_string());
        sink.push("BANANA split".to_string());

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.snapshot(), vec!["Banana", "BANANA split"]);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let sink = MatchSink::new();
        let writers = 8;
        let per_writer = 500;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for i in 0..per_writer {
                        sink.push(format!("writer {} item {}", w, i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.len(), writers * per_writer);

        let snapshot = sink.snapshot();
        for w in 0..writers {
            let count = snapshot
                .iter()
                .filter(|line| line.starts_with(&format!("writer {} ", w)))
                .count();
            assert_eq!(count, per_writer);
        }
    }

    #[test]
    fn test_clones_share_storage() {
        let sink = MatchSink::new();
        let alias = sink.clone();
        alias.push("Banana".to_string());
        assert_eq!(sink.len(), 1);
    }
}
