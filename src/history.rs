//! Bounded history of answered queries for interactive sessions

use crate::pipeline::{QueryRequest, QueryResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub asked_at: DateTime<Utc>,
    pub request: QueryRequest,
    pub response: QueryResponse,
}

/// Most recent queries, oldest evicted first
///
/// Owned by whoever runs the session and passed in explicitly.
#[derive(Debug)]
pub struct QueryHistory {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl QueryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, request: QueryRequest, response: QueryResponse) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(HistoryEntry {
            asked_at: Utc::now(),
            request,
            response,
        });
    }

    /// Up to `n` entries, newest first
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.lock().iter().rev().take(n).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AnswerOutcome;

    fn record(history: &QueryHistory, query: &str) {
        history.record(
            QueryRequest {
                query: query.to_string(),
                k: 5,
                threshold: 0.4,
                filter: None,
            },
            QueryResponse {
                outcome: AnswerOutcome::NoMatches,
                warnings: Vec::new(),
            },
        );
    }

    #[test]
    fn test_recent_is_newest_first() {
        let history = QueryHistory::new(10);
        for q in ["a", "b", "c"] {
            record(&history, q);
        }
        let recent: Vec<_> = history.recent(2).into_iter().map(|e| e.request.query).collect();
        assert_eq!(recent, vec!["c", "b"]);
        assert_eq!(history.recent(10).len(), 3);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let history = QueryHistory::new(2);
        for q in ["a", "b", "c"] {
            record(&history, q);
        }
        assert_eq!(history.len(), 2);
        let recent: Vec<_> = history.recent(5).into_iter().map(|e| e.request.query).collect();
        assert_eq!(recent, vec!["c", "b"]);
    }

    #[test]
    fn test_clear() {
        let history = QueryHistory::new(3);
        record(&history, "a");
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_separate_histories_are_independent() {
        let first = QueryHistory::new(3);
        let second = QueryHistory::new(3);
        record(&first, "a");
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
