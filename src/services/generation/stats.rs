//! Per-run generation counters
//!
//! One instance per orchestrator; scene tasks update it concurrently.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct GenerationStats {
    total: AtomicUsize,
    successful: AtomicUsize,
    failed: AtomicUsize,
    provider_usage: Mutex<HashMap<String, usize>>,
}

impl GenerationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, provider: &str) {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.successful.fetch_add(1, Ordering::SeqCst);
        *self
            .provider_usage
            .lock()
            .entry(provider.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total.load(Ordering::SeqCst);
        let successful = self.successful.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        let provider_usage: BTreeMap<String, usize> = self
            .provider_usage
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        StatsSnapshot {
            total,
            successful,
            failed,
            provider_usage,
            success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// Serializable copy of the counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatsSnapshot {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub provider_usage: BTreeMap<String, usize>,
    pub success_rate: f64,
}

impl StatsSnapshot {
    pub fn usage(&self, provider: &str) -> usize {
        self.provider_usage.get(provider).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = GenerationStats::new().snapshot();
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.success_rate, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates() {
        let stats = Arc::new(GenerationStats::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let stats = stats.clone();
            handles.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    stats.record_failure();
                } else {
                    stats.record_success(if i % 2 == 0 { "stability" } else { "openai" });
                }
            }));
        }
        futures::future::join_all(handles).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 64);
        assert_eq!(snapshot.failed, 16);
        assert_eq!(snapshot.successful, 48);
        assert_eq!(snapshot.usage("openai"), 32);
        assert_eq!(snapshot.usage("stability"), 16);
        assert!((snapshot.success_rate - 0.75).abs() < 1e-9);
    }
}
