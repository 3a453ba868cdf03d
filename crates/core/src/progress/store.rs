//! Latest progress per job, with bounded retention of finished jobs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::generator::{ProgressCallback, ProgressEvent};
use crate::metrics::PROGRESS_EVICTIONS;

#[derive(Debug, Clone)]
struct StoredProgress {
    event: ProgressEvent,
    updated_at: Instant,
}

/// Keeps the most recent [`ProgressEvent`] for each job.
///
/// Entries for jobs still running are never evicted; terminal entries are
/// dropped once they are older than the retention period.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    entries: Arc<RwLock<HashMap<String, StoredProgress>>>,
    retention: Duration,
}

impl ProgressStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Store `event` as the latest progress of `id`.
    pub fn record(&self, id: &str, event: &ProgressEvent) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            id.to_string(),
            StoredProgress {
                event: event.clone(),
                updated_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<ProgressEvent> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).map(|p| p.event.clone())
    }

    pub fn remove(&self, id: &str) -> Option<ProgressEvent> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(id).map(|p| p.event)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop terminal entries older than the retention period.
    ///
    /// Returns the number of entries removed.
    pub fn evict_expired(&self) -> usize {
        self.evict_older_than(Instant::now())
    }

    fn evict_older_than(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, p| {
            !(p.event.status.is_terminal()
                && now.saturating_duration_since(p.updated_at) >= self.retention)
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            PROGRESS_EVICTIONS.inc_by(evicted as u64);
            debug!(evicted, remaining = entries.len(), "Evicted expired progress entries");
        }
        evicted
    }

    /// Run [`evict_expired`](Self::evict_expired) every `interval`.
    pub fn spawn_eviction(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.evict_expired();
            }
        })
    }

    /// A progress callback that writes into this store.
    pub fn callback(&self) -> ProgressCallback {
        let store = self.clone();
        Arc::new(move |id: &str, event: &ProgressEvent| store.record(id, event))
    }
}
