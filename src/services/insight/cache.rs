//! Insight Cache
//!
//! Completed insights keyed by the derived context key, shared across panels.
//! Bounded by TTL and entry count. Writes are first-writer-wins: a live entry
//! is never replaced, so a late session cannot overwrite an earlier answer.
//!
//! Uses `Mutex<HashMap>` rather than `mini-moka` because first-writer-wins
//! and expire-on-read need to be exact and deterministic.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use insight_core::{Source, StreamState, ToolCallRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

/// Default lifetime of a cached insight (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached insights
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;

/// Snapshot of a completed session. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedInsight {
    pub answer: String,
    pub thinking: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl CachedInsight {
    /// Snapshot a finished state. `None` unless the state is `done` with an answer.
    pub fn from_state(state: &StreamState) -> Option<Self> {
        if !state.has_answer() {
            return None;
        }
        Some(Self {
            answer: state.answer.clone(),
            thinking: state.thinking.clone(),
            tool_calls: state.tool_calls.clone(),
            sources: state.sources.clone(),
            debug: state.debug.clone(),
            timestamp: Utc::now(),
        })
    }

    /// The state a panel shows when served from cache.
    pub fn to_state(&self) -> StreamState {
        StreamState {
            phase: insight_core::Phase::Done,
            thinking: self.thinking.clone(),
            answer: self.answer.clone(),
            tool_calls: self.tool_calls.clone(),
            sources: self.sources.clone(),
            debug: self.debug.clone(),
            error: None,
            cached: true,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    insight: CachedInsight,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct InsightCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl InsightCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `key`. An expired entry is removed by the read.
    pub fn get(&self, key: &str) -> Option<CachedInsight> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.insight.clone()),
            Some(_) => {
                tracing::debug!("Insight cache entry expired: {}", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `insight` unless a live entry exists. Returns whether it was stored.
    pub fn put(&self, key: &str, insight: CachedInsight) -> bool {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(key) {
            if existing.inserted_at.elapsed() < self.ttl {
                tracing::debug!("Insight cache already holds {}; keeping first write", key);
                return false;
            }
        }

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    tracing::debug!("Insight cache full; evicting {}", oldest);
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                insight,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InsightCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_MAX_ENTRIES)
    }
}
