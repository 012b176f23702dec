//! Insight Cache Integration Tests

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use insight_engine::services::insight::{CachedInsight, InsightCache};

fn insight(answer: &str) -> CachedInsight {
    CachedInsight {
        answer: answer.to_string(),
        thinking: String::new(),
        tool_calls: Vec::new(),
        sources: Vec::new(),
        debug: None,
        timestamp: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry_removes_on_read() {
    let cache = InsightCache::new(Duration::from_secs(300), 16);
    cache.put("table:3:a,b,c:default", insight("three rows"));

    tokio::time::advance(Duration::from_secs(301)).await;
    assert_eq!(cache.len(), 1);
    assert!(cache.get("table:3:a,b,c:default").is_none());
    assert_eq!(cache.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_writers_first_wins() {
    let cache = Arc::new(InsightCache::default());
    let mut tasks = Vec::new();
    for i in 0..16 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            cache.put("chain:base:120345", insight(&format!("writer {}", i)))
        }));
    }

    let mut stored = 0;
    for task in tasks {
        if task.await.unwrap() {
            stored += 1;
        }
    }
    assert_eq!(stored, 1);
    let winner = cache.get("chain:base:120345").unwrap().answer;
    assert!(winner.starts_with("writer "));
    assert!(!cache.put("chain:base:120345", insight("late")));
    assert_eq!(cache.get("chain:base:120345").unwrap().answer, winner);
}

#[tokio::test(start_paused = true)]
async fn test_entry_bound_holds() {
    let cache = InsightCache::new(Duration::from_secs(300), 4);
    for i in 0..10 {
        cache.put(&format!("card:c{}:1", i), insight("x"));
        tokio::time::advance(Duration::from_millis(10)).await;
    }
    assert_eq!(cache.len(), 4);
    assert!(cache.get("card:c9:1").is_some());
    assert!(cache.get("card:c0:1").is_none());
}
