//! Conversation Integration Tests
//!
//! Panels opened from one `EngineState` share its cache but nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use insight_core::{AnalysisContext, CoreError, CoreResult, Phase, TableRow};
use insight_engine::{EngineState, InsightSettings, InsightStart, SessionOutcome};
use insight_tools::UpstreamClient;
use serde_json::{json, Value};

use crate::support::{frame, ChannelTransport};

struct FixedUpstream;

#[async_trait]
impl UpstreamClient for FixedUpstream {
    async fn get_json(&self, path: &str, _query: &[(&str, String)]) -> CoreResult<Value> {
        match path {
            "/landing" => Ok(json!({"total_tps": 310.2, "chains": [{"chain_id": "base"}]})),
            _ => Err(CoreError::upstream(format!("HTTP 404 from {}", path))),
        }
    }
}

fn engine(transport: Arc<ChannelTransport>) -> EngineState {
    EngineState::with_parts(InsightSettings::default(), transport, Arc::new(FixedUpstream))
}

fn table(rows: &[&str]) -> AnalysisContext {
    AnalysisContext::Table {
        total_items: 42,
        sorted_by: Some("txcount".to_string()),
        rows: rows.iter().map(|k| TableRow::new(*k)).collect(),
        columns: vec!["Chain".to_string(), "Transactions".to_string()],
    }
}

fn answer(transport: &ChannelTransport, text: &str) {
    let feed = transport.push_body();
    feed.send(frame("text", &json!({"chunk": text}).to_string())).unwrap();
    feed.send(frame("done", "{}")).unwrap();
}

#[tokio::test]
async fn test_same_rows_in_other_order_hit_cache() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    answer(&transport, "Base leads by transactions.");

    let mut first = engine.conversation("Top chains", table(&["base", "arbitrum", "op"]));
    assert_eq!(first.request_insight(), InsightStart::Streaming);
    assert_eq!(first.wait().await, Some(SessionOutcome::Completed));

    let mut second = engine.conversation("Top chains", table(&["op", "base", "arbitrum"]));
    assert_eq!(second.request_insight(), InsightStart::Cached);
    assert_eq!(second.state().answer, "Base leads by transactions.");

    let mut third = engine.conversation("Top chains", table(&["base", "zksync"]));
    answer(&transport, "Different rows.");
    assert_eq!(third.request_insight(), InsightStart::Streaming);
    third.wait().await;
    assert_eq!(transport.opened(), 2);
}

#[tokio::test]
async fn test_multi_turn_history_is_replayed() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    let mut conv = engine.conversation(
        "Base",
        AnalysisContext::Chain {
            chain_id: "base".to_string(),
            weekly_active_addresses: 120345.4,
        },
    );

    answer(&transport, "One.");
    conv.request_insight();
    conv.wait().await;
    answer(&transport, "Two.");
    conv.ask_follow_up("And fees?").unwrap();
    conv.wait().await;
    answer(&transport, "Three.");
    conv.ask_follow_up("And next week?").unwrap();
    assert_eq!(conv.wait().await, Some(SessionOutcome::Completed));

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].messages.is_none());
    let contents: Vec<&str> = requests[2]
        .messages
        .as_ref()
        .unwrap()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["One.", "And fees?", "Two.", "And next week?"]);
    assert_eq!(conv.history().len(), 4);
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(
        engine.cache().get("chain:base:120345").unwrap().answer,
        "One."
    );
}

#[tokio::test]
async fn test_follow_up_after_failure_keeps_question_only() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    let mut conv = engine.conversation("Fees", table(&["base"]));

    // No scripted body: the transport reports rate limiting.
    conv.request_insight();
    assert!(matches!(conv.wait().await, Some(SessionOutcome::Failed(_))));
    assert_eq!(conv.state().phase, Phase::Error);

    answer(&transport, "Recovered.");
    conv.ask_follow_up("Try again?").unwrap();
    assert_eq!(conv.wait().await, Some(SessionOutcome::Completed));
    assert_eq!(conv.history().len(), 1);
}

#[tokio::test]
async fn test_cancel_mid_stream_never_caches() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    let feed = transport.push_body();
    let mut conv = engine.conversation("Card", AnalysisContext::Card {
        card_id: "tps".to_string(),
        value: 310.2,
    });
    let mut rx = conv.subscribe();

    conv.request_insight();
    feed.send(frame("text", r#"{"chunk": "TPS is"}"#)).unwrap();
    rx.wait_for(|s| s.phase == Phase::Streaming).await.unwrap();
    conv.cancel();
    let _ = feed.send(frame("done", "{}"));
    tokio::task::yield_now().await;

    assert!(engine.cache().is_empty());
    assert_eq!(conv.state().phase, Phase::Streaming);
    assert!(!conv.is_streaming());
}

fn base_chain(metric: f64) -> AnalysisContext {
    AnalysisContext::Chain {
        chain_id: "base".to_string(),
        weekly_active_addresses: metric,
    }
}

#[tokio::test]
async fn test_cache_hit_restores_reasoning() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    let feed = transport.push_body();
    feed.send(frame("thinking", r#"{"text": "Checking activity."}"#)).unwrap();
    feed.send(frame("text", r#"{"chunk": "Base is growing."}"#)).unwrap();
    feed.send(frame("done", "{}")).unwrap();

    let mut first = engine.conversation("Base", base_chain(120345.0));
    first.request_insight();
    assert_eq!(first.wait().await, Some(SessionOutcome::Completed));

    let mut second = engine.conversation("Base", base_chain(120345.0));
    assert_eq!(second.request_insight(), InsightStart::Cached);
    let state = second.state();
    assert_eq!(state.phase, Phase::Done);
    assert!(state.cached);
    assert_eq!(state.thinking, "Checking activity.");
    assert_eq!(second.wait().await, None);
    assert_eq!(transport.opened(), 1);
}

#[tokio::test]
async fn test_blank_follow_up_rejected_without_request() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    let mut conv = engine.conversation("Base", base_chain(120345.0));
    assert!(conv.ask_follow_up("   ").is_err());
    assert_eq!(transport.opened(), 0);
}

#[tokio::test]
async fn test_cancel_twice_freezes_partial_answer() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    let feed = transport.push_body();
    let mut conv = engine.conversation("Base", base_chain(120345.0));
    let mut rx = conv.subscribe();

    conv.request_insight();
    feed.send(frame("text", r#"{"chunk": "Partial"}"#)).unwrap();
    rx.wait_for(|s| s.answer == "Partial").await.unwrap();

    conv.cancel();
    conv.cancel();
    rx.borrow_and_update();
    let _ = feed.send(frame("text", r#"{"chunk": " more"}"#));
    let _ = feed.send(frame("done", "{}"));
    tokio::task::yield_now().await;

    assert_eq!(conv.state().answer, "Partial");
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_reset_and_switch_context() {
    let transport = Arc::new(ChannelTransport::default());
    let engine = engine(transport.clone());
    answer(&transport, "Answer");

    let mut conv = engine.conversation("Base", base_chain(120345.0));
    conv.request_insight();
    conv.wait().await;
    conv.reset();
    assert_eq!(conv.state().phase, Phase::Idle);
    assert!(conv.history().is_empty());

    conv.switch_context("Base weekly", base_chain(120346.0));
    assert_eq!(conv.cache_key(), "chain:base:120346");
    assert_eq!(conv.wait().await, None);
}

#[tokio::test]
async fn test_engine_executor_serves_catalog_tools() {
    let engine = engine(Arc::new(ChannelTransport::default()));
    let outcome = engine
        .executor()
        .execute_for(insight_core::ContextKind::Card, "get_landing_summary", &json!({}))
        .await;
    let wire = serde_json::to_value(&outcome).unwrap();
    assert_eq!(wire["data"]["totals"]["total_tps"], 310.2);
    assert_eq!(wire["data"]["chain_count"], 1);
}
