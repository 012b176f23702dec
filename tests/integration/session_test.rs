//! Stream Session Integration Tests
//!
//! Drives `StreamSession` with scripted transports and checks what the
//! panel ends up showing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use insight_core::{AnalysisContext, Phase, StreamState};
use insight_engine::services::insight::{CompletionHook, PanelChannel, SessionOutcome, StreamSession};
use insight_llm::{InsightRequest, TransportError};

use crate::support::{frame, full_body, ChannelTransport, ScriptedTransport};

fn request() -> InsightRequest {
    InsightRequest::new(
        "Base",
        AnalysisContext::Chain {
            chain_id: "base".to_string(),
            weekly_active_addresses: 120345.0,
        },
    )
}

fn counting_hook(counter: &Arc<AtomicUsize>) -> CompletionHook {
    let counter = counter.clone();
    Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

async fn run(transport: ScriptedTransport) -> (SessionOutcome, StreamState) {
    let panel = Arc::new(PanelChannel::new());
    let handle = StreamSession::new(Arc::new(transport)).start(panel.clone(), request(), None);
    let outcome = handle.join().await;
    (outcome, panel.snapshot())
}

// ============================================================================
// Frame splitting
// ============================================================================

#[tokio::test]
async fn test_full_body_reduces_to_expected_state() {
    let (outcome, state) = run(ScriptedTransport::split(&full_body(), &[])).await;
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(state.phase, Phase::Done);
    assert_eq!(state.thinking, "Looking at weekly activity. ");
    assert_eq!(state.answer, "Base gained 4% más addresses this week.");
    assert_eq!(state.tool_calls.len(), 2);
    assert_eq!(state.tool_calls[0].duration_ms, 12);
    assert_eq!(state.tool_calls[1].duration_ms, 41);
    assert_eq!(state.sources.len(), 2);
    assert_eq!(state.sources[0].title, "growthepie");
    assert_eq!(state.sources[1].url.as_deref(), Some("https://example.com/base"));
}

#[tokio::test]
async fn test_split_at_every_offset_gives_same_state() {
    let body = full_body();
    let (_, expected) = run(ScriptedTransport::split(&body, &[])).await;
    for offset in 1..body.len() {
        let (outcome, state) = run(ScriptedTransport::split(&body, &[offset])).await;
        assert_eq!(outcome, SessionOutcome::Completed, "split at {}", offset);
        assert_eq!(state, expected, "split at {}", offset);
    }
}

#[tokio::test]
async fn test_byte_at_a_time_gives_same_state() {
    let body = full_body();
    let (_, expected) = run(ScriptedTransport::split(&body, &[])).await;
    let offsets: Vec<usize> = (1..body.len()).collect();
    let (outcome, state) = run(ScriptedTransport::split(&body, &offsets)).await;
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(state, expected);
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let transport = ScriptedTransport::new(vec![
        frame("text", r#"{"chunk": "Fees "}"#),
        frame("text", r#"{"chunk": broken"#),
        frame("text", r#"{"chunk": "fell."}"#),
        frame("done", "{}"),
    ]);
    let (outcome, state) = run(transport).await;
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(state.answer, "Fees fell.");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_early_eof_is_error() {
    let transport = ScriptedTransport::new(vec![frame("text", r#"{"chunk": "Half an"}"#)]);
    let (outcome, state) = run(transport).await;
    assert_eq!(
        outcome,
        SessionOutcome::Failed("Insight stream ended before completion".to_string())
    );
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.answer, "Half an");
}

#[tokio::test]
async fn test_unterminated_final_frame_still_completes() {
    let transport = ScriptedTransport::new(vec![
        frame("text", r#"{"chunk": "Done soon."}"#),
        Ok(Bytes::from_static(b"event: done\ndata: {}")),
    ]);
    let (outcome, state) = run(transport).await;
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(state.phase, Phase::Done);
}

#[tokio::test]
async fn test_mid_stream_drop_is_error() {
    let transport = ScriptedTransport::new(vec![
        frame("thinking", r#"{"text": "Hmm"}"#),
        Err(TransportError::Network("connection reset".to_string())),
    ]);
    let (outcome, state) = run(transport).await;
    assert!(matches!(outcome, SessionOutcome::Failed(_)));
    assert_eq!(state.error.as_deref(), Some("Network error: connection reset"));
}

#[tokio::test]
async fn test_agent_error_event_ends_session() {
    let transport = ScriptedTransport::new(vec![
        frame("error", r#"{"message": "upstream overloaded"}"#),
        frame("text", r#"{"chunk": "ignored"}"#),
    ]);
    let (outcome, state) = run(transport).await;
    assert_eq!(outcome, SessionOutcome::Failed("upstream overloaded".to_string()));
    assert!(state.answer.is_empty());
}

#[tokio::test]
async fn test_rate_limit_is_single_error_state() {
    let transport = Arc::new(ChannelTransport::default());
    let panel = Arc::new(PanelChannel::new());
    let handle = StreamSession::new(transport).start(panel.clone(), request(), None);
    assert!(matches!(handle.join().await, SessionOutcome::Failed(_)));
    let state = panel.snapshot();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.error.as_deref(), Some("Rate limited: Too many requests"));
}

#[tokio::test(start_paused = true)]
async fn test_stream_timeout_is_error() {
    let transport = Arc::new(ChannelTransport::default());
    let _feed = transport.push_body();
    let panel = Arc::new(PanelChannel::new());
    let handle = StreamSession::new(transport)
        .with_timeout(Duration::from_secs(120))
        .start(panel.clone(), request(), None);
    assert_eq!(
        handle.join().await,
        SessionOutcome::Failed("Insight stream timed out after 120 s".to_string())
    );
    assert_eq!(panel.snapshot().phase, Phase::Error);
}

// ============================================================================
// Completion and cancellation
// ============================================================================

#[tokio::test]
async fn test_completion_hook_fires_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = ScriptedTransport::new(vec![
        frame("text", r#"{"chunk": "Answer"}"#),
        frame("done", "{}"),
        frame("done", "{}"),
    ]);
    let panel = Arc::new(PanelChannel::new());
    let handle = StreamSession::new(Arc::new(transport)).start(panel, request(), Some(counting_hook(&calls)));
    assert_eq!(handle.join().await, SessionOutcome::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_completion_without_answer_skips_hook() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = ScriptedTransport::new(vec![frame("done", "{}")]);
    let panel = Arc::new(PanelChannel::new());
    let handle = StreamSession::new(Arc::new(transport)).start(panel, request(), Some(counting_hook(&calls)));
    assert_eq!(handle.join().await, SessionOutcome::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalidated_epoch_drops_late_done() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = Arc::new(ChannelTransport::default());
    let feed = transport.push_body();
    let panel = Arc::new(PanelChannel::new());
    let mut rx = panel.subscribe();
    let handle = StreamSession::new(transport).start(panel.clone(), request(), Some(counting_hook(&calls)));

    feed.send(frame("text", r#"{"chunk": "Partial"}"#)).unwrap();
    rx.wait_for(|s| s.answer == "Partial").await.unwrap();

    // Invalidate without stopping the read loop: the done frame is still
    // decoded but must not reach the panel.
    panel.invalidate();
    rx.borrow_and_update();
    feed.send(frame("done", "{}")).unwrap();

    assert_eq!(handle.join().await, SessionOutcome::Cancelled);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(panel.snapshot().phase, Phase::Streaming);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_abort_read_stops_promptly() {
    let transport = Arc::new(ChannelTransport::default());
    let _feed = transport.push_body();
    let panel = Arc::new(PanelChannel::new());
    let handle = StreamSession::new(transport).start(panel.clone(), request(), None);

    panel.invalidate();
    handle.abort_read();
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("session did not stop");
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(panel.snapshot().phase, Phase::Idle);
}

#[tokio::test]
async fn test_new_session_supersedes_old() {
    let transport = Arc::new(ChannelTransport::default());
    let old_feed = transport.push_body();
    let new_feed = transport.push_body();
    let panel = Arc::new(PanelChannel::new());
    let sessions = StreamSession::new(transport.clone());

    let mut rx = panel.subscribe();
    let old = sessions.start(panel.clone(), request(), None);
    old_feed.send(frame("text", r#"{"chunk": "old"}"#)).unwrap();
    rx.wait_for(|s| s.answer == "old").await.unwrap();

    let new = sessions.start(panel.clone(), request(), None);
    assert!(new.epoch() > old.epoch());
    new_feed.send(frame("text", r#"{"chunk": "new"}"#)).unwrap();
    new_feed.send(frame("done", "{}")).unwrap();
    old_feed.send(frame("done", "{}")).unwrap();

    assert_eq!(new.join().await, SessionOutcome::Completed);
    assert_eq!(old.join().await, SessionOutcome::Cancelled);
    assert_eq!(panel.snapshot().answer, "new");
}
