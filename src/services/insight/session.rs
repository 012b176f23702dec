//! Stream Session
//!
//! One in-flight insight request: open the transport, decode frames, fold
//! events into the panel's [`StreamState`], and hand a completed answer to a
//! one-shot completion hook.
//!
//! Every state change goes through [`PanelChannel`], which tags the panel
//! with an epoch. Starting or cancelling a session bumps the epoch while the
//! state lock is held, so once `cancel` returns no event from the old session
//! can reach the panel, even one that was already decoded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use insight_core::{Applied, FrameDecoder, Phase, StreamEvent, StreamState};
use insight_llm::{InsightRequest, InsightTransport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::cache::CachedInsight;

/// Default bound on a whole stream (2 minutes)
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Called at most once, synchronously, when a session reaches `done` with an answer.
pub type CompletionHook = Box<dyn FnOnce(CachedInsight) + Send>;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// A panel's observable state plus its epoch counter.
#[derive(Debug)]
pub struct PanelChannel {
    state: watch::Sender<StreamState>,
    epoch: AtomicU64,
}

impl PanelChannel {
    pub fn new() -> Self {
        let (state, _) = watch::channel(StreamState::new());
        Self {
            state,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> StreamState {
        self.state.borrow().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidate the current epoch and reset the state to `idle`.
    /// Returns the new epoch.
    pub fn begin(&self) -> u64 {
        self.replace(StreamState::new())
    }

    /// Invalidate the current epoch and show `state`. Returns the new epoch.
    pub fn replace(&self, state: StreamState) -> u64 {
        let mut next = 0;
        self.state.send_modify(|current| {
            next = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *current = state;
        });
        next
    }

    /// Invalidate the current epoch without touching the state.
    pub fn invalidate(&self) {
        self.state.send_if_modified(|_| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            false
        });
    }

    /// Apply `event` if `epoch` is still current. `None` means the epoch is stale.
    fn apply(&self, epoch: u64, event: StreamEvent) -> Option<Step> {
        let mut step = None;
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            let applied = state.apply(event);
            step = Some(Step {
                applied,
                phase: state.phase,
                error: state.error.clone(),
                completed: match applied {
                    Applied::Completed => CachedInsight::from_state(state),
                    _ => None,
                },
            });
            applied != Applied::Ignored
        });
        step
    }
}

/// What one applied event did to the panel.
struct Step {
    applied: Applied,
    phase: Phase,
    error: Option<String>,
    /// Snapshot taken under the state lock when the event completed the session
    completed: Option<CachedInsight>,
}

impl Default for PanelChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    epoch: u64,
    token: CancellationToken,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop the read loop. Does not invalidate the epoch; see [`PanelChannel::invalidate`].
    pub fn abort_read(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    pub async fn join(self) -> SessionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => SessionOutcome::Cancelled,
            Err(e) => SessionOutcome::Failed(format!("session task failed: {}", e)),
        }
    }
}

/// Starts stream sessions for a panel.
pub struct StreamSession {
    transport: Arc<dyn InsightTransport>,
    stream_timeout: Duration,
}

impl StreamSession {
    pub fn new(transport: Arc<dyn InsightTransport>) -> Self {
        Self {
            transport,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Start a session on `panel`. The panel's previous epoch is invalidated
    /// and its state reset before the request is sent.
    pub fn start(
        &self,
        panel: Arc<PanelChannel>,
        request: InsightRequest,
        on_complete: Option<CompletionHook>,
    ) -> SessionHandle {
        let epoch = panel.begin();
        let token = CancellationToken::new();
        let run = SessionRun {
            transport: self.transport.clone(),
            panel,
            epoch,
            on_complete,
        };
        let task = tokio::spawn(run.drive(request, token.clone(), self.stream_timeout));
        SessionHandle { epoch, token, task }
    }
}

struct SessionRun {
    transport: Arc<dyn InsightTransport>,
    panel: Arc<PanelChannel>,
    epoch: u64,
    on_complete: Option<CompletionHook>,
}

impl SessionRun {
    async fn drive(
        mut self,
        request: InsightRequest,
        token: CancellationToken,
        stream_timeout: Duration,
    ) -> SessionOutcome {
        tracing::info!(
            transport = self.transport.name(),
            kind = %request.component_type,
            follow_up = request.is_follow_up(),
            epoch = self.epoch,
            "Insight session started"
        );

        let finished = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = tokio::time::timeout(stream_timeout, self.read(&request)) => Some(result),
        };
        let outcome = match finished {
            None => SessionOutcome::Cancelled,
            Some(Ok(outcome)) => outcome,
            Some(Err(_)) => self.fail(format!(
                "Insight stream timed out after {} s",
                stream_timeout.as_secs()
            )),
        };

        match &outcome {
            SessionOutcome::Completed => tracing::info!(epoch = self.epoch, "Insight session completed"),
            SessionOutcome::Failed(message) => {
                tracing::info!(epoch = self.epoch, error = %message, "Insight session failed")
            }
            SessionOutcome::Cancelled => tracing::info!(epoch = self.epoch, "Insight session cancelled"),
        }
        outcome
    }

    async fn read(&mut self, request: &InsightRequest) -> SessionOutcome {
        let mut stream = match self.transport.open(request).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(e.to_string()),
        };
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => return self.fail(e.to_string()),
            };
            if let Some(outcome) = self.apply_all(decoder.decode(&bytes)) {
                return outcome;
            }
        }

        if let Some(outcome) = self.apply_all(decoder.finish()) {
            return outcome;
        }
        self.fail("Insight stream ended before completion")
    }

    /// Apply events in order. `Some` once the session has ended.
    fn apply_all(&mut self, events: Vec<StreamEvent>) -> Option<SessionOutcome> {
        for event in events {
            tracing::debug!(event = event.event_type(), "Stream event");
            let Some(step) = self.panel.apply(self.epoch, event) else {
                return Some(SessionOutcome::Cancelled);
            };
            if let Some(outcome) = self.settle(step) {
                return Some(outcome);
            }
        }
        None
    }

    fn settle(&mut self, step: Step) -> Option<SessionOutcome> {
        if step.applied == Applied::Completed {
            if let (Some(hook), Some(insight)) = (self.on_complete.take(), step.completed) {
                hook(insight);
            }
            return Some(SessionOutcome::Completed);
        }
        if step.phase == Phase::Error {
            return Some(SessionOutcome::Failed(
                step.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        None
    }

    /// Surface `message` as phase `error`, unless the epoch went stale.
    fn fail(&mut self, message: impl Into<String>) -> SessionOutcome {
        let message = message.into();
        match self.panel.apply(self.epoch, StreamEvent::Error { message: message.clone() }) {
            Some(_) => SessionOutcome::Failed(message),
            None => SessionOutcome::Cancelled,
        }
    }
}
