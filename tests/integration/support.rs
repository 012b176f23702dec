//! Test transports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use insight_llm::{ByteStream, InsightRequest, InsightTransport, TransportError, TransportResult};
use tokio::sync::mpsc;

pub type Chunk = Result<Bytes, TransportError>;

/// Replays a fixed list of chunks for every `open`.
pub struct ScriptedTransport {
    chunks: Vec<Chunk>,
    pub opens: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            opens: AtomicUsize::new(0),
        }
    }

    /// Split `body` into chunks at the given byte offsets.
    pub fn split(body: &[u8], offsets: &[usize]) -> Self {
        let mut chunks = Vec::new();
        let mut start = 0;
        for &offset in offsets {
            chunks.push(Ok(Bytes::copy_from_slice(&body[start..offset])));
            start = offset;
        }
        chunks.push(Ok(Bytes::copy_from_slice(&body[start..])));
        Self::new(chunks)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, _request: &InsightRequest) -> TransportResult<ByteStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::pin(futures_util::stream::iter(self.chunks.clone())))
    }
}

/// Transport whose bodies are fed by the test, one channel per `open`.
#[derive(Default)]
pub struct ChannelTransport {
    bodies: Mutex<VecDeque<mpsc::UnboundedReceiver<Chunk>>>,
    pub requests: Mutex<Vec<InsightRequest>>,
}

impl ChannelTransport {
    pub fn push_body(&self) -> mpsc::UnboundedSender<Chunk> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.bodies.lock().unwrap().push_back(rx);
        tx
    }

    pub fn opened(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl InsightTransport for ChannelTransport {
    fn name(&self) -> &str {
        "channel"
    }

    async fn open(&self, request: &InsightRequest) -> TransportResult<ByteStream> {
        self.requests.lock().unwrap().push(request.clone());
        let rx = self
            .bodies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::RateLimited {
                message: "Too many requests".to_string(),
            })?;
        Ok(Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}

pub fn frame(event: &str, data: &str) -> Chunk {
    Ok(Bytes::from(format!("event: {}\ndata: {}\n\n", event, data)))
}

/// A complete session body exercising every event kind.
pub fn full_body() -> Vec<u8> {
    concat!(
        "event: status\ndata: {\"phase\": \"thinking\", \"message\": \"Planning\"}\n\n",
        "event: thinking\ndata: {\"text\": \"Looking at weekly activity. \"}\n\n",
        "event: tool_start\ndata: {\"name\": \"get_chain_overview\", \"args\": {\"chain_id\": \"base\"}, \"turn\": 1}\n\n",
        "event: tool_start\ndata: {\"name\": \"get_chain_timeseries\", \"args\": {\"chain_id\": \"base\", \"metric\": \"daa\"}, \"turn\": 1}\n\n",
        "event: tool_end\ndata: {\"name\": \"get_chain_timeseries\", \"duration\": 41, \"result\": {\"total_points\": 90}}\n\n",
        "event: tool_end\ndata: {\"name\": \"get_chain_overview\", \"duration\": 12, \"result\": {\"name\": \"Base\"}}\n\n",
        "event: heartbeat\ndata: {}\n\n",
        "event: text\ndata: {\"chunk\": \"Base gained 4% más \"}\n\n",
        "event: text\ndata: {\"chunk\": \"addresses this week.\"}\n\n",
        "event: done\ndata: {\"sources\": [\"growthepie\", {\"title\": \"Base overview\", \"url\": \"https://example.com/base\"}]}\n\n",
    )
    .as_bytes()
    .to_vec()
}
