use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::ChatRequest;
use super::Event;

#[async_trait]
pub trait Transport {
    /// Sends a chat request to the relay and forwards every decoded stream
    /// chunk as `Event::StreamChunk`. Returns once the stream has finished;
    /// a stream closing before it finished is an error.
    async fn send<'a>(
        &self,
        generation: u64,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()>;
}

pub type SharedTransport = Arc<dyn Transport + Send + Sync>;
