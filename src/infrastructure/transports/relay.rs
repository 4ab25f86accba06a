#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::StreamLine;
use crate::domain::models::Transport;
use crate::domain::models::UIMessageChunk;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

/// Talks to a relay server over `POST /api/chat`.
pub struct RelayTransport {
    url: String,
}

impl Default for RelayTransport {
    fn default() -> RelayTransport {
        return RelayTransport::new(&Config::get(ConfigKey::ServerURL));
    }
}

impl RelayTransport {
    pub fn new(url: &str) -> RelayTransport {
        return RelayTransport {
            url: url.trim_end_matches('/').to_string(),
        };
    }
}

#[async_trait]
impl Transport for RelayTransport {
    #[allow(clippy::implicit_return)]
    async fn send<'a>(
        &self,
        generation: u64,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let res = reqwest::Client::new()
            .post(format!("{url}/api/chat", url = self.url))
            .json(&request)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status, body = body, "Relay rejected chat request");
            bail!(format!("Relay rejected chat request, {status}"));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        let mut finished = false;
        while let Some(line) = lines_reader.next_line().await? {
            match UIMessageChunk::decode_line(&line)? {
                StreamLine::Skip => continue,
                StreamLine::Done => {
                    finished = true;
                    break;
                }
                StreamLine::Chunk(chunk) => {
                    tracing::debug!(generation = generation, chunk = ?chunk, "Stream chunk");
                    if chunk.is_terminal() {
                        finished = true;
                    }
                    tx.send(Event::StreamChunk(generation, chunk))?;
                }
            }
        }

        if !finished {
            bail!("Relay closed the stream before it finished");
        }

        return Ok(());
    }
}
