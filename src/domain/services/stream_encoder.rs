#[cfg(test)]
#[path = "stream_encoder_test.rs"]
mod tests;

use anyhow::Result;

use crate::domain::models::ProviderEvent;
use crate::domain::models::UIMessageChunk;

const TEXT_PART_ID: &str = "0";

/// Frames provider events as a UI message stream. The first frame opens the
/// message, a single text block wraps every delta, and the stream is closed by
/// `finish` or `error` followed by `[DONE]`.
pub struct StreamEncoder {
    message_id: String,
    started: bool,
    text_open: bool,
    finished: bool,
}

impl StreamEncoder {
    pub fn new(message_id: &str) -> StreamEncoder {
        return StreamEncoder {
            message_id: message_id.to_string(),
            started: false,
            text_open: false,
            finished: false,
        };
    }

    pub fn is_finished(&self) -> bool {
        return self.finished;
    }

    /// Chunks for one provider event. `None` means the producer went away
    /// without finishing, which closes the stream with an error.
    pub fn chunks(&mut self, event: Option<ProviderEvent>) -> Vec<UIMessageChunk> {
        let mut chunks = vec![];
        if self.finished {
            return chunks;
        }

        if !self.started {
            self.started = true;
            chunks.push(UIMessageChunk::Start {
                message_id: Some(self.message_id.clone()),
            });
            chunks.push(UIMessageChunk::StartStep);
        }

        match event {
            Some(ProviderEvent::Delta(delta)) => {
                if delta.is_empty() {
                    return chunks;
                }
                if !self.text_open {
                    self.text_open = true;
                    chunks.push(UIMessageChunk::TextStart {
                        id: TEXT_PART_ID.to_string(),
                    });
                }
                chunks.push(UIMessageChunk::TextDelta {
                    id: TEXT_PART_ID.to_string(),
                    delta,
                });
            }
            Some(ProviderEvent::Done) => {
                self.close_text(&mut chunks);
                chunks.push(UIMessageChunk::FinishStep);
                chunks.push(UIMessageChunk::Finish);
                self.finished = true;
            }
            Some(ProviderEvent::Failed(error_text)) => {
                self.fail(&mut chunks, &error_text);
            }
            Some(ProviderEvent::TimedOut) => {
                self.fail(&mut chunks, "The response took too long and was stopped.");
            }
            None => {
                self.fail(&mut chunks, "The provider stream ended unexpectedly.");
            }
        }

        return chunks;
    }

    /// Server-sent events frame for one provider event, `[DONE]` included once
    /// the stream is finished.
    pub fn encode(&mut self, event: Option<ProviderEvent>) -> Result<String> {
        let mut frame = "".to_string();
        for chunk in self.chunks(event) {
            frame += &chunk.to_sse()?;
        }
        if self.finished {
            frame += &UIMessageChunk::done_sse();
        }

        return Ok(frame);
    }

    fn close_text(&mut self, chunks: &mut Vec<UIMessageChunk>) {
        if self.text_open {
            self.text_open = false;
            chunks.push(UIMessageChunk::TextEnd {
                id: TEXT_PART_ID.to_string(),
            });
        }
    }

    fn fail(&mut self, chunks: &mut Vec<UIMessageChunk>, error_text: &str) {
        self.close_text(chunks);
        chunks.push(UIMessageChunk::Error {
            error_text: error_text.to_string(),
        });
        self.finished = true;
    }
}
