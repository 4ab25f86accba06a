#[cfg(test)]
#[path = "ui_message_chunk_test.rs"]
mod tests;

use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Header announcing the UI message stream protocol version on relay responses.
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";
pub const UI_MESSAGE_STREAM_VERSION: &str = "v1";
pub const STREAM_DONE: &str = "[DONE]";

/// A single event of the UI message stream, framed as one server-sent event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UIMessageChunk {
    #[serde(rename_all = "camelCase")]
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
    StartStep,
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    FinishStep,
    Finish,
    #[serde(rename_all = "camelCase")]
    Error {
        error_text: String,
    },
    Abort,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StreamLine {
    Chunk(UIMessageChunk),
    Done,
    Skip,
}

impl UIMessageChunk {
    /// Chunks after which no further content belongs to the response.
    pub fn is_terminal(&self) -> bool {
        return matches!(
            self,
            UIMessageChunk::Finish | UIMessageChunk::Error { .. } | UIMessageChunk::Abort
        );
    }

    pub fn to_sse(&self) -> Result<String> {
        return Ok(format!("data: {}\n\n", serde_json::to_string(self)?));
    }

    pub fn done_sse() -> String {
        return format!("data: {STREAM_DONE}\n\n");
    }

    /// Decodes one line of a server-sent events body. Comments, blank lines
    /// and non `data:` fields are skipped.
    pub fn decode_line(line: &str) -> Result<StreamLine> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            return Ok(StreamLine::Skip);
        }

        let payload = match line.strip_prefix("data:") {
            Some(payload) => payload.trim(),
            None => return Ok(StreamLine::Skip),
        };

        if payload.is_empty() {
            return Ok(StreamLine::Skip);
        }
        if payload == STREAM_DONE {
            return Ok(StreamLine::Done);
        }

        let chunk: UIMessageChunk = serde_json::from_str(payload)?;
        return Ok(StreamLine::Chunk(chunk));
    }
}
