#[cfg(test)]
#[path = "chat_session_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use uuid::Uuid;

use crate::domain::models::ChatModel;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatStatus;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::UIMessageChunk;

/// Client side state of one conversation. Holds no transport; every request
/// it hands out is tagged with a generation so chunks of a stopped or
/// superseded request can be told apart and dropped.
pub struct ChatSession {
    pub messages: Vec<Message>,
    pub status: ChatStatus,
    pub error: Option<String>,
    input: String,
    model: String,
    generation: u64,
    last_submitted: String,
    pending_message_id: Option<String>,
    text_part_id: Option<String>,
}

impl ChatSession {
    pub fn new(model: &str) -> ChatSession {
        return ChatSession {
            messages: vec![],
            status: ChatStatus::Idle,
            error: None,
            input: "".to_string(),
            model: model.to_string(),
            generation: 0,
            last_submitted: "".to_string(),
            pending_message_id: None,
            text_part_id: None,
        };
    }

    pub fn input(&self) -> &str {
        return &self.input;
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn model(&self) -> &str {
        return &self.model;
    }

    pub fn generation(&self) -> u64 {
        return self.generation;
    }

    pub fn select_model(&mut self, id: &str) -> Result<()> {
        if self.status.is_loading() {
            bail!("Can't switch models while a response is streaming");
        }
        if ChatModel::find(id).is_none() {
            bail!(format!("No model named {id} is available"));
        }

        self.model = id.to_string();
        return Ok(());
    }

    /// Turns the input buffer into a user message and returns the request to
    /// send. Empty input or an in-flight request leaves everything untouched.
    pub fn submit(&mut self) -> Option<ChatRequest> {
        if self.input.trim().is_empty() || self.status.is_loading() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.messages.push(Message::new(Role::User, &text));
        self.last_submitted = text;

        tracing::debug!(messages = self.messages.len(), model = %self.model, "Submitting chat");
        return Some(self.begin_request());
    }

    /// Re-issues the last request with the same history, dropping a trailing
    /// assistant message left over from the attempt being retried.
    pub fn regenerate(&mut self) -> Option<ChatRequest> {
        if self.status.is_loading() {
            return None;
        }
        if !self.messages.iter().any(|m| return m.role == Role::User) {
            return None;
        }

        if let Some(last) = self.messages.last() {
            if last.role == Role::Assistant {
                self.messages.pop();
            }
        }

        if self.input == self.last_submitted {
            self.input.clear();
        }

        tracing::debug!(messages = self.messages.len(), model = %self.model, "Regenerating chat");
        return Some(self.begin_request());
    }

    /// Cancels the in-flight request. Returns true when there was one, in which
    /// case the caller must abort the worker. Whatever was streamed so far stays.
    pub fn stop(&mut self) -> bool {
        if !self.status.is_loading() {
            return false;
        }

        self.generation += 1;
        self.status = ChatStatus::Idle;
        self.reset_stream();
        return true;
    }

    pub fn handle_chunk(&mut self, generation: u64, chunk: UIMessageChunk) {
        if generation != self.generation || !self.status.is_loading() {
            return;
        }

        match chunk {
            UIMessageChunk::Start { message_id } => {
                self.pending_message_id = message_id;
                self.ensure_assistant_message();
            }
            UIMessageChunk::TextDelta { id, delta } => {
                self.ensure_assistant_message();
                self.append_delta(&id, &delta);
            }
            UIMessageChunk::Finish | UIMessageChunk::Abort => {
                self.status = ChatStatus::Idle;
                self.reset_stream();
            }
            UIMessageChunk::Error { error_text } => {
                self.fail(&error_text);
            }
            _ => (),
        }
    }

    pub fn handle_failure(&mut self, generation: u64, error_text: &str) {
        if generation != self.generation || !self.status.is_loading() {
            return;
        }

        self.fail(error_text);
    }

    /// The assistant message of the current exchange, if one has started.
    pub fn streaming_message(&self) -> Option<&Message> {
        if let Some(last) = self.messages.last() {
            if last.role == Role::Assistant {
                return Some(last);
            }
        }

        return None;
    }

    fn begin_request(&mut self) -> ChatRequest {
        self.generation += 1;
        self.error = None;
        self.status = ChatStatus::Submitted;
        self.reset_stream();

        return ChatRequest {
            messages: self.messages.clone(),
            model: Some(self.model.clone()),
        };
    }

    fn ensure_assistant_message(&mut self) {
        if self.status == ChatStatus::Streaming {
            return;
        }
        self.status = ChatStatus::Streaming;

        let id = self
            .pending_message_id
            .take()
            .unwrap_or_else(|| return Uuid::new_v4().to_string());

        // A response may continue the trailing assistant message it was sent with.
        if let Some(last) = self.messages.last() {
            if last.role == Role::Assistant && last.id == id {
                return;
            }
        }

        self.messages.push(Message::empty(&id, Role::Assistant));
    }

    fn append_delta(&mut self, part_id: &str, delta: &str) {
        let new_part = self.text_part_id.as_deref() != Some(part_id);
        if let Some(message) = self.messages.last_mut() {
            if new_part {
                message.push_text_part(delta);
            } else {
                message.append(delta);
            }
        }
        self.text_part_id = Some(part_id.to_string());
    }

    fn fail(&mut self, error_text: &str) {
        tracing::error!(error = error_text, "Chat request failed");

        self.status = ChatStatus::Error;
        self.error = Some(error_text.to_string());
        if self.input.trim().is_empty() {
            self.input = self.last_submitted.clone();
        }
        self.reset_stream();
    }

    fn reset_stream(&mut self) {
        self.pending_message_id = None;
        self.text_part_id = None;
    }
}
