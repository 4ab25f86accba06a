#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;

use std::str::FromStr;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;
use tokio::sync::mpsc;

use super::Message;
use super::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderName {
    OpenAI,
    Gemini,
}

impl ProviderName {
    pub fn parse(text: &str) -> Result<ProviderName> {
        return ProviderName::from_str(text).map_err(|_| {
            return anyhow!("No provider named {text}");
        });
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: String,
}

/// What a provider is asked to complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderPrompt {
    pub model: String,
    pub system: String,
    pub messages: Vec<ProviderMessage>,
}

impl ProviderPrompt {
    /// Flattens chat messages into provider messages. Text parts are joined in
    /// order, messages without any text are dropped.
    pub fn from_messages(model: &str, system: &str, messages: &[Message]) -> ProviderPrompt {
        let messages = messages
            .iter()
            .filter_map(|message| {
                let content = message.text();
                if content.is_empty() {
                    return None;
                }

                return Some(ProviderMessage {
                    role: message.role,
                    content,
                });
            })
            .collect();

        return ProviderPrompt {
            model: model.to_string(),
            system: system.to_string(),
            messages,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    Delta(String),
    Done,
    Failed(String),
    TimedOut,
}

#[async_trait]
pub trait Provider {
    fn name(&self) -> ProviderName;

    /// Used at startup to verify credentials and reachability of the provider.
    async fn health_check(&self) -> Result<()>;

    /// Requests a streamed completion. Each token is sent as
    /// `ProviderEvent::Delta` as soon as it arrives, followed by a single
    /// `ProviderEvent::Done` once the provider closes the stream.
    ///
    /// Errors are returned rather than sent; the caller decides how a failure
    /// reaches the client.
    async fn get_completion<'a>(
        &self,
        prompt: ProviderPrompt,
        tx: &'a mpsc::UnboundedSender<ProviderEvent>,
    ) -> Result<()>;
}

pub type ProviderBox = Box<dyn Provider + Send + Sync>;
