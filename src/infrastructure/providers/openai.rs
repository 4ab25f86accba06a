#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Provider;
use crate::domain::models::ProviderEvent;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderPrompt;
use crate::domain::models::Role;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    delta: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
}

/// OpenAI compatible chat completions API. The default URL points at a hosted
/// AI gateway that routes `vendor/model` ids to the matching vendor.
pub struct OpenAI {
    url: String,
    token: String,
    timeout: String,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI {
            url: Config::get(ConfigKey::OpenAiURL),
            token: Config::get(ConfigKey::OpenAiToken),
            timeout: Config::get(ConfigKey::HealthCheckTimeout),
        };
    }
}

impl OpenAI {
    fn build_request(prompt: ProviderPrompt) -> CompletionRequest {
        let mut messages = vec![MessageRequest {
            role: Role::System.to_string(),
            content: prompt.system,
        }];
        messages.extend(prompt.messages.into_iter().map(|message| {
            return MessageRequest {
                role: message.role.to_string(),
                content: message.content,
            };
        }));

        return CompletionRequest {
            model: prompt.model,
            messages,
            stream: true,
        };
    }
}

#[async_trait]
impl Provider for OpenAI {
    fn name(&self) -> ProviderName {
        return ProviderName::OpenAI;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("OpenAI URL is not defined");
        }
        if self.token.is_empty() {
            bail!("OpenAI token is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if let Err(err) = res {
            tracing::error!(error = ?err, "OpenAI is not reachable");
            bail!("OpenAI is not reachable");
        }

        let status = res?.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "OpenAI health check failed");
            bail!("OpenAI health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion<'a>(
        &self,
        prompt: ProviderPrompt,
        tx: &'a mpsc::UnboundedSender<ProviderEvent>,
    ) -> Result<()> {
        let req = OpenAI::build_request(prompt);

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                body = body,
                "Failed to make completion request to OpenAI"
            );
            bail!(format!(
                "Failed to make completion request to OpenAI, {status}"
            ));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        while let Some(line) = lines_reader.next_line().await? {
            let mut cleaned_line = line.trim().to_string();
            if cleaned_line.starts_with("data:") {
                cleaned_line = cleaned_line.split_off(5).trim().to_string();
            }
            if cleaned_line.is_empty() || cleaned_line.starts_with(':') {
                continue;
            }
            if cleaned_line == "[DONE]" {
                break;
            }

            let ores: CompletionResponse = serde_json::from_str(&cleaned_line)?;
            tracing::debug!(body = ?ores, "Completion response");

            let text = ores
                .choices
                .into_iter()
                .next()
                .and_then(|choice| return choice.delta.content)
                .unwrap_or_default();
            if text.is_empty() {
                continue;
            }

            tx.send(ProviderEvent::Delta(text))?;
        }

        tx.send(ProviderEvent::Done)?;

        return Ok(());
    }
}
