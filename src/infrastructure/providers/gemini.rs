#[cfg(test)]
#[path = "gemini_test.rs"]
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
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    role: String,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

pub struct Gemini {
    url: String,
    token: String,
    timeout: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            timeout: Config::get(ConfigKey::HealthCheckTimeout),
        };
    }
}

impl Gemini {
    /// Gateway style ids carry a vendor prefix that the Gemini API does not know.
    fn model_name(model: &str) -> &str {
        return model.strip_prefix("google/").unwrap_or(model);
    }

    /// Gemini only takes system text through `systemInstruction`, so system
    /// messages from the history are appended there instead of sent as turns.
    fn build_request(prompt: ProviderPrompt) -> CompletionRequest {
        let mut system_parts = vec![ContentPart {
            text: prompt.system,
        }];
        let mut contents = vec![];

        for message in prompt.messages {
            let role = match message.role {
                Role::System => {
                    system_parts.push(ContentPart {
                        text: message.content,
                    });
                    continue;
                }
                Role::Assistant => "model",
                Role::User => "user",
            };

            contents.push(Content {
                role: role.to_string(),
                parts: vec![ContentPart {
                    text: message.content,
                }],
            });
        }

        return CompletionRequest {
            system_instruction: Content {
                role: "".to_string(),
                parts: system_parts,
            },
            contents,
        };
    }
}

#[async_trait]
impl Provider for Gemini {
    fn name(&self) -> ProviderName {
        return ProviderName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Gemini URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Gemini token is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!(
                "{url}/v1beta/models?key={key}",
                url = self.url,
                key = self.token
            ))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if let Err(err) = res {
            tracing::error!(error = ?err, "Gemini is not reachable");
            bail!("Gemini is not reachable");
        }

        let status = res?.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Gemini health check failed");
            bail!("Gemini health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion<'a>(
        &self,
        prompt: ProviderPrompt,
        tx: &'a mpsc::UnboundedSender<ProviderEvent>,
    ) -> Result<()> {
        let model = Gemini::model_name(&prompt.model).to_string();
        let req = Gemini::build_request(prompt);

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:streamGenerateContent?alt=sse&key={key}",
                url = self.url,
                key = self.token,
            ))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                body = body,
                "Failed to make completion request to Gemini"
            );
            bail!(format!(
                "Failed to make completion request to Gemini, {status}"
            ));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        while let Some(line) = lines_reader.next_line().await? {
            let cleaned_line = line.trim();
            let Some(payload) = cleaned_line.strip_prefix("data:") else {
                continue;
            };

            let ores: GenerateContentResponse = serde_json::from_str(payload.trim())?;
            let text = ores
                .candidates
                .into_iter()
                .flat_map(|candidate| return candidate.content.parts)
                .map(|part| return part.text)
                .collect::<String>();

            if text.is_empty() {
                continue;
            }

            tx.send(ProviderEvent::Delta(text))?;
        }

        tx.send(ProviderEvent::Done)?;

        return Ok(());
    }
}
