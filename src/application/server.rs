#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatModel;
use crate::domain::models::ChatRequest;
use crate::domain::models::Message;
use crate::domain::models::Provider;
use crate::domain::models::ProviderEvent;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderPrompt;
use crate::domain::models::Role;
use crate::domain::models::UI_MESSAGE_STREAM_HEADER;
use crate::domain::models::UI_MESSAGE_STREAM_VERSION;
use crate::domain::services::StreamEncoder;
use crate::infrastructure::providers::ProviderManager;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful, premium AI assistant. Respond with clear, concise, and helpful answers.";

type SharedProvider = Arc<dyn Provider + Send + Sync>;

#[derive(Clone)]
pub struct RelayState {
    pub provider: SharedProvider,
    pub default_model: String,
    pub max_duration: Duration,
    pub validate_model: bool,
}

impl RelayState {
    pub fn from_config(provider: SharedProvider) -> Result<RelayState> {
        return Ok(RelayState {
            provider,
            default_model: Config::get(ConfigKey::Model),
            max_duration: Duration::from_secs(Config::get_u64(ConfigKey::MaxDuration)?),
            validate_model: Config::get_bool(ConfigKey::ValidateModel),
        });
    }
}

pub fn router(state: RelayState) -> Router {
    return Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .with_state(state);
}

pub async fn start() -> Result<()> {
    let provider = ProviderManager::get(ProviderName::parse(&Config::get(ConfigKey::Provider))?);
    let provider_name = provider.name();
    if let Err(err) = provider.health_check().await {
        tracing::warn!(provider = %provider_name, error = %err, "Provider health check failed");
    }

    let state = RelayState::from_config(Arc::from(provider))?;
    let listen = Config::get(ConfigKey::Listen);
    let listener = TcpListener::bind(&listen).await?;

    tracing::info!(
        listen = listen,
        provider = %provider_name,
        model = state.default_model,
        "Relay listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    return Ok(());
}

#[allow(clippy::implicit_return)]
async fn health_check() -> &'static str {
    return "OK";
}

/// The response continues a trailing assistant message, otherwise it starts a
/// new one.
fn response_message_id(messages: &[Message]) -> String {
    if let Some(last) = messages.last() {
        if last.role == Role::Assistant {
            return last.id.to_string();
        }
    }

    return Uuid::new_v4().to_string();
}

/// Runs one provider completion into `tx`, bounded by `max_duration`. Stops
/// early once the response body is dropped.
async fn produce(
    provider: SharedProvider,
    prompt: ProviderPrompt,
    max_duration: Duration,
    tx: mpsc::UnboundedSender<ProviderEvent>,
) {
    let completion = tokio::time::timeout(max_duration, provider.get_completion(prompt, &tx));

    let res = tokio::select! {
        res = completion => res,
        _ = tx.closed() => {
            tracing::debug!("Client went away, dropping provider call");
            return;
        }
    };

    let event = match res {
        Ok(Ok(())) => return,
        Ok(Err(err)) => {
            tracing::error!(error = ?err, "Provider completion failed");
            ProviderEvent::Failed(err.to_string())
        }
        Err(_) => {
            tracing::warn!(
                max_duration = max_duration.as_secs(),
                "Provider completion timed out"
            );
            ProviderEvent::TimedOut
        }
    };

    // The receiver may already be gone.
    let _ = tx.send(event);
}

#[allow(clippy::implicit_return)]
async fn chat(
    State(state): State<RelayState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, (StatusCode, String)> {
    let model = request
        .model
        .clone()
        .unwrap_or_else(|| return state.default_model.clone());

    if state.validate_model && ChatModel::find(&model).is_none() {
        tracing::warn!(model = model, "Rejected unknown model");
        return Err((StatusCode::BAD_REQUEST, format!("Unknown model {model}")));
    }

    let message_id = response_message_id(&request.messages);
    let prompt = ProviderPrompt::from_messages(&model, SYSTEM_PROMPT, &request.messages);
    tracing::debug!(
        model = model,
        message_id = message_id,
        messages = prompt.messages.len(),
        "Relaying chat request"
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<ProviderEvent>();
    tokio::spawn(produce(
        state.provider.clone(),
        prompt,
        state.max_duration,
        tx,
    ));

    // Nothing has been sent to the client yet, so failures here can still be
    // reported through the status code.
    let first = match rx.recv().await {
        Some(ProviderEvent::Failed(err)) => return Err((StatusCode::BAD_GATEWAY, err)),
        Some(ProviderEvent::TimedOut) => {
            return Err((
                StatusCode::GATEWAY_TIMEOUT,
                "The response took too long and was stopped.".to_string(),
            ));
        }
        Some(event) => event,
        None => {
            return Err((
                StatusCode::BAD_GATEWAY,
                "The provider stream ended unexpectedly.".to_string(),
            ));
        }
    };

    let encoder = StreamEncoder::new(&message_id);
    let stream = futures::stream::unfold(
        (rx, encoder, Some(first)),
        |(mut rx, mut encoder, pending)| async move {
            if encoder.is_finished() {
                return None;
            }

            let event = match pending {
                Some(event) => Some(event),
                None => rx.recv().await,
            };
            let frame = encoder.encode(event);

            return Some((frame, (rx, encoder, None)));
        },
    );

    let headers = [
        (header::CONTENT_TYPE, "text/event-stream"),
        (header::CACHE_CONTROL, "no-cache"),
        (
            HeaderName::from_static(UI_MESSAGE_STREAM_HEADER),
            UI_MESSAGE_STREAM_VERSION,
        ),
    ];

    return Ok((headers, Body::from_stream(stream)).into_response());
}
