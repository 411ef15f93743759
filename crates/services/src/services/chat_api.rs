//! Chat completion client for the coach, with ordered model fallback.
//!
//! The free-tier backends behind the chat endpoint are individually
//! unreliable, so every request walks a fixed priority list of models and
//! returns the first success. The policy is defined once in
//! [`try_in_order`] and shared by the streaming and non-streaming paths.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use ts_rs::TS;

use super::config::Config;

/// Fixed priority order; each call restarts from the top
pub const MODEL_FALLBACK_ORDER: [&str; 8] = [
    "meta-llama/llama-3.3-70b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "deepseek/deepseek-chat:free",
    "qwen/qwen-2.5-72b-instruct:free",
    "mistralai/mistral-nemo:free",
    "meta-llama/llama-3.1-8b-instruct:free",
    "google/gemma-2-9b-it:free",
    "microsoft/phi-3-medium-128k-instruct:free",
];

/// User-facing message shown when the whole fallback list is exhausted
pub const ALL_MODELS_BUSY_MESSAGE: &str =
    "All coaching models are temporarily busy. Please try again in a minute.";

#[derive(Debug, Error)]
pub enum ChatApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: OPENROUTER_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("all models exhausted: {last}")]
    AllModelsBusy { last: Box<ChatApiError> },
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Response from the chat completions endpoint (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}

/// Outcome of a single model attempt
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// Stop here and return this value
    Success(T),
    /// Record the error and fall through to the next model
    Retry(ChatApiError),
}

/// Walk the model list in order, returning the first success. Rate limits,
/// other HTTP errors and transport errors all fall through identically; the
/// same model is never attempted twice within one call. Exhaustion yields a
/// single terminal error carrying the last recorded failure.
pub async fn try_in_order<T, F, Fut>(
    models: &[&'static str],
    mut attempt: F,
) -> Result<T, ChatApiError>
where
    F: FnMut(&'static str) -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    let mut last: Option<ChatApiError> = None;
    for &model in models {
        match attempt(model).await {
            AttemptOutcome::Success(value) => return Ok(value),
            AttemptOutcome::Retry(e) => {
                warn!(model, error = %e, "model attempt failed, trying next");
                last = Some(e);
            }
        }
    }
    Err(ChatApiError::AllModelsBusy {
        last: Box::new(last.unwrap_or_else(|| {
            ChatApiError::Transport("no models configured".to_string())
        })),
    })
}

/// Chat completions client
#[derive(Debug, Clone)]
pub struct ChatApiClient {
    http: Client,
    api_url: String,
    api_key: String,
    referer: String,
    title: String,
}

impl ChatApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn from_config(config: &Config) -> Result<Self, ChatApiError> {
        let api_key = config
            .chat_api_key
            .clone()
            .ok_or(ChatApiError::MissingApiKey)?;
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.chat_api_url.clone(),
            api_key,
            referer: config.app_url.clone(),
            title: config.app_name.clone(),
        })
    }

    /// Non-streaming completion: first successful model's message content
    pub async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatApiError> {
        let messages = with_system(system, history);
        try_in_order(&MODEL_FALLBACK_ORDER, |model| {
            let request = ChatRequest {
                model: model.to_string(),
                messages: messages.clone(),
                stream: false,
                max_tokens,
                temperature,
            };
            async move {
                let response = match self.send(&request).await {
                    Ok(response) => response,
                    Err(e) => return AttemptOutcome::Retry(e),
                };
                match response.json::<ChatResponse>().await {
                    Ok(parsed) => match parsed.text() {
                        Some(content) => AttemptOutcome::Success(content.to_string()),
                        None => AttemptOutcome::Retry(ChatApiError::Serde(
                            "no choices in response".to_string(),
                        )),
                    },
                    Err(e) => AttemptOutcome::Retry(ChatApiError::Serde(e.to_string())),
                }
            }
        })
        .await
    }

    /// Streaming completion: the first model whose response is ok hands its
    /// raw byte stream through untouched
    pub async fn complete_stream(
        &self,
        system: &str,
        history: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<reqwest::Response, ChatApiError> {
        let messages = with_system(system, history);
        try_in_order(&MODEL_FALLBACK_ORDER, |model| {
            let request = ChatRequest {
                model: model.to_string(),
                messages: messages.clone(),
                stream: true,
                max_tokens,
                temperature,
            };
            async move {
                match self.send(&request).await {
                    Ok(response) => AttemptOutcome::Success(response),
                    Err(e) => AttemptOutcome::Retry(e),
                }
            }
        })
        .await
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, ChatApiError> {
        let res = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(res),
            StatusCode::TOO_MANY_REQUESTS => Err(ChatApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ChatApiError::Http { status, body })
            }
        }
    }
}

fn with_system(system: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system));
    messages.extend_from_slice(history);
    messages
}

fn map_reqwest_error(e: reqwest::Error) -> ChatApiError {
    if e.is_timeout() {
        ChatApiError::Timeout
    } else {
        ChatApiError::Transport(e.to_string())
    }
}
