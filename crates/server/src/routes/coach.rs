//! Routes for the AI coach chat.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use services::services::{
    chat_api::{ChatApiClient, ChatMessage},
    coach_prompt::{CoachContext, build_system_prompt_now},
    rate_limiter::RateLimitDecision,
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

const MAX_TOKENS: u32 = 700;
const TEMPERATURE: f32 = 0.7;
const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please wait a moment before sending more.";

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CoachChatRequest {
    /// Rate limit key
    pub email: String,
    pub context: CoachContext,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct CoachChatResponse {
    pub reply: String,
}

fn rate_limited_response(decision: RateLimitDecision) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        ResponseJson(ApiResponse::error_with_data(decision, RATE_LIMIT_MESSAGE)),
    )
        .into_response()
}

/// Non-streaming chat completion
pub async fn chat(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CoachChatRequest>,
) -> Result<Response, ApiError> {
    let decision = state.limiter.check(&payload.email);
    if !decision.allowed {
        return Ok(rate_limited_response(decision));
    }

    let client = ChatApiClient::from_config(&state.config)?;
    let system = build_system_prompt_now(&payload.context);
    let reply = client
        .complete(&system, &payload.messages, MAX_TOKENS, TEMPERATURE)
        .await?;

    Ok(ResponseJson(ApiResponse::success(CoachChatResponse { reply })).into_response())
}

/// Streaming chat completion; the upstream byte stream is passed through
pub async fn chat_stream(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CoachChatRequest>,
) -> Result<Response, ApiError> {
    let decision = state.limiter.check(&payload.email);
    if !decision.allowed {
        return Ok(rate_limited_response(decision));
    }

    let client = ChatApiClient::from_config(&state.config)?;
    let system = build_system_prompt_now(&payload.context);
    let upstream = client
        .complete_stream(&system, &payload.messages, MAX_TOKENS, TEMPERATURE)
        .await?;

    let body = Body::from_stream(upstream.bytes_stream());
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/coach/chat", post(chat))
        .route("/coach/chat/stream", post(chat_stream))
}
