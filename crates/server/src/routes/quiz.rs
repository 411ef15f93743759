//! Routes for the testosterone quiz: catalog, traversal, and submission.

use axum::{
    Router,
    extract::{Path, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use services::services::{
    quiz_catalog::{self, QuizItem},
    quiz_engine::{AdvanceOutcome, AnswerValue, MemoryProgressStore, QuizEngine},
    scoring::{NormalizedQuizData, ScoreResult, calculate_score},
    submission::{SubmissionMeta, SubmissionRecord, result_query},
};
use std::sync::Arc;
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// Snapshot of a session's traversal position
#[derive(Debug, Clone, Serialize, TS)]
pub struct SessionProgress {
    pub current_index: usize,
    pub total_items: usize,
    pub percent: f64,
    pub answered_count: usize,
    pub can_advance: bool,
    pub current_item: QuizItem,
}

fn progress_of(engine: &QuizEngine<Arc<MemoryProgressStore>>) -> SessionProgress {
    SessionProgress {
        current_index: engine.current_index(),
        total_items: engine.total_items(),
        percent: engine.progress_percent(),
        answered_count: engine.answered_count(),
        can_advance: engine.can_advance(),
        current_item: engine.current_item().clone(),
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct AdvanceResponse {
    pub completed: bool,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<SessionProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,
    /// Result view location carrying score, testosterone, level and name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Get the static quiz catalog
pub async fn get_quiz_items() -> ResponseJson<ApiResponse<Vec<QuizItem>>> {
    ResponseJson(ApiResponse::success(quiz_catalog::quiz_items().to_vec()))
}

/// Get the current progress of a session (restoring it from storage)
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ResponseJson<ApiResponse<SessionProgress>> {
    let engine = QuizEngine::restore(state.progress.clone(), &session_id);
    ResponseJson(ApiResponse::success(progress_of(&engine)))
}

/// Upsert a single answer
pub async fn post_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    axum::Json(payload): axum::Json<SubmitAnswerRequest>,
) -> Result<ResponseJson<ApiResponse<SessionProgress>>, ApiError> {
    let mut engine = QuizEngine::restore(state.progress.clone(), &session_id);
    engine.answer(&payload.question_id, payload.value)?;
    Ok(ResponseJson(ApiResponse::success(progress_of(&engine))))
}

/// Advance one step; the final advance scores the answers, fans the record
/// out to every configured sink best-effort, and returns the result redirect.
pub async fn post_advance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<AdvanceResponse>>, ApiError> {
    let mut engine = QuizEngine::restore(state.progress.clone(), &session_id);

    let response = match engine.advance() {
        AdvanceOutcome::Blocked => AdvanceResponse {
            completed: false,
            blocked: true,
            progress: Some(progress_of(&engine)),
            result: None,
            redirect: None,
        },
        AdvanceOutcome::Moved(_) => AdvanceResponse {
            completed: false,
            blocked: false,
            progress: Some(progress_of(&engine)),
            result: None,
            redirect: None,
        },
        AdvanceOutcome::ReadyToSubmit(answers) => {
            let normalized = NormalizedQuizData::from_answers(&answers);
            let result = calculate_score(&normalized);
            let record = SubmissionRecord::new(
                answers,
                &result,
                SubmissionMeta {
                    source: "quiz".to_string(),
                    user_agent: header_value(&headers, "user-agent"),
                    referrer: header_value(&headers, "referer"),
                },
            );

            info!(
                session_id = %session_id,
                score = result.total_score,
                level = %result.level,
                "quiz completed"
            );
            state.dispatcher.dispatch_all(&record).await;

            let redirect = format!("/results?{}", result_query(&result, &record.first_name));
            AdvanceResponse {
                completed: true,
                blocked: false,
                progress: None,
                result: Some(result),
                redirect: Some(redirect),
            }
        }
    };

    Ok(ResponseJson(ApiResponse::success(response)))
}

/// Step back one item
pub async fn post_back(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ResponseJson<ApiResponse<SessionProgress>> {
    let mut engine = QuizEngine::restore(state.progress.clone(), &session_id);
    engine.retreat();
    ResponseJson(ApiResponse::success(progress_of(&engine)))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quiz/items", get(get_quiz_items))
        .nest(
            "/quiz/sessions/{session_id}",
            Router::new()
                .route("/", get(get_session))
                .route("/answers", post(post_answer))
                .route("/advance", post(post_advance))
                .route("/back", post(post_back)),
        )
}
