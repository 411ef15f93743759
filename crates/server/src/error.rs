//! API error type mapping service failures onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    chat_api::{ALL_MODELS_BUSY_MESSAGE, ChatApiError},
    quiz_engine::QuizError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    ChatApi(#[from] ChatApiError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::ChatApi(ChatApiError::AllModelsBusy { .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ALL_MODELS_BUSY_MESSAGE.to_string(),
            ),
            ApiError::ChatApi(ChatApiError::MissingApiKey) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::ChatApi(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            ApiError::Quiz(QuizError::UnknownQuestion(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
