use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use shared::models::responses::ErrorResponse;
use shared::services::errors::game_service_errors::GameServiceError;

#[derive(Debug)]
pub enum ApiError {
    GameService(GameServiceError),
}

impl From<GameServiceError> for ApiError {
    fn from(error: GameServiceError) -> Self {
        ApiError::GameService(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::GameService(error) = self;
        let status = match &error {
            GameServiceError::GameNotFound => StatusCode::NOT_FOUND,
            GameServiceError::GameFull
            | GameServiceError::GameInactive
            | GameServiceError::NotYourTurn => StatusCode::CONFLICT,
            GameServiceError::IllegalMove(_) => StatusCode::BAD_REQUEST,
            GameServiceError::StoreConflict => StatusCode::SERVICE_UNAVAILABLE,
            GameServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
        });
        (status, body).into_response()
    }
}
