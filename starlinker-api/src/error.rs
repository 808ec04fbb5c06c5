use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use starlinker_catalog::CatalogError;
use starlinker_order::TrackerError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Tracker(err) => {
                let status = match &err {
                    TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
                    TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
                    TrackerError::Forbidden(_) => StatusCode::FORBIDDEN,
                    TrackerError::InvalidTransition { .. } | TrackerError::Duplicate(_) => {
                        StatusCode::CONFLICT
                    }
                    TrackerError::Dependency(msg) => {
                        tracing::error!("Dependency failure: {}", msg);
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                (status, err.to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Tracker(err.into())
    }
}
