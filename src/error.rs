use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to fetch content from URL")]
    FetchExhausted,

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::FetchExhausted => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::InvalidInput(_) | AppError::MethodNotAllowed => {
                tracing::debug!(%status, "rejecting request: {}", self)
            }
            AppError::FetchExhausted => tracing::warn!(%status, "{}", self),
            _ => tracing::error!(%status, "request failed: {}", self),
        }

        response::error(status, self.to_string()).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // Request urls can carry the API key as a query parameter.
        AppError::Upstream(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            AppError::InvalidInput("URL is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::FetchExhausted.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Config("GEMINI_API_KEY not configured".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Upstream("quota exceeded".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_are_caller_facing() {
        assert_eq!(AppError::MethodNotAllowed.to_string(), "Method not allowed");
        assert_eq!(
            AppError::FetchExhausted.to_string(),
            "Failed to fetch content from URL"
        );
        assert_eq!(AppError::Upstream("boom".into()).to_string(), "boom");
    }
}
