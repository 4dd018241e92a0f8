use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// None of the requested seed titles could be resolved
    #[error("None of the input anime could be found: {}", .0.join(", "))]
    NoSeedsFound(Vec<String>),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable code included in error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::NoSeedsFound(_) => "NO_SEEDS_FOUND",
            AppError::ExternalApi(_) | AppError::HttpClient(_) => "UPSTREAM_ERROR",
            AppError::CatalogUnavailable(_) => "CATALOG_UNAVAILABLE",
            AppError::Cache(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::NoSeedsFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalApi(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cache(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "status": "error",
            "error": self.to_string(),
            "error_code": self.error_code(),
        });

        if let AppError::NoSeedsFound(titles) = &self {
            body["input_anime_not_found"] = json!(titles);
        }

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
