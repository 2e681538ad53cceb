use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::db::DbError;

/// Errors a handler can return. The body is `{"detail": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// 404
    NotFound(&'static str),
    /// 400, duplicate email
    Conflict(&'static str),
    /// 500, logged
    Database(DbError),
    /// 500, logged
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            Self::Conflict(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::Database(e) => {
                error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::Internal(message) => {
                error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

/// Map `DbError::NotFound` to a 404 with `detail`, pass everything else through.
pub fn not_found(detail: &'static str) -> impl FnOnce(DbError) -> ApiError {
    move |e| match e {
        DbError::NotFound(_) => ApiError::NotFound(detail),
        _ => ApiError::Database(e),
    }
}
