use athena_common::error::AthenaError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub struct ApiError(pub AthenaError);

impl From<AthenaError> for ApiError {
    fn from(err: AthenaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AthenaError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AthenaError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AthenaError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AthenaError::Conflict(_) | AthenaError::Ambiguous(_) => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            AthenaError::Upstream(_) => (StatusCode::BAD_GATEWAY, self.0.to_string()),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
