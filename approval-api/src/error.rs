use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use core_data::models::WorkflowError;
use serde_json::json;
use tracing::{error, warn};

/// Boundary wrapper turning workflow errors into JSON responses.
#[derive(Debug)]
pub struct ApiError(pub WorkflowError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "Request refused");
        }

        let body = match &self.0 {
            WorkflowError::Validation { field, .. } => json!({
                "error": self.0.to_string(),
                "field": field,
            }),
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}
