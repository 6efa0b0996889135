use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::envelope::ResponseEnvelope;
use crate::source::SourceError;
use crate::tasks::TaskError;

/// Error body for write-path failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub status: String,
  pub message: String,
}

/// Failures surfaced by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
  /// Catalog read failed; rendered as an error envelope
  Source(SourceError),
  Task(TaskError),
}

impl From<SourceError> for ApiError {
  fn from(err: SourceError) -> Self {
    ApiError::Source(err)
  }
}

impl From<TaskError> for ApiError {
  fn from(err: TaskError) -> Self {
    ApiError::Task(err)
  }
}

fn status(code: u16) -> StatusCode {
  StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Source(err) => {
        tracing::warn!(error = %err, "Catalog read failed");
        let envelope = ResponseEnvelope::from_error(&err);
        (status(envelope.status), Json(envelope)).into_response()
      }
      ApiError::Task(err) => {
        tracing::warn!(error = %err, "Task operation failed");
        (
          status(err.status_code()),
          Json(ErrorResponse {
            status: "error".to_string(),
            message: err.to_string(),
          }),
        )
          .into_response()
      }
    }
  }
}
