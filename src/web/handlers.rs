use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::envelope::ResponseEnvelope;
use crate::tasks::{Task, TaskCreated, TaskError, TaskMessage, Upload};

use super::error::ApiError;
use super::AppState;

pub async fn health_check() -> &'static str {
  "OK"
}

pub async fn get_all_tasks(
  State(state): State<Arc<AppState>>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
  Ok(Json(state.service.get_all_tasks().await?))
}

/// Multipart fields: `user_id`, `description`, `value`, `file`.
pub async fn create_task(
  State(state): State<Arc<AppState>>,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<TaskCreated>), ApiError> {
  let mut user_id = None;
  let mut description = None;
  let mut value = None;
  let mut upload = None;

  while let Some(field) = multipart.next_field().await.map_err(invalid)? {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "user_id" => user_id = Some(parse_int(&name, &field.text().await.map_err(invalid)?)?),
      "value" => value = Some(parse_int(&name, &field.text().await.map_err(invalid)?)?),
      "description" => description = Some(field.text().await.map_err(invalid)?),
      "file" => {
        let file_name = field.file_name().map(String::from);
        let bytes = field.bytes().await.map_err(invalid)?;
        upload = Some(Upload {
          file_name,
          bytes: bytes.to_vec(),
        });
      }
      _ => {}
    }
  }

  let created = state
    .service
    .create_task(
      user_id.ok_or_else(|| missing("user_id"))?,
      description.ok_or_else(|| missing("description"))?,
      value.ok_or_else(|| missing("value"))?,
      upload.ok_or_else(|| missing("file"))?,
    )
    .await?;

  Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_task(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
) -> Result<Json<TaskMessage>, ApiError> {
  Ok(Json(state.service.delete_task(id).await?))
}

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Task>>, ApiError> {
  Ok(Json(state.service.list_tasks().await?))
}

pub async fn get_task(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
  Ok(Json(state.service.get_task(id).await?))
}

fn invalid(err: impl std::fmt::Display) -> TaskError {
  TaskError::InvalidInput(err.to_string())
}

fn missing(field: &str) -> TaskError {
  TaskError::InvalidInput(format!("missing field '{}'", field))
}

fn parse_int(field: &str, raw: &str) -> Result<i64, TaskError> {
  raw
    .trim()
    .parse()
    .map_err(|_| TaskError::InvalidInput(format!("field '{}' must be an integer", field)))
}
