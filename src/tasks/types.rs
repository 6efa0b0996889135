use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: i64,
  pub user_id: i64,
  pub description: String,
  /// Path of the stored upload
  pub photo: String,
  pub value: i64,
  pub created_at: DateTime<Utc>,
}

/// Fields for a task about to be inserted
#[derive(Debug, Clone)]
pub struct NewTask {
  pub user_id: i64,
  pub description: String,
  pub photo: String,
  pub value: i64,
}

/// An uploaded file as received from the client
#[derive(Debug, Clone, Default)]
pub struct Upload {
  pub file_name: Option<String>,
  pub bytes: Vec<u8>,
}

/// Result of a successful create
#[derive(Debug, Clone, Serialize)]
pub struct TaskCreated {
  pub status: String,
  pub message: String,
  pub task: Task,
}

/// Status/message pair for operations that return no record
#[derive(Debug, Clone, Serialize)]
pub struct TaskMessage {
  pub status: String,
  pub message: String,
}

#[derive(Debug, Error)]
pub enum TaskError {
  #[error("Task {0} not found")]
  NotFound(i64),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Failed to store upload: {0}")]
  Upload(String),

  #[error("Task storage error: {0}")]
  Storage(String),
}

impl TaskError {
  pub fn status_code(&self) -> u16 {
    match self {
      TaskError::NotFound(_) => 404,
      TaskError::InvalidInput(_) => 422,
      TaskError::Upload(_) | TaskError::Storage(_) => 500,
    }
  }
}

impl From<rusqlite::Error> for TaskError {
  fn from(err: rusqlite::Error) -> Self {
    TaskError::Storage(err.to_string())
  }
}
