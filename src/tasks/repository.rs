//! Relational persistence for task records.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::Database;

use super::types::{NewTask, Task, TaskError};

/// Storage seam for the write path.
#[async_trait]
pub trait TaskRepository: Send + Sync {
  async fn create(&self, task: NewTask) -> Result<Task, TaskError>;

  /// Returns false when no record had this id.
  async fn delete(&self, id: i64) -> Result<bool, TaskError>;

  async fn get(&self, id: i64) -> Result<Option<Task>, TaskError>;

  /// All records, newest first.
  async fn list(&self) -> Result<Vec<Task>, TaskError>;
}

/// SQLite-backed task repository.
#[derive(Clone)]
pub struct SqliteTaskRepository {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskRepository {
  pub fn new(db: &Database) -> Self {
    Self { conn: db.conn() }
  }

  async fn blocking<T, F>(&self, op: F) -> Result<T, TaskError>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, TaskError> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    tokio::task::spawn_blocking(move || {
      let conn = conn
        .lock()
        .map_err(|e| TaskError::Storage(format!("Lock poisoned: {}", e)))?;
      op(&conn)
    })
    .await
    .map_err(|e| TaskError::Storage(format!("storage task failed: {}", e)))?
  }
}

const TASK_COLUMNS: &str = "id, user_id, description, photo, value, created_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
  let created_at: String = row.get(5)?;
  let created_at = DateTime::parse_from_rfc3339(&created_at)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| {
      rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

  Ok(Task {
    id: row.get(0)?,
    user_id: row.get(1)?,
    description: row.get(2)?,
    photo: row.get(3)?,
    value: row.get(4)?,
    created_at,
  })
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
  async fn create(&self, task: NewTask) -> Result<Task, TaskError> {
    self
      .blocking(move |conn| {
        let created_at = Utc::now();
        conn.execute(
          "INSERT INTO tasks (user_id, description, photo, value, created_at)
           VALUES (?, ?, ?, ?, ?)",
          params![
            task.user_id,
            task.description,
            task.photo,
            task.value,
            created_at.to_rfc3339()
          ],
        )?;

        Ok(Task {
          id: conn.last_insert_rowid(),
          user_id: task.user_id,
          description: task.description,
          photo: task.photo,
          value: task.value,
          created_at,
        })
      })
      .await
  }

  async fn delete(&self, id: i64) -> Result<bool, TaskError> {
    self
      .blocking(move |conn| {
        let removed = conn.execute("DELETE FROM tasks WHERE id = ?", params![id])?;
        Ok(removed > 0)
      })
      .await
  }

  async fn get(&self, id: i64) -> Result<Option<Task>, TaskError> {
    self
      .blocking(move |conn| {
        let task = conn
          .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS),
            params![id],
            task_from_row,
          )
          .optional()?;
        Ok(task)
      })
      .await
  }

  async fn list(&self) -> Result<Vec<Task>, TaskError> {
    self
      .blocking(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM tasks ORDER BY id DESC",
          TASK_COLUMNS
        ))?;
        let tasks = stmt
          .query_map([], task_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
      })
      .await
  }
}
