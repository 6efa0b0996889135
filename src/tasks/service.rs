//! Task service: cached catalog reads and the uncached write path.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::cache::{CacheLayer, CacheSource};
use crate::envelope::ResponseEnvelope;
use crate::source::{SheetReader, SourceError};

use super::repository::TaskRepository;
use super::types::{NewTask, Task, TaskCreated, TaskError, TaskMessage, Upload};
use super::uploads::UploadStore;

/// Entry point for every task operation.
///
/// Reads go through the cache layer; writes go straight to the repository
/// and never touch the cache.
#[derive(Clone)]
pub struct TaskService {
  cache: CacheLayer,
  cache_key: String,
  reader: SheetReader,
  repo: Arc<dyn TaskRepository>,
  uploads: UploadStore,
}

impl TaskService {
  pub fn new(
    cache: CacheLayer,
    cache_key: impl Into<String>,
    reader: SheetReader,
    repo: Arc<dyn TaskRepository>,
    uploads: UploadStore,
  ) -> Self {
    Self {
      cache,
      cache_key: cache_key.into(),
      reader,
      repo,
      uploads,
    }
  }

  /// Return the catalog, from cache when possible.
  ///
  /// Fails only when the source workbook cannot be read; cache problems are
  /// absorbed by the cache layer.
  #[instrument(skip(self), fields(key = %self.cache_key))]
  pub async fn get_all_tasks(&self) -> Result<ResponseEnvelope, SourceError> {
    info!("Loading task catalog");

    // Unsupported sources fail before any cache traffic.
    self.reader.validate_format()?;

    let reader = &self.reader;
    let result = self
      .cache
      .read_through(&self.cache_key, || async move {
        info!(
          path = %reader.path().display(),
          sheet = reader.sheet(),
          "Parsing source workbook"
        );
        reader.parse().await.map(|envelope| envelope.data)
      })
      .await?;

    let envelope = match result.source {
      CacheSource::Store => ResponseEnvelope::from_cache(result.data),
      CacheSource::Source => ResponseEnvelope::from_source(result.data),
    };

    info!(rows = envelope.data.len(), details = %envelope.details, "Task catalog returned");
    Ok(envelope)
  }

  /// Store the upload, then persist a new task pointing at it.
  pub async fn create_task(
    &self,
    user_id: i64,
    description: String,
    value: i64,
    upload: Upload,
  ) -> Result<TaskCreated, TaskError> {
    if description.trim().is_empty() {
      return Err(TaskError::InvalidInput("description is required".to_string()));
    }

    let photo = self.uploads.save(&upload).await?;
    let task = self
      .repo
      .create(NewTask {
        user_id,
        description,
        photo,
        value,
      })
      .await?;

    info!(task_id = task.id, user_id, "Task created");
    Ok(TaskCreated {
      status: "success".to_string(),
      message: "Created new task".to_string(),
      task,
    })
  }

  pub async fn delete_task(&self, id: i64) -> Result<TaskMessage, TaskError> {
    if !self.repo.delete(id).await? {
      return Err(TaskError::NotFound(id));
    }

    info!(task_id = id, "Task deleted");
    Ok(TaskMessage {
      status: "success".to_string(),
      message: format!("Task {} deleted", id),
    })
  }

  pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
    self.repo.list().await
  }

  pub async fn get_task(&self, id: i64) -> Result<Task, TaskError> {
    self.repo.get(id).await?.ok_or(TaskError::NotFound(id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::testing::{FailingStore, RecordingStore};
  use crate::cache::{CacheLookup, CacheStore, MemoryStore};
  use crate::db::Database;
  use crate::envelope::{DETAILS_FROM_CACHE, DETAILS_FROM_SOURCE};
  use crate::source::fixtures::{write_workbook, Cell};
  use crate::tasks::SqliteTaskRepository;
  use serde_json::json;
  use std::path::Path;
  use std::time::Duration;
  use tempfile::TempDir;

  const SHEET: &str = "Персонажи";
  const KEY: &str = "tasks:all";

  fn example_workbook(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("PlayIT.xlsx");
    write_workbook(
      &path,
      &[(
        SHEET,
        vec![
          vec![Cell::text("name"), Cell::text("price")],
          vec![Cell::text("A"), Cell::number(10.0)],
          vec![Cell::text("B"), Cell::number(20.0)],
          vec![Cell::text("C"), Cell::number(30.0)],
        ],
      )],
    );
    path
  }

  fn service(store: Arc<dyn CacheStore>, source: &Path, dir: &TempDir) -> TaskService {
    let repo = SqliteTaskRepository::new(&Database::open_in_memory().unwrap());
    TaskService::new(
      CacheLayer::new(store, Duration::from_secs(21600)),
      KEY,
      SheetReader::new(source, SHEET),
      Arc::new(repo),
      UploadStore::new(dir.path().join("uploads")),
    )
  }

  fn example_rows() -> serde_json::Value {
    json!([
      {"name": "A", "price": 10},
      {"name": "B", "price": 20},
      {"name": "C", "price": 30},
    ])
  }

  #[tokio::test]
  async fn test_cold_then_warm_read() {
    let dir = tempfile::tempdir().unwrap();
    let source = example_workbook(&dir);
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone(), &source, &dir);

    let cold = service.get_all_tasks().await.unwrap();
    assert_eq!(cold.status, 200);
    assert_eq!(cold.details, DETAILS_FROM_SOURCE);
    assert_eq!(serde_json::to_value(&cold.data).unwrap(), example_rows());

    // The source is gone, so a second answer can only come from the cache.
    std::fs::remove_file(&source).unwrap();

    let warm = service.get_all_tasks().await.unwrap();
    assert_eq!(warm.details, DETAILS_FROM_CACHE);
    assert_eq!(
      serde_json::to_vec(&warm.data).unwrap(),
      serde_json::to_vec(&cold.data).unwrap()
    );
  }

  #[tokio::test]
  async fn test_cache_holds_payload_only() {
    let dir = tempfile::tempdir().unwrap();
    let source = example_workbook(&dir);
    let store = Arc::new(RecordingStore::new());
    let service = service(store.clone(), &source, &dir);

    service.get_all_tasks().await.unwrap();

    let cached: serde_json::Value = serde_json::from_slice(&store.value(KEY).unwrap()).unwrap();
    assert_eq!(cached, example_rows());
  }

  #[tokio::test]
  async fn test_corrupted_cache_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let source = example_workbook(&dir);
    let store = Arc::new(RecordingStore::new());
    store.seed(KEY, b"\xff\xfe not json");
    let service = service(store.clone(), &source, &dir);

    let envelope = service.get_all_tasks().await.unwrap();

    assert_eq!(store.deletes(), 1);
    assert_eq!(envelope.details, DETAILS_FROM_SOURCE);
    assert_eq!(serde_json::to_value(&envelope.data).unwrap(), example_rows());

    let fresh: serde_json::Value = serde_json::from_slice(&store.value(KEY).unwrap()).unwrap();
    assert_eq!(fresh, example_rows());
  }

  #[tokio::test]
  async fn test_unreachable_cache_still_serves_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = example_workbook(&dir);
    let service = service(Arc::new(FailingStore::new()), &source, &dir);

    let envelope = service.get_all_tasks().await.unwrap();

    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.details, DETAILS_FROM_SOURCE);
    assert_eq!(envelope.data.len(), 3);
  }

  #[tokio::test]
  async fn test_unsupported_format_skips_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::new());
    store.seed(KEY, br#"[{"name":"A"}]"#);
    let service = service(store.clone(), &dir.path().join("PlayIT.csv"), &dir);

    let err = service.get_all_tasks().await.unwrap_err();

    assert!(matches!(err, SourceError::UnsupportedFormat(_)));
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn test_missing_sheet_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("PlayIT.xlsx");
    write_workbook(
      &path,
      &[("Other", vec![vec![Cell::text("name")], vec![Cell::text("A")]])],
    );
    let store = Arc::new(RecordingStore::new());
    let service = service(store.clone(), &path, &dir);

    let err = service.get_all_tasks().await.unwrap_err();

    assert!(matches!(err, SourceError::SheetNotFound(_)));
    assert_eq!(store.sets(), 0);
    assert_eq!(store.get(KEY).await.unwrap(), CacheLookup::Miss);
  }

  #[tokio::test]
  async fn test_blank_sheet_is_malformed_and_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("PlayIT.xlsx");
    write_workbook(&path, &[(SHEET, vec![vec![Cell::text("name")], vec![Cell::Error]])]);
    let store = Arc::new(RecordingStore::new());
    let service = service(store.clone(), &path, &dir);

    let err = service.get_all_tasks().await.unwrap_err();

    assert!(matches!(err, SourceError::MalformedData(_)));
    assert_eq!(store.sets(), 0);
  }

  #[tokio::test]
  async fn test_create_and_delete_task_leave_cache_alone() {
    let dir = tempfile::tempdir().unwrap();
    let source = example_workbook(&dir);
    let store = Arc::new(RecordingStore::new());
    let service = service(store.clone(), &source, &dir);

    let created = service
      .create_task(
        3,
        "Sketch the hero".to_string(),
        100,
        Upload {
          file_name: Some("hero.png".to_string()),
          bytes: b"png-bytes".to_vec(),
        },
      )
      .await
      .unwrap();

    assert_eq!(created.status, "success");
    assert_eq!(created.task.user_id, 3);
    assert!(created.task.photo.ends_with(".png"));
    assert_eq!(service.list_tasks().await.unwrap().len(), 1);

    let deleted = service.delete_task(created.task.id).await.unwrap();
    assert_eq!(deleted.message, format!("Task {} deleted", created.task.id));
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn test_delete_unknown_task() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(MemoryStore::new()), &dir.path().join("x.xlsx"), &dir);

    let err = service.delete_task(42).await.unwrap_err();
    assert!(matches!(err, TaskError::NotFound(42)));
  }

  #[tokio::test]
  async fn test_create_task_requires_description() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(MemoryStore::new()), &dir.path().join("x.xlsx"), &dir);

    let err = service
      .create_task(1, "  ".to_string(), 1, Upload::default())
      .await
      .unwrap_err();
    assert!(matches!(err, TaskError::InvalidInput(_)));
  }
}
