//! Storage for uploaded task artifacts.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::types::{TaskError, Upload};

/// Writes uploads into a directory under content-addressed names.
///
/// The file name is the SHA-256 of the bytes plus the original extension, so
/// re-uploading the same file reuses the same path.
#[derive(Debug, Clone)]
pub struct UploadStore {
  dir: PathBuf,
}

impl UploadStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Persist `upload` and return the stored path.
  pub async fn save(&self, upload: &Upload) -> Result<String, TaskError> {
    if upload.bytes.is_empty() {
      return Err(TaskError::InvalidInput("uploaded file is empty".to_string()));
    }

    let mut name = hex::encode(Sha256::digest(&upload.bytes));
    if let Some(ext) = upload.file_name.as_deref().and_then(extension) {
      name.push('.');
      name.push_str(&ext);
    }

    tokio::fs::create_dir_all(&self.dir)
      .await
      .map_err(|e| TaskError::Upload(format!("{}: {}", self.dir.display(), e)))?;

    let path = self.dir.join(&name);
    tokio::fs::write(&path, &upload.bytes)
      .await
      .map_err(|e| TaskError::Upload(format!("{}: {}", path.display(), e)))?;

    debug!(path = %path.display(), bytes = upload.bytes.len(), "Upload stored");
    Ok(path.to_string_lossy().into_owned())
  }
}

/// Lowercased extension of a client-supplied name, if it looks sane.
fn extension(file_name: &str) -> Option<String> {
  let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
  let valid = !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric());
  valid.then_some(ext)
}
