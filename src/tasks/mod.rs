//! Task operations: the cached catalog read and the task record write path.

mod cache;
mod repository;
mod service;
mod types;
mod uploads;

pub use repository::SqliteTaskRepository;
pub use service::TaskService;
pub use types::{Task, TaskCreated, TaskError, TaskMessage, Upload};
pub use uploads::UploadStore;
