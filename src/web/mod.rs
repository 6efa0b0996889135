//! HTTP surface for the task service.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;
use color_eyre::{eyre::eyre, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::tasks::TaskService;

/// Largest accepted request body (multipart uploads included).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for handlers.
pub struct AppState {
  pub service: TaskService,
}

/// Build the router, nested under `base_path` when one is set.
pub fn router(service: TaskService, base_path: &str) -> Router {
  let state = Arc::new(AppState { service });

  let routes = Router::new()
    .route(
      "/tasks",
      get(handlers::get_all_tasks).post(handlers::create_task),
    )
    .route("/tasks/{id}", delete(handlers::delete_task))
    .route("/tasks/records", get(handlers::list_tasks))
    .route("/tasks/records/{id}", get(handlers::get_task))
    .route("/health", get(handlers::health_check))
    .with_state(state)
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .layer(TraceLayer::new_for_http());

  match base_path.trim_end_matches('/') {
    "" => routes,
    prefix => Router::new().nest(prefix, routes),
  }
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: &ServerConfig, service: TaskService, shutdown: F) -> Result<()>
where
  F: std::future::Future<Output = ()> + Send + 'static,
{
  let addr: SocketAddr = format!("{}:{}", config.host, config.port)
    .parse()
    .map_err(|e| eyre!("Invalid listen address {}:{}: {}", config.host, config.port, e))?;

  let app = router(service, &config.base_path);
  let listener = TcpListener::bind(addr)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;

  tracing::info!(%addr, base_path = %config.base_path, "Task service listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| eyre!("Server error: {}", e))?;

  Ok(())
}
