mod cache;
mod config;
mod db;
mod envelope;
mod logging;
mod source;
mod tasks;
mod web;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use tasks::{SqliteTaskRepository, TaskService, UploadStore};

#[derive(Parser, Debug)]
#[command(name = "playit-tasks")]
#[command(about = "Task catalog service backed by a spreadsheet and a read-through cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./playit.yaml or $XDG_CONFIG_HOME/playit/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Address to bind
  #[arg(long)]
  host: Option<String>,

  /// Port to listen on
  #[arg(short, long)]
  port: Option<u16>,

  /// Spreadsheet to serve the catalog from
  #[arg(short, long)]
  source: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  dotenvy::dotenv().ok();

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line wins over file and environment
  if let Some(host) = args.host {
    config.server.host = host;
  }
  if let Some(port) = args.port {
    config.server.port = port;
  }
  if let Some(source) = args.source {
    config.source.path = source;
  }

  let _log_guard = logging::init(&config.logging)?;
  tracing::info!(
    source = %config.source.path.display(),
    sheet = %config.source.sheet,
    backend = ?config.cache.backend,
    "Starting task service"
  );

  let reader = source::SheetReader::from_config(&config.source);
  if let Err(e) = reader.validate_format() {
    tracing::warn!(error = %e, "Catalog reads will fail until the source is fixed");
  }

  let cache = cache::build_layer(&config.cache)?;
  let database = db::Database::open(&config.database.path)?;
  let repo = Arc::new(SqliteTaskRepository::new(&database));

  let uploads = UploadStore::new(&config.uploads.dir);
  std::fs::create_dir_all(uploads.dir()).map_err(|e| {
    color_eyre::eyre::eyre!(
      "Failed to create upload directory {}: {}",
      uploads.dir().display(),
      e
    )
  })?;

  let service = TaskService::new(cache, &config.cache.key, reader, repo, uploads);

  web::serve(&config.server, service, shutdown_signal()).await
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("Shutting down");
}
