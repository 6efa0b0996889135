use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Process-wide settings, loaded once at startup and passed by reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub server: ServerConfig,
  pub cache: CacheConfig,
  pub source: SourceConfig,
  pub database: DatabaseConfig,
  pub uploads: UploadsConfig,
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  /// Prefix for every route (e.g. "/playit/tasks"); empty serves at the root
  pub base_path: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".to_string(),
      port: 8001,
      base_path: String::new(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  #[default]
  Redis,
  Sqlite,
  Memory,
  /// Every read misses, every write is discarded
  Disabled,
}

impl CacheBackend {
  fn parse(value: &str) -> Option<Self> {
    match value.trim().to_lowercase().as_str() {
      "redis" => Some(Self::Redis),
      "sqlite" => Some(Self::Sqlite),
      "memory" => Some(Self::Memory),
      "disabled" | "none" | "off" => Some(Self::Disabled),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend: CacheBackend,
  pub host: String,
  pub port: u16,
  pub db: i64,
  /// The single key holding the catalog payload
  pub key: String,
  pub ttl_secs: u64,
  /// Upper bound for each Redis round trip
  pub timeout_ms: u64,
  /// Database file for the sqlite backend
  pub sqlite_path: PathBuf,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackend::Redis,
      host: "localhost".to_string(),
      port: 6379,
      db: 0,
      key: "tasks:all".to_string(),
      ttl_secs: 21600,
      timeout_ms: 2000,
      sqlite_path: PathBuf::from("cache.db"),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
  pub path: PathBuf,
  pub sheet: String,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("PlayIT.xlsx"),
      sheet: "Персонажи".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  pub path: PathBuf,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("playit.db"),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
  pub dir: PathBuf,
}

impl Default for UploadsConfig {
  fn default() -> Self {
    Self {
      dir: PathBuf::from("uploads/images"),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// One of trace, debug, info, warn, error
  pub level: String,
  /// Directory for daily-rotated log files; stdout only when unset
  pub dir: Option<PathBuf>,
  /// Emit JSON lines instead of human-readable output
  pub json: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
      json: false,
    }
  }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Lowercase a level name, accepting `warning` and `critical` as aliases.
fn normalize_level(level: &str) -> String {
  match level.trim().to_lowercase().as_str() {
    "warning" => "warn".to_string(),
    "critical" | "fatal" => "error".to_string(),
    other => other.to_string(),
  }
}

impl Config {
  /// Load configuration from file and environment.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./playit.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/playit/config.yaml
  /// 4. Built-in defaults
  ///
  /// Environment variables (after loading `.env`) override file values.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.logging.level = normalize_level(&config.logging.level);

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("playit.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("playit").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Apply environment overrides using `lookup` to read variables.
  fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = lookup("APP_HOST") {
      self.server.host = v;
    }
    if let Some(v) = lookup("APP_PORT") {
      self.server.port = parse_var("APP_PORT", &v)?;
    }
    if let Some(v) = lookup("CACHE_BACKEND") {
      self.cache.backend =
        CacheBackend::parse(&v).ok_or_else(|| eyre!("Invalid CACHE_BACKEND: {}", v))?;
    }
    if let Some(v) = lookup("REDIS_HOST") {
      self.cache.host = v;
    }
    if let Some(v) = lookup("REDIS_PORT") {
      self.cache.port = parse_var("REDIS_PORT", &v)?;
    }
    if let Some(v) = lookup("REDIS_DB") {
      self.cache.db = parse_var("REDIS_DB", &v)?;
    }
    if let Some(v) = lookup("CACHE_KEY") {
      self.cache.key = v;
    }
    if let Some(v) = lookup("CACHE_EXPIRE") {
      self.cache.ttl_secs = parse_var("CACHE_EXPIRE", &v)?;
    }
    if let Some(v) = lookup("SOURCE_PATH") {
      self.source.path = PathBuf::from(v);
    }
    if let Some(v) = lookup("SOURCE_SHEET") {
      self.source.sheet = v;
    }
    if let Some(v) = lookup("DATABASE_PATH") {
      self.database.path = PathBuf::from(v);
    }
    if let Some(v) = lookup("UPLOAD_DIR") {
      self.uploads.dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("LOG_LEVEL") {
      self.logging.level = normalize_level(&v);
    }
    if let Some(v) = lookup("LOG_DIR") {
      self.logging.dir = Some(PathBuf::from(v));
    }
    Ok(())
  }

  /// Reject settings the service cannot run with.
  pub fn validate(&self) -> Result<()> {
    if self.cache.key.trim().is_empty() {
      return Err(eyre!("Cache key cannot be empty"));
    }
    if self.cache.ttl_secs == 0 {
      return Err(eyre!("Cache TTL must be at least one second"));
    }
    if self.source.sheet.trim().is_empty() {
      return Err(eyre!("Source sheet name cannot be empty"));
    }
    if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
      return Err(eyre!(
        "Invalid log level: {}. Must be one of: {}",
        self.logging.level,
        LOG_LEVELS.join(", ")
      ));
    }
    if !self.server.base_path.is_empty() && !self.server.base_path.starts_with('/') {
      return Err(eyre!(
        "Base path must start with '/': {}",
        self.server.base_path
      ));
    }
    Ok(())
  }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  value
    .trim()
    .parse()
    .map_err(|e| eyre!("Invalid value for {}: {} ({})", name, value, e))
}
