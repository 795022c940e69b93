//! Runtime configuration, deserialised from `config.toml` overlaid with
//! `CLINIC_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `CLINIC_CHAT__API_KEY` sets `chat.api_key`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Upper bound on `session_ttl_hours`: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

const GEMINI_URL: &str =
  "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub upload_dir:         PathBuf,
  /// Cap on any request body, which bounds document uploads.
  pub max_upload_bytes:   usize,
  /// `1..=MAX_SESSION_TTL_HOURS`.
  pub session_ttl_hours:  i64,
  /// `0` disables the background sweep; expired sessions are still rejected
  /// on lookup.
  pub session_sweep_secs: u64,
  pub chat:               ChatConfig,
  pub predictor:          PredictorConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".into(),
      port:               8080,
      store_path:         PathBuf::from("clinic.db"),
      upload_dir:         PathBuf::from("uploads"),
      max_upload_bytes:   16 * 1024 * 1024,
      session_ttl_hours:  24,
      session_sweep_secs: 600,
      chat:               ChatConfig::default(),
      predictor:          PredictorConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
  pub api_url:      String,
  /// Without a key only greetings are answered.
  pub api_key:      Option<String>,
  pub timeout_secs: u64,
}

impl Default for ChatConfig {
  fn default() -> Self {
    Self { api_url: GEMINI_URL.into(), api_key: None, timeout_secs: 30 }
  }
}

/// Prediction is enabled only when both the feature list and the inference
/// endpoint are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
  /// CSV file with a `Symptom` column, in model input order.
  pub features_path: Option<PathBuf>,
  pub endpoint:      Option<String>,
  pub timeout_secs:  u64,
}

impl Default for PredictorConfig {
  fn default() -> Self { Self { features_path: None, endpoint: None, timeout_secs: 10 } }
}

impl ServerConfig {
  /// Read `path` if it exists, then apply the environment on top.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("CLINIC")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize::<Self>()?
      .validated()
  }

  fn validated(self) -> Result<Self, ConfigError> {
    if self.session_ttl().is_none() {
      return Err(ConfigError::Message(format!(
        "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
        self.session_ttl_hours
      )));
    }
    Ok(self)
  }

  /// Session lifetime, or `None` when `session_ttl_hours` is out of range.
  pub fn session_ttl(&self) -> Option<chrono::Duration> {
    (1..=MAX_SESSION_TTL_HOURS)
      .contains(&self.session_ttl_hours)
      .then(|| chrono::Duration::hours(self.session_ttl_hours))
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.session_ttl_hours, 24);
    assert!(cfg.predictor.endpoint.is_none());
    assert!(cfg.chat.api_url.ends_with(":generateContent"));
  }

  #[test]
  fn file_overrides_nested_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
      &path,
      r#"
port = 9000
upload_dir = "/srv/clinic/uploads"

[chat]
api_key = "abc"

[predictor]
features_path = "symptoms.csv"
endpoint = "http://127.0.0.1:8501/v1/models/disease:predict"
"#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.upload_dir, PathBuf::from("/srv/clinic/uploads"));
    assert_eq!(cfg.chat.api_key.as_deref(), Some("abc"));
    assert_eq!(cfg.chat.timeout_secs, 30);
    assert_eq!(cfg.predictor.features_path, Some(PathBuf::from("symptoms.csv")));
    assert_eq!(cfg.predictor.timeout_secs, 10);
    assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
  }

  #[test]
  fn session_ttl_must_be_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    for bad in ["0", "-5", "3000000000"] {
      std::fs::write(&path, format!("session_ttl_hours = {bad}\n")).unwrap();
      let err = ServerConfig::load(&path).unwrap_err();
      assert!(err.to_string().contains("session_ttl_hours"), "{bad}: {err}");
    }

    std::fs::write(&path, "session_ttl_hours = 8760\n").unwrap();
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.session_ttl(), Some(chrono::Duration::hours(8760)));
  }

  #[test]
  fn tilde_expands_only_as_prefix() {
    let plain = Path::new("data/clinic.db");
    assert_eq!(expand_tilde(plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/clinic.db")), Path::new(&home).join("clinic.db"));
    }
  }
}
