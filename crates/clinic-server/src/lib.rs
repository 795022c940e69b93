//! Wiring for the clinic server: configuration, state construction and the
//! top-level router the binary serves.

pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::Error;

use std::{sync::Arc, time::Duration};

use axum::{Router, extract::DefaultBodyLimit};
use chrono::Utc;
use clinic_api::{
  API_PREFIX, AppState, api_router,
  chat::Assistant,
  files::DocumentFiles,
  predict::{Predictor, load_features},
};
use clinic_core::store::ClinicStore;
use clinic_store_sqlite::SqliteStore;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::{
  config::{PredictorConfig, expand_tilde},
  error::Result,
};

// ─── State ────────────────────────────────────────────────────────────────────

/// Open the store, prepare the upload directory and build the outbound
/// clients described by `cfg`.
pub async fn build_state(cfg: &ServerConfig) -> Result<AppState<SqliteStore>> {
  let session_ttl = cfg.session_ttl().ok_or(Error::SessionTtl(cfg.session_ttl_hours))?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .map_err(|source| Error::Store { path: store_path.clone(), source })?;

  let files = DocumentFiles::new(expand_tilde(&cfg.upload_dir));
  files
    .ensure_root()
    .await
    .map_err(|source| Error::UploadDir { path: files.root().to_path_buf(), source })?;

  let assistant = Assistant::new(
    cfg.chat.api_url.clone(),
    cfg.chat.api_key.clone(),
    Duration::from_secs(cfg.chat.timeout_secs),
  )?;
  if cfg.chat.api_key.as_deref().is_none_or(str::is_empty) {
    tracing::warn!("no chat api key configured; only greetings will be answered");
  }

  Ok(AppState {
    store: Arc::new(store),
    files,
    assistant,
    predictor: build_predictor(&cfg.predictor)?.map(Arc::new),
    session_ttl,
  })
}

fn build_predictor(cfg: &PredictorConfig) -> Result<Option<Predictor>> {
  match (&cfg.features_path, &cfg.endpoint) {
    (Some(path), Some(endpoint)) => {
      let features = load_features(&expand_tilde(path))?;
      tracing::info!(features = features.len(), %endpoint, "disease prediction enabled");
      let timeout = Duration::from_secs(cfg.timeout_secs);
      Ok(Some(Predictor::new(features, endpoint.clone(), timeout)?))
    }
    (None, None) => Ok(None),
    _ => {
      tracing::warn!("predictor needs both features_path and endpoint; prediction disabled");
      Ok(None)
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API nested under [`API_PREFIX`], with request tracing and a cap on
/// body size.
pub fn app<S>(state: AppState<S>, max_upload_bytes: usize) -> Router
where
  S: ClinicStore + Clone + 'static,
{
  Router::new()
    .nest(API_PREFIX, api_router(state))
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

// ─── Background work ──────────────────────────────────────────────────────────

/// Periodically delete expired sessions. The first sweep runs one full
/// interval after start.
pub fn spawn_session_sweeper(store: Arc<SqliteStore>, every: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    loop {
      interval.tick().await;
      match store.purge_expired_sessions(Utc::now()).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "purged expired sessions"),
        Err(e) => tracing::warn!(error = %e, "session sweep failed"),
      }
    }
  })
}
