//! Errors that keep the server from starting.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to open store at {path:?}")]
  Store {
    path:   PathBuf,
    #[source]
    source: clinic_store_sqlite::Error,
  },

  #[error("failed to prepare upload directory {path:?}")]
  UploadDir {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("session_ttl_hours out of range: {0}")]
  SessionTtl(i64),

  #[error("chat client: {0}")]
  Chat(#[from] clinic_api::chat::ChatError),

  #[error("disease predictor: {0}")]
  Predictor(#[from] clinic_api::predict::PredictError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
