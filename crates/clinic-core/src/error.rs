//! Error types for `clinic-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no symptoms were entered")]
  NoSymptomInput,

  #[error("no matching symptoms found")]
  NoMatchingSymptoms,

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid date {0:?}, expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("invalid time {0:?}, expected HH:MM")]
  InvalidTime(String),

  #[error("invalid status update: {0:?}")]
  InvalidStatus(String),

  #[error("file type not allowed: {0:?}")]
  DisallowedFileType(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
