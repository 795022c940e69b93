//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"status":"error","message":…}`. Server-side
//! failures are logged and answered with a generic message.

use axum::{
  Json,
  extract::{multipart::MultipartError, rejection::JsonRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(&'static str),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  /// An outbound service failed. The message is safe to show; details are
  /// logged where the failure happened.
  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      Self::Upstream(_) => StatusCode::BAD_GATEWAY,
      Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<clinic_core::Error> for ApiError {
  fn from(e: clinic_core::Error) -> Self {
    use clinic_core::Error as E;
    match e {
      E::NoMatchingSymptoms => Self::Unprocessable(e.to_string()),
      E::NoSymptomInput
      | E::MissingField(_)
      | E::InvalidDate(_)
      | E::InvalidTime(_)
      | E::InvalidStatus(_)
      | E::DisallowedFileType(_) => Self::BadRequest(e.to_string()),
      E::Store(inner) => Self::Store(inner),
    }
  }
}

/// Body rejections keep their size-limit status; anything else is the
/// client's malformed input.
fn rejection(status: StatusCode, text: String) -> ApiError {
  match status {
    StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(text),
    _ => ApiError::BadRequest(text),
  }
}

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { rejection(e.status(), e.body_text()) }
}

impl From<MultipartError> for ApiError {
  fn from(e: MultipartError) -> Self { rejection(e.status(), e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Self::BadRequest(m)
      | Self::NotFound(m)
      | Self::Conflict(m)
      | Self::Unprocessable(m)
      | Self::PayloadTooLarge(m)
      | Self::Upstream(m)
      | Self::Unavailable(m) => m.clone(),
      Self::Unauthorized(m) => m.to_string(),
      Self::Store(e) => {
        tracing::error!(error = %e, "store failure");
        "internal server error".to_string()
      }
      Self::Internal(m) => {
        tracing::error!(error = %m, "internal failure");
        "internal server error".to_string()
      }
    };
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_client_statuses() {
    let cases = [
      (clinic_core::Error::NoSymptomInput, StatusCode::BAD_REQUEST),
      (clinic_core::Error::NoMatchingSymptoms, StatusCode::UNPROCESSABLE_ENTITY),
      (clinic_core::Error::MissingField("doctor_id"), StatusCode::BAD_REQUEST),
      (clinic_core::Error::DisallowedFileType("a.exe".into()), StatusCode::BAD_REQUEST),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[test]
  fn store_errors_hide_details() {
    let err = ApiError::store(std::io::Error::other("disk on fire"));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
