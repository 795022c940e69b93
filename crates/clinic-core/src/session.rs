//! Server-side sessions.
//!
//! Clients hold an opaque bearer token; the store only ever sees its digest.
//! Each session is bound to exactly one principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated party behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Principal {
  Patient(i64),
  Doctor(i64),
}

impl Principal {
  pub fn kind(self) -> &'static str {
    match self {
      Self::Patient(_) => "patient",
      Self::Doctor(_) => "doctor",
    }
  }

  pub fn id(self) -> i64 {
    match self {
      Self::Patient(id) | Self::Doctor(id) => id,
    }
  }

  pub fn from_parts(kind: &str, id: i64) -> Option<Self> {
    match kind {
      "patient" => Some(Self::Patient(id)),
      "doctor" => Some(Self::Doctor(id)),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  /// Lower-case hex SHA-256 of the bearer token.
  pub token_digest: String,
  pub principal:    Principal,
  pub created_at:   DateTime<Utc>,
  pub expires_at:   DateTime<Utc>,
}

impl Session {
  pub fn is_live(&self, now: DateTime<Utc>) -> bool { now < self.expires_at }
}
