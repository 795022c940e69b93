//! Credentials, bearer sessions and the session extractors.
//!
//! Passwords are stored as argon2 PHC strings. A successful login mints a
//! random bearer token; the store keeps only its SHA-256 digest, bound to one
//! [`Principal`] and an expiry.

use std::sync::LazyLock;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use clinic_core::{
  session::{Principal, Session},
  store::ClinicStore,
};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{AppState, error::ApiError};

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// `true` iff `password` matches the stored PHC string. Malformed hashes
/// never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Stands in for the stored hash when the email is unknown, so a failed
/// lookup costs the same argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
  LazyLock::new(|| hash_password("no account has this password").ok());

/// Check a login attempt against the account's stored hash, if any. Exactly
/// one argon2 verification runs either way.
pub fn verify_login(password: &str, stored_hash: Option<&str>) -> bool {
  match stored_hash {
    Some(hash) => verify_password(password, hash),
    None => {
      if let Some(dummy) = DUMMY_HASH.as_deref() {
        verify_password(password, dummy);
      }
      false
    }
  }
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// 32 random bytes, URL-safe base64 without padding.
pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// Lower-case hex SHA-256 of a bearer token.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// A freshly issued session, as returned to the client at login.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedToken {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

/// Mint a token for `principal` and persist its session.
pub async fn issue_session<S>(
  state: &AppState<S>,
  principal: Principal,
) -> Result<IssuedToken, ApiError>
where
  S: ClinicStore,
{
  let token = new_token();
  let created_at = Utc::now();
  let expires_at = created_at
    .checked_add_signed(state.session_ttl)
    .ok_or_else(|| ApiError::Internal(format!("session ttl out of range: {}", state.session_ttl)))?;
  state
    .store
    .create_session(Session {
      token_digest: token_digest(&token),
      principal,
      created_at,
      expires_at,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(kind = principal.kind(), id = principal.id(), "session issued");
  Ok(IssuedToken { token, expires_at })
}

// ─── Extractors ───────────────────────────────────────────────────────────────

const LOGIN_REQUIRED: &str = "login required";

/// Any live session.
#[derive(Debug, Clone)]
pub struct AnySession {
  pub principal:    Principal,
  pub token_digest: String,
}

/// A live patient session.
#[derive(Debug, Clone, Copy)]
pub struct PatientSession {
  pub patient_id: i64,
}

/// A live doctor session.
#[derive(Debug, Clone, Copy)]
pub struct DoctorSession {
  pub doctor_id: i64,
}

fn bearer(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<AppState<S>> for AnySession
where
  S: ClinicStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer(parts).ok_or(ApiError::Unauthorized(LOGIN_REQUIRED))?;
    let digest = token_digest(token);
    let session = state
      .store
      .find_session(digest, Utc::now())
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized(LOGIN_REQUIRED))?;
    Ok(AnySession { principal: session.principal, token_digest: session.token_digest })
  }
}

impl<S> FromRequestParts<AppState<S>> for PatientSession
where
  S: ClinicStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match AnySession::from_request_parts(parts, state).await?.principal {
      Principal::Patient(patient_id) => Ok(PatientSession { patient_id }),
      Principal::Doctor(_) => Err(ApiError::Unauthorized(LOGIN_REQUIRED)),
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for DoctorSession
where
  S: ClinicStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match AnySession::from_request_parts(parts, state).await?.principal {
      Principal::Doctor(doctor_id) => Ok(DoctorSession { doctor_id }),
      Principal::Patient(_) => Err(ApiError::Unauthorized(LOGIN_REQUIRED)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not-a-phc-string"));
  }

  #[test]
  fn login_without_account_never_matches() {
    let hash = hash_password("hunter2").unwrap();
    assert!(verify_login("hunter2", Some(&hash)));
    assert!(!verify_login("hunter3", Some(&hash)));
    assert!(!verify_login("hunter2", None));
    assert!(!verify_login("no account has this password", None));
    assert!(DUMMY_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2")));
  }

  #[test]
  fn tokens_are_unique_and_digest_is_hex() {
    let a = new_token();
    let b = new_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);

    let digest = token_digest(&a);
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(digest, token_digest(&a));
  }
}
