//! Registration, login and logout for both kinds of account.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/patients/register` | `{"name","email","password"}`; 409 on a taken email |
//! | `POST` | `/patients/login`    | `{"email","password"}`; returns a bearer token |
//! | `POST` | `/doctors/register`  | as above, plus optional `specialty_id` |
//! | `POST` | `/doctors/login`     | |
//! | `POST` | `/logout`            | Any session |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use clinic_core::{
  people::{Account, NewDoctor, NewPatient, Registration, title_case},
  session::Principal,
  store::ClinicStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{AnySession, hash_password, issue_session, verify_login},
  error::ApiError,
};

const BAD_CREDENTIALS: &str = "invalid email or password";

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("missing required field: {field}")))
}

/// Accept `account` only if `password` matches it. A missing account takes
/// as long to refuse as a wrong password.
fn authenticate<T>(account: Option<Account<T>>, password: &str) -> Result<Account<T>, ApiError> {
  let stored = account.as_ref().map(|a| a.password_hash.as_str());
  if verify_login(password, stored) {
    account.ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))
  } else {
    Err(ApiError::Unauthorized(BAD_CREDENTIALS))
  }
}

/// Trimmed, lower-cased, and at least shaped like `local@domain`.
fn email(value: Option<String>) -> Result<String, ApiError> {
  let email = required(value, "email")?.to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(ApiError::BadRequest("invalid email address".into())),
  }
}

// ─── Registration ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:         Option<String>,
  pub email:        Option<String>,
  pub password:     Option<String>,
  /// Doctors only.
  pub specialty_id: Option<i64>,
}

/// `POST /patients/register`
pub async fn register_patient<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let name = title_case(&required(body.name, "name")?);
  let email = email(body.email)?;
  let password = required(body.password, "password")?;

  let input = NewPatient { name, email, password_hash: hash_password(&password)? };
  match state.store.register_patient(input).await.map_err(ApiError::store)? {
    Registration::Created(patient) => {
      tracing::info!(patient_id = patient.id, "patient registered");
      Ok((
        StatusCode::CREATED,
        Json(json!({
          "status":  "success",
          "message": "Registration successful",
          "patient": patient,
        })),
      ))
    }
    Registration::EmailTaken => Err(ApiError::Conflict("email is already registered".into())),
  }
}

/// `POST /doctors/register`
pub async fn register_doctor<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let name = required(body.name, "name")?;
  let email = email(body.email)?;
  let password = required(body.password, "password")?;

  if let Some(id) = body.specialty_id {
    let known = state.store.get_specialty(id).await.map_err(ApiError::store)?;
    if known.is_none() {
      return Err(ApiError::BadRequest(format!("unknown specialty: {id}")));
    }
  }

  let input = NewDoctor {
    specialty_id: body.specialty_id,
    ..NewDoctor::new(name, email, hash_password(&password)?)
  };
  match state.store.register_doctor(input).await.map_err(ApiError::store)? {
    Registration::Created(doctor) => {
      tracing::info!(doctor_id = doctor.id, "doctor registered");
      Ok((
        StatusCode::CREATED,
        Json(json!({
          "status":  "success",
          "message": "Registration successful",
          "doctor":  doctor,
        })),
      ))
    }
    Registration::EmailTaken => Err(ApiError::Conflict("email is already registered".into())),
  }
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    Option<String>,
  pub password: Option<String>,
}

/// `POST /patients/login`
pub async fn login_patient<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let email = required(body.email, "email")?;
  let password = required(body.password, "password")?;

  let account = state.store.patient_account(email).await.map_err(ApiError::store)?;
  let account = authenticate(account, &password)?;

  let issued = issue_session(&state, Principal::Patient(account.profile.id)).await?;
  Ok(Json(json!({
    "status":     "success",
    "token":      issued.token,
    "expires_at": issued.expires_at,
    "patient":    account.profile,
  })))
}

/// `POST /doctors/login`
pub async fn login_doctor<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let email = required(body.email, "email")?;
  let password = required(body.password, "password")?;

  let account = state.store.doctor_account(email).await.map_err(ApiError::store)?;
  let account = authenticate(account, &password)?;

  let issued = issue_session(&state, Principal::Doctor(account.profile.id)).await?;
  Ok(Json(json!({
    "status":     "success",
    "token":      issued.token,
    "expires_at": issued.expires_at,
    "doctor":     account.profile,
  })))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `POST /logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  session: AnySession,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  state
    .store
    .delete_session(session.token_digest)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(kind = session.principal.kind(), id = session.principal.id(), "logged out");
  Ok(Json(json!({ "status": "success", "message": "Logged out" })))
}
