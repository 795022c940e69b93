//! Specialties, the public doctor directory and a doctor's own profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/specialties`    | |
//! | `GET`  | `/doctors`        | Ordered by name |
//! | `GET`  | `/doctor/profile` | Doctor session |
//! | `PUT`  | `/doctor/profile` | Doctor session; absent fields are left unchanged |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use clinic_core::{people::ProfileUpdate, store::ClinicStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, auth::DoctorSession, error::ApiError};

/// `GET /specialties`
pub async fn specialties<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let specialties = state.store.list_specialties().await.map_err(ApiError::store)?;
  Ok(Json(json!({ "status": "success", "specialties": specialties })))
}

/// `GET /doctors`
pub async fn doctors<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let doctors = state.store.list_doctors().await.map_err(ApiError::store)?;
  Ok(Json(json!({ "status": "success", "doctors": doctors })))
}

/// `GET /doctor/profile`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  session: DoctorSession,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let doctor = state
    .store
    .get_doctor(session.doctor_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("doctor not found".into()))?;
  Ok(Json(json!({ "status": "success", "doctor": doctor })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileBody {
  pub name:             Option<String>,
  pub specialty_id:     Option<i64>,
  pub availability:     Option<String>,
  pub biography:        Option<String>,
  pub experience_years: Option<u32>,
}

impl ProfileBody {
  /// Trim text fields; a blank name or availability is an error, a blank
  /// biography is simply ignored.
  fn into_update(self) -> Result<ProfileUpdate, ApiError> {
    fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
      match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(ApiError::BadRequest(format!("{field} cannot be empty"))),
        other => Ok(other),
      }
    }

    Ok(ProfileUpdate {
      name:             non_blank(self.name, "name")?,
      specialty_id:     self.specialty_id,
      availability:     non_blank(self.availability, "availability")?,
      biography:        self
        .biography
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty()),
      experience_years: self.experience_years,
    })
  }
}

/// `PUT /doctor/profile`
pub async fn update_profile<S>(
  State(state): State<AppState<S>>,
  session: DoctorSession,
  payload: Result<Json<ProfileBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let update = body.into_update()?;

  if let Some(id) = update.specialty_id {
    let known = state.store.get_specialty(id).await.map_err(ApiError::store)?;
    if known.is_none() {
      return Err(ApiError::BadRequest(format!("unknown specialty: {id}")));
    }
  }

  let doctor = state
    .store
    .update_doctor_profile(session.doctor_id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("doctor not found".into()))?;
  tracing::info!(doctor_id = doctor.id, "profile updated");
  Ok(Json(json!({
    "status":  "success",
    "message": "Profile updated",
    "doctor":  doctor,
  })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_name_is_rejected_blank_biography_ignored() {
    let body = ProfileBody { name: Some("  ".into()), ..Default::default() };
    assert!(matches!(body.into_update(), Err(ApiError::BadRequest(_))));

    let body = ProfileBody {
      biography: Some("   ".into()),
      availability: Some(" Online/10:00-12:00 ".into()),
      ..Default::default()
    };
    let update = body.into_update().unwrap();
    assert_eq!(update.biography, None);
    assert_eq!(update.availability.as_deref(), Some("Online/10:00-12:00"));
  }
}
