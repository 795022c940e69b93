//! Appointment booking and the doctor's approve/reject workflow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/appointments` | Patient session |
//! | `POST` | `/appointments` | Patient session. Body: `{"doctor_id","appointment_date","appointment_time","reason"}` |
//! | `GET`  | `/doctor/appointments` | Doctor session |
//! | `POST` | `/doctor/appointments/{id}/status` | Doctor session. Body: `{"status":"Approved"\|"Rejected"}` |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use clinic_core::{
  appointment::{BookingForm, Decision, Transition},
  store::ClinicStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{DoctorSession, PatientSession},
  error::ApiError,
};

// ─── Patient side ─────────────────────────────────────────────────────────────

/// `GET /appointments`
pub async fn list_mine<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let appointments = state
    .store
    .patient_appointments(session.patient_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "status": "success", "appointments": appointments })))
}

/// `POST /appointments`
pub async fn book<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
  payload: Result<Json<BookingForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(form) = payload?;
  let input = form.validate(session.patient_id)?;

  let doctor = state
    .store
    .get_doctor(input.doctor_id)
    .await
    .map_err(ApiError::store)?;
  if doctor.is_none() {
    return Err(ApiError::BadRequest(format!("unknown doctor: {}", input.doctor_id)));
  }

  let appointment = state
    .store
    .book_appointment(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    appointment_id = appointment.id,
    patient_id = appointment.patient_id,
    doctor_id = appointment.doctor_id,
    "appointment booked"
  );
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "status":      "success",
      "message":     "Appointment booked",
      "appointment": appointment,
    })),
  ))
}

// ─── Doctor side ──────────────────────────────────────────────────────────────

/// `GET /doctor/appointments`
pub async fn list_for_doctor<S>(
  State(state): State<AppState<S>>,
  session: DoctorSession,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let appointments = state
    .store
    .doctor_appointments(session.doctor_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "status": "success", "appointments": appointments })))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  #[serde(default)]
  pub status: String,
}

/// `POST /doctor/appointments/{id}/status`
pub async fn decide<S>(
  State(state): State<AppState<S>>,
  session: DoctorSession,
  Path(id): Path<i64>,
  payload: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let decision = Decision::parse(&body.status)?;

  match state
    .store
    .decide_appointment(id, session.doctor_id, decision)
    .await
    .map_err(ApiError::store)?
  {
    Transition::Applied(appointment) => {
      tracing::info!(
        appointment_id = id,
        doctor_id = session.doctor_id,
        status = appointment.status.as_str(),
        "appointment decided"
      );
      Ok(Json(json!({
        "status":      "success",
        "message":     format!("Appointment {}", appointment.status.as_str()),
        "appointment": appointment,
      })))
    }
    Transition::NotFound => Err(ApiError::NotFound("appointment not found".into())),
    Transition::AlreadyDecided(appointment) => Err(ApiError::Conflict(format!(
      "appointment is already {}",
      appointment.status.as_str()
    ))),
  }
}
