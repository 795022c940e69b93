//! Symptom analysis and the patient's health history.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/analysis` | Patient session. Body: `{"symptoms":"fever, cough"}` |
//! | `GET`  | `/history`  | Patient session; newest first |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use clinic_core::{
  resolver::{self, CarePathway},
  store::ClinicStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, auth::PatientSession, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AnalysisBody {
  #[serde(default)]
  pub symptoms: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
  pub status:        &'static str,
  /// The text exactly as submitted, for redisplay.
  pub symptoms_text: String,
  #[serde(flatten)]
  pub pathway:       CarePathway,
}

/// `POST /analysis`
pub async fn analyze<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
  payload: Result<Json<AnalysisBody>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let pathway = resolver::resolve(state.store.as_ref(), session.patient_id, &body.symptoms).await?;
  tracing::debug!(
    patient_id = session.patient_id,
    symptoms = pathway.symptoms.len(),
    doctors = pathway.doctors.len(),
    "analysis complete"
  );
  Ok(Json(AnalysisResponse {
    status:        "success",
    symptoms_text: body.symptoms.trim().to_string(),
    pathway,
  }))
}

/// `GET /history`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let entries = state
    .store
    .list_history(session.patient_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "status": "success", "history": entries })))
}
