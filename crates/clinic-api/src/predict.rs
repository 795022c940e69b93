//! Disease prediction via an external classifier.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/predict/symptoms` | Feature names, in model order |
//! | `POST` | `/predict` | Body: `{"symptoms":["itching", …]}` |
//!
//! The feature list comes from the `Symptom` column of a CSV file. A
//! selection becomes a 0/1 vector in feature order and is posted to the
//! inference endpoint as `{"instances":[[…]]}`; the reply's first
//! `predictions` entry is the label.

use std::{collections::HashSet, io, path::Path, time::Duration};

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use clinic_core::store::ClinicStore;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{AppState, error::ApiError};

const FEATURE_COLUMN: &str = "Symptom";

#[derive(Debug, Error)]
pub enum PredictError {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("feature file has no {FEATURE_COLUMN:?} column")]
  MissingColumn,

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("inference reply contained no prediction")]
  EmptyPrediction,
}

/// Read feature names from the `Symptom` column of a CSV source. Blank cells
/// are skipped; order is preserved.
pub fn read_features<R: io::Read>(source: R) -> Result<Vec<String>, PredictError> {
  let mut reader = csv::Reader::from_reader(source);
  let column = reader
    .headers()?
    .iter()
    .position(|h| h.trim() == FEATURE_COLUMN)
    .ok_or(PredictError::MissingColumn)?;

  let mut features = Vec::new();
  for record in reader.records() {
    let record = record?;
    if let Some(name) = record.get(column).map(str::trim).filter(|n| !n.is_empty()) {
      features.push(name.to_string());
    }
  }
  Ok(features)
}

pub fn load_features(path: &Path) -> Result<Vec<String>, PredictError> {
  let file = std::fs::File::open(path).map_err(csv::Error::from)?;
  read_features(file)
}

#[derive(Debug, Clone)]
pub struct Predictor {
  features: Vec<String>,
  client:   reqwest::Client,
  endpoint: String,
}

#[derive(Deserialize)]
struct InferenceResponse {
  #[serde(default)]
  predictions: Vec<Value>,
}

impl Predictor {
  pub fn new(
    features: Vec<String>,
    endpoint: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, PredictError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { features, client, endpoint: endpoint.into() })
  }

  pub fn features(&self) -> &[String] { &self.features }

  /// One entry per feature: 1 if the exact name was selected, else 0.
  pub fn feature_vector(&self, selected: &[String]) -> Vec<u8> {
    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    self
      .features
      .iter()
      .map(|f| u8::from(selected.contains(f.as_str())))
      .collect()
  }

  pub async fn predict(&self, selected: &[String]) -> Result<String, PredictError> {
    let body = json!({ "instances": [self.feature_vector(selected)] });
    let response: InferenceResponse = self
      .client
      .post(&self.endpoint)
      .json(&body)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    match response.predictions.into_iter().next() {
      Some(Value::String(label)) => Ok(label),
      Some(Value::Null) | None => Err(PredictError::EmptyPrediction),
      Some(other) => Ok(other.to_string()),
    }
  }
}

fn configured<S>(state: &AppState<S>) -> Result<&Predictor, ApiError> {
  state
    .predictor
    .as_deref()
    .ok_or_else(|| ApiError::Unavailable("disease prediction is not configured".into()))
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /predict/symptoms`
pub async fn symptoms<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let predictor = configured(&state)?;
  Ok(Json(json!({ "status": "success", "symptoms": predictor.features() })))
}

#[derive(Debug, Deserialize)]
pub struct PredictBody {
  #[serde(default)]
  pub symptoms: Vec<String>,
}

/// `POST /predict`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<PredictBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let predictor = configured(&state)?;
  match predictor.predict(&body.symptoms).await {
    Ok(label) => Ok(Json(json!({
      "status":  "success",
      "message": format!("Predicted Disease: {label}"),
    }))),
    Err(e) => {
      tracing::warn!(error = %e, "prediction upstream failed");
      Err(ApiError::Upstream("the prediction service is unavailable right now".into()))
    }
  }
}
