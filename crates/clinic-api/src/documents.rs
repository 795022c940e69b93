//! Patient medical documents.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/documents` | Own documents, newest first |
//! | `POST`   | `/documents` | Multipart: `document_file`, optional `document_description` |
//! | `DELETE` | `/documents/{id}` | |
//! | `GET`    | `/documents/{id}/view` | Inline |
//! | `GET`    | `/documents/{id}/download` | Attachment |
//!
//! All routes need a patient session and only ever touch the caller's own
//! rows; someone else's document is indistinguishable from a missing one.

use axum::{
  Json,
  body::Body,
  extract::{Multipart, Path, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use clinic_core::{
  document::{NewDocument, UploadedDocument, stored_file_name},
  store::ClinicStore,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
  API_PREFIX, AppState,
  auth::PatientSession,
  error::ApiError,
  files::{DocumentFiles, format_size},
};

const FILE_FIELD: &str = "document_file";
const DESCRIPTION_FIELD: &str = "document_description";
const DEFAULT_DESCRIPTION: &str = "Medical Document";

/// A document as shown to its owner.
#[derive(Debug, Serialize)]
pub struct DocumentRecord {
  pub id:           i64,
  pub file_name:    String,
  pub description:  String,
  pub uploaded_at:  DateTime<Utc>,
  /// Absent when the file is missing from disk.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_size:    Option<String>,
  pub view_url:     String,
  pub download_url: String,
}

impl DocumentRecord {
  async fn describe(doc: UploadedDocument, files: &DocumentFiles) -> Self {
    let file_size = files.size(&doc.file_name).await.map(format_size);
    Self {
      id: doc.id,
      description: doc
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
      uploaded_at: doc.uploaded_at,
      file_size,
      view_url: format!("{API_PREFIX}/documents/{}/view", doc.id),
      download_url: format!("{API_PREFIX}/documents/{}/download", doc.id),
      file_name: doc.file_name,
    }
  }
}

// ─── Upload ───────────────────────────────────────────────────────────────────

struct UploadForm {
  file_name:   Option<String>,
  bytes:       Option<Vec<u8>>,
  description: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
  let mut form = UploadForm { file_name: None, bytes: None, description: None };
  while let Some(field) = multipart.next_field().await? {
    match field.name() {
      Some(FILE_FIELD) => {
        form.file_name = field.file_name().map(str::to_string);
        form.bytes = Some(field.bytes().await?.to_vec());
      }
      Some(DESCRIPTION_FIELD) => {
        form.description = Some(field.text().await?);
      }
      _ => {}
    }
  }
  Ok(form)
}

/// `POST /documents`
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let form = read_form(multipart).await?;
  let bytes = form
    .bytes
    .ok_or_else(|| ApiError::BadRequest("no file uploaded".into()))?;
  let original = form
    .file_name
    .filter(|n| !n.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("no file selected".into()))?;

  // Validation happens before anything touches the disk or the database.
  let uploaded_at = Utc::now();
  let (stored, sanitized) = stored_file_name(session.patient_id, uploaded_at, &original)?;
  let description = form
    .description
    .map(|d| d.trim().to_string())
    .filter(|d| !d.is_empty())
    .unwrap_or(sanitized);

  state
    .files
    .write_new(&stored, &bytes)
    .await
    .map_err(|e| match e.kind() {
      std::io::ErrorKind::AlreadyExists => {
        ApiError::Conflict("an identical upload is already in progress, retry".into())
      }
      _ => ApiError::Internal(format!("writing {stored}: {e}")),
    })?;

  let input = NewDocument {
    patient_id: session.patient_id,
    file_name: stored.clone(),
    description: Some(description),
    uploaded_at,
  };
  let doc = match state.store.add_document(input).await {
    Ok(doc) => doc,
    Err(e) => {
      if let Err(cleanup) = state.files.remove(&stored).await {
        tracing::warn!(file = %stored, error = %cleanup, "could not remove orphaned upload");
      }
      return Err(ApiError::store(e));
    }
  };

  tracing::info!(patient_id = session.patient_id, record_id = doc.id, "document uploaded");
  let record = DocumentRecord::describe(doc, &state.files).await;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "status":  "success",
      "message": "File uploaded successfully",
      "record":  record,
    })),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /documents`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let docs = state
    .store
    .list_documents(session.patient_id)
    .await
    .map_err(ApiError::store)?;

  let mut records = Vec::with_capacity(docs.len());
  for doc in docs {
    records.push(DocumentRecord::describe(doc, &state.files).await);
  }
  Ok(Json(json!({
    "status":  "success",
    "total":   records.len(),
    "records": records,
  })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /documents/{id}`
///
/// The row goes first. A file that is already gone is not an error; one that
/// cannot be removed is reported as a warning alongside the success.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let doc = state
    .store
    .delete_document(id, session.patient_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("record not found".into()))?;

  let mut body = json!({
    "status":     "success",
    "message":    "Record deleted successfully",
    "deleted_id": id,
  });
  match state.files.remove(&doc.file_name).await {
    Ok(true) => {}
    Ok(false) => {
      tracing::warn!(record_id = id, file = %doc.file_name, "deleted record had no file on disk");
    }
    Err(e) => {
      tracing::warn!(record_id = id, file = %doc.file_name, error = %e, "could not remove file");
      body["warning"] = json!("the record was deleted but its file could not be removed");
    }
  }
  Ok(Json(body))
}

// ─── View / download ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Disposition {
  Inline,
  Attachment,
}

async fn serve<S>(
  state: &AppState<S>,
  patient_id: i64,
  id: i64,
  disposition: Disposition,
) -> Result<Response, ApiError>
where
  S: ClinicStore,
{
  let doc = state
    .store
    .get_document(id, patient_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("record not found".into()))?;

  let Some(bytes) = state
    .files
    .read(&doc.file_name)
    .await
    .map_err(|e| ApiError::Internal(format!("reading {}: {e}", doc.file_name)))?
  else {
    tracing::warn!(record_id = id, file = %doc.file_name, "document file missing on disk");
    return Err(ApiError::NotFound("file not found on server".into()));
  };

  let content_type = mime_guess::from_path(&doc.file_name).first_or_octet_stream();
  let kind = match disposition {
    Disposition::Inline => "inline",
    Disposition::Attachment => "attachment",
  };
  let response = Response::builder()
    .status(StatusCode::OK)
    .header(header::CONTENT_TYPE, content_type.as_ref())
    .header(
      header::CONTENT_DISPOSITION,
      format!("{kind}; filename=\"{}\"", doc.file_name),
    )
    .body(Body::from(bytes))
    .map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(response)
}

/// `GET /documents/{id}/view`
pub async fn view<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  serve(&state, session.patient_id, id, Disposition::Inline).await
}

/// `GET /documents/{id}/download`
pub async fn download<S>(
  State(state): State<AppState<S>>,
  session: PatientSession,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  serve(&state, session.patient_id, id, Disposition::Attachment).await
}
