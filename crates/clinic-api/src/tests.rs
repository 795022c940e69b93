//! Router tests: the real router over an in-memory store, driven with
//! `tower::ServiceExt::oneshot`. Upstream services are local axum servers.

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  body::Body,
  extract::Query,
  http::{Method, Request, StatusCode, header},
  routing::post,
};
use clinic_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::{
  AppState, api_router,
  chat::{Assistant, GREETING_REPLY},
  files::DocumentFiles,
  predict::Predictor,
};

const DEAD_URL: &str = "http://127.0.0.1:9/unreachable";

struct Harness {
  app:     Router,
  store:   Arc<SqliteStore>,
  uploads: TempDir,
}

async fn harness_with(assistant: Assistant, predictor: Option<Predictor>) -> Harness {
  harness_with_ttl(assistant, predictor, chrono::Duration::hours(1)).await
}

async fn harness_with_ttl(
  assistant: Assistant,
  predictor: Option<Predictor>,
  session_ttl: chrono::Duration,
) -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let uploads = tempfile::tempdir().unwrap();
  let files = DocumentFiles::new(uploads.path());
  let state = AppState {
    store: store.clone(),
    files,
    assistant,
    predictor: predictor.map(Arc::new),
    session_ttl,
  };
  Harness { app: api_router(state), store, uploads }
}

async fn harness() -> Harness {
  let assistant = Assistant::new(DEAD_URL, None, Duration::from_secs(2)).unwrap();
  harness_with(assistant, None).await
}

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_upstream(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{addr}")
}

// ─── Request helpers ─────────────────────────────────────────────────────────

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
  let response = app.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let headers = response.headers().clone();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  (status, headers, bytes.to_vec())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let (status, _, bytes) = send_raw(app, req).await;
  let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, json)
}

async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
  send(app, request(Method::GET, uri, Some(token), None)).await
}

async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
  send(app, request(Method::POST, uri, token, Some(body))).await
}

async fn patient_token(app: &Router, email: &str) -> String {
  let (status, _) = post_json(
    app,
    "/patients/register",
    None,
    json!({ "name": "asha rao", "email": email, "password": "pw-123" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = post_json(
    app,
    "/patients/login",
    None,
    json!({ "email": email, "password": "pw-123" }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  body["token"].as_str().unwrap().to_string()
}

async fn doctor_token(app: &Router, email: &str) -> (String, i64) {
  let (status, body) = post_json(
    app,
    "/doctors/register",
    None,
    json!({ "name": "Dr. Test", "email": email, "password": "pw-456", "specialty_id": 1 }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = body["doctor"]["id"].as_i64().unwrap();

  let (status, body) = post_json(
    app,
    "/doctors/login",
    None,
    json!({ "email": email, "password": "pw-456" }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  (body["token"].as_str().unwrap().to_string(), id)
}

fn upload_request(token: &str, file_name: &str, contents: &[u8], description: Option<&str>) -> Request<Body> {
  let boundary = "clinic-test-boundary";
  let mut body = Vec::new();
  body.extend_from_slice(
    format!(
      "--{boundary}\r\nContent-Disposition: form-data; name=\"document_file\"; \
       filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .as_bytes(),
  );
  body.extend_from_slice(contents);
  body.extend_from_slice(b"\r\n");
  if let Some(description) = description {
    body.extend_from_slice(
      format!(
        "--{boundary}\r\nContent-Disposition: form-data; \
         name=\"document_description\"\r\n\r\n{description}\r\n"
      )
      .as_bytes(),
    );
  }
  body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

  Request::builder()
    .method(Method::POST)
    .uri("/documents")
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
    .body(Body::from(body))
    .unwrap()
}

// ─── Accounts & sessions ─────────────────────────────────────────────────────

#[tokio::test]
async fn registration_and_login() {
  let h = harness().await;

  let (status, body) = post_json(
    &h.app,
    "/patients/register",
    None,
    json!({ "name": "asha rao", "email": "Asha@Example.com", "password": "pw" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["status"], "success");
  assert_eq!(body["patient"]["name"], "Asha Rao");
  assert!(body["patient"].get("password_hash").is_none());

  let (status, body) = post_json(
    &h.app,
    "/patients/register",
    None,
    json!({ "name": "Other", "email": "asha@example.com", "password": "pw" }),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["status"], "error");

  let (status, _) = post_json(
    &h.app,
    "/patients/register",
    None,
    json!({ "name": "No Password", "email": "np@example.com" }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = post_json(
    &h.app,
    "/patients/login",
    None,
    json!({ "email": "asha@example.com", "password": "wrong" }),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["message"], "invalid email or password");

  let (status, body) = post_json(
    &h.app,
    "/patients/login",
    None,
    json!({ "email": "asha@example.com", "password": "pw" }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["token"].as_str().is_some_and(|t| t.len() == 43));
}

#[tokio::test]
async fn sessions_are_bound_to_principal_kind() {
  let h = harness().await;
  let patient = patient_token(&h.app, "asha@example.com").await;
  let (doctor, _) = doctor_token(&h.app, "doc@example.com").await;

  let (status, _) = send(&h.app, request(Method::GET, "/history", None, None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = get(&h.app, "/history", "not-a-real-token").await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = get(&h.app, "/history", &doctor).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = get(&h.app, "/doctor/appointments", &patient).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = get(&h.app, "/history", &patient).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["history"], json!([]));
}

#[tokio::test]
async fn unrepresentable_session_expiry_fails_cleanly() {
  let assistant = Assistant::new(DEAD_URL, None, Duration::from_secs(1)).unwrap();
  let h = harness_with_ttl(assistant, None, chrono::Duration::hours(3_000_000_000)).await;
  let (status, _) = post_json(
    &h.app,
    "/patients/register",
    None,
    json!({ "name": "Asha", "email": "asha@example.com", "password": "pw" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = post_json(
    &h.app,
    "/patients/login",
    None,
    json!({ "email": "asha@example.com", "password": "pw" }),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
  let h = harness().await;
  patient_token(&h.app, "asha@example.com").await;

  let (unknown_status, unknown) = post_json(
    &h.app,
    "/patients/login",
    None,
    json!({ "email": "nobody@example.com", "password": "pw-123" }),
  )
  .await;
  let (wrong_status, wrong) = post_json(
    &h.app,
    "/patients/login",
    None,
    json!({ "email": "asha@example.com", "password": "nope" }),
  )
  .await;
  assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
  assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let h = harness().await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, _) = post_json(&h.app, "/logout", Some(&token), json!({})).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = get(&h.app, "/history", &token).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Directory & profile ─────────────────────────────────────────────────────

#[tokio::test]
async fn directory_lists_specialties_and_doctors() {
  let h = harness().await;
  h.store.seed_demo_doctors("unused".into()).await.unwrap();

  let req = request(Method::GET, "/specialties", None, None);
  let (status, body) = send(&h.app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["specialties"].as_array().unwrap().len(), 5);

  let req = request(Method::GET, "/doctors", None, None);
  let (_, body) = send(&h.app, req).await;
  let names: Vec<_> = body["doctors"]
    .as_array()
    .unwrap()
    .iter()
    .map(|d| d["name"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(names.len(), 6);
  assert_eq!(names[0], "Dr. Anish Menon");
}

#[tokio::test]
async fn doctor_updates_own_profile() {
  let h = harness().await;
  let (token, _) = doctor_token(&h.app, "doc@example.com").await;

  let update = json!({ "specialty_id": 5, "experience_years": 9, "biography": "Knees." });
  let (status, body) =
    send(&h.app, request(Method::PUT, "/doctor/profile", Some(&token), Some(update))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["doctor"]["specialty_name"], "Orthopedic");
  assert_eq!(body["doctor"]["experience_years"], 9);

  let bad = json!({ "specialty_id": 42 });
  let (status, _) =
    send(&h.app, request(Method::PUT, "/doctor/profile", Some(&token), Some(bad))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = get(&h.app, "/doctor/profile", &token).await;
  assert_eq!(body["doctor"]["biography"], "Knees.");
}

// ─── Analysis ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn analysis_returns_care_pathway_and_records_history() {
  let h = harness().await;
  h.store.seed_demo_doctors("unused".into()).await.unwrap();
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, body) = post_json(
    &h.app,
    "/analysis",
    Some(&token),
    json!({ "symptoms": "Fever, joint pain, headache, cough" }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = body["symptoms"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["fever", "headache", "joint pain"]);
  assert_eq!(body["recommendations"].as_array().unwrap().len(), 7);
  assert_eq!(body["doctors"][0]["name"], "Dr. Priya Sharma");
  assert_eq!(body["history_recorded"], true);

  let (_, body) = get(&h.app, "/history", &token).await;
  assert_eq!(body["history"][0]["symptom_summary"], "Fever, Headache, Joint Pain");
}

#[tokio::test]
async fn analysis_rejects_empty_and_unmatched_input() {
  let h = harness().await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, body) =
    post_json(&h.app, "/analysis", Some(&token), json!({ "symptoms": " , " })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["status"], "error");

  let (status, _) =
    post_json(&h.app, "/analysis", Some(&token), json!({ "symptoms": "sneezing" })).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (_, body) = get(&h.app, "/history", &token).await;
  assert_eq!(body["history"], json!([]));
}

// ─── Appointments ────────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_requires_all_fields_and_a_real_doctor() {
  let h = harness().await;
  let patient = patient_token(&h.app, "asha@example.com").await;
  let (_, doctor_id) = doctor_token(&h.app, "doc@example.com").await;

  let missing_time = json!({ "doctor_id": doctor_id, "appointment_date": "2025-11-15" });
  let (status, body) = post_json(&h.app, "/appointments", Some(&patient), missing_time).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["message"].as_str().unwrap().contains("appointment_time"));

  let unknown_doctor = json!({
    "doctor_id": 999,
    "appointment_date": "2025-11-15",
    "appointment_time": "11:00",
  });
  let (status, _) = post_json(&h.app, "/appointments", Some(&patient), unknown_doctor).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = get(&h.app, "/appointments", &patient).await;
  assert_eq!(body["appointments"], json!([]));

  let valid = json!({
    "doctor_id": doctor_id,
    "appointment_date": "2025-11-15",
    "appointment_time": "11:00",
    "reason": "Follow-up",
  });
  let (status, body) = post_json(&h.app, "/appointments", Some(&patient), valid).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["appointment"]["status"], "Pending");
  assert_eq!(body["appointment"]["time"], "11:00");
}

#[tokio::test]
async fn only_the_booked_doctor_decides_once() {
  let h = harness().await;
  let patient = patient_token(&h.app, "asha@example.com").await;
  let (doctor, doctor_id) = doctor_token(&h.app, "doc@example.com").await;
  let (intruder, _) = doctor_token(&h.app, "other@example.com").await;

  let booking = json!({
    "doctor_id": doctor_id,
    "appointment_date": "2025-11-15",
    "appointment_time": "11:00",
  });
  let (_, body) = post_json(&h.app, "/appointments", Some(&patient), booking).await;
  let id = body["appointment"]["id"].as_i64().unwrap();
  let uri = format!("/doctor/appointments/{id}/status");

  let (status, _) =
    post_json(&h.app, &uri, Some(&intruder), json!({ "status": "Rejected" })).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = post_json(&h.app, &uri, Some(&doctor), json!({ "status": "Pending" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    post_json(&h.app, &uri, Some(&doctor), json!({ "status": "Approved" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["appointment"]["status"], "Approved");

  let (status, _) = post_json(&h.app, &uri, Some(&doctor), json!({ "status": "Rejected" })).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, body) = get(&h.app, "/appointments", &patient).await;
  assert_eq!(body["appointments"][0]["status"], "Approved");
  assert_eq!(body["appointments"][0]["counterpart_name"], "Dr. Test");

  let (_, body) = get(&h.app, "/doctor/appointments", &doctor).await;
  assert_eq!(body["appointments"][0]["counterpart_name"], "Asha Rao");
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn disallowed_upload_writes_nothing() {
  let h = harness().await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, _) = send(&h.app, upload_request(&token, "virus.exe", b"MZ", None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  assert_eq!(std::fs::read_dir(h.uploads.path()).unwrap().count(), 0);
  let (_, body) = get(&h.app, "/documents", &token).await;
  assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn document_lifecycle() {
  let h = harness().await;
  let owner = patient_token(&h.app, "asha@example.com").await;
  let other = patient_token(&h.app, "ravi@example.com").await;

  let req = upload_request(&owner, "Lab Report.PDF", b"%PDF-1.4 test", None);
  let (status, body) = send(&h.app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  let record = &body["record"];
  let id = record["id"].as_i64().unwrap();
  let stored = record["file_name"].as_str().unwrap().to_string();
  assert!(stored.starts_with("user1_") && stored.ends_with("_Lab_Report.PDF"));
  assert_eq!(record["description"], "Lab_Report.PDF");
  assert_eq!(record["file_size"], "0.00 MB");
  assert_eq!(record["view_url"], format!("/api/documents/{id}/view"));

  let (_, body) = get(&h.app, "/documents", &owner).await;
  assert_eq!(body["total"], 1);
  let (_, body) = get(&h.app, "/documents", &other).await;
  assert_eq!(body["total"], 0);

  let view = format!("/documents/{id}/view");
  let (status, headers, bytes) =
    send_raw(&h.app, request(Method::GET, &view, Some(&owner), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
  assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().starts_with("inline"));
  assert_eq!(bytes, b"%PDF-1.4 test");

  let (status, body) = get(&h.app, &view, &other).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "record not found");

  // Drift: the row survives its file.
  std::fs::remove_file(h.uploads.path().join(&stored)).unwrap();
  let (status, body) = get(&h.app, &format!("/documents/{id}/download"), &owner).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "file not found on server");

  let (_, body) = get(&h.app, "/documents", &owner).await;
  assert!(body["records"][0].get("file_size").is_none());

  let uri = format!("/documents/{id}");
  let (status, _) = send(&h.app, request(Method::DELETE, &uri, Some(&other), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = send(&h.app, request(Method::DELETE, &uri, Some(&owner), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deleted_id"], id);
  assert!(body.get("warning").is_none());

  let (status, _) = send(&h.app, request(Method::DELETE, &uri, Some(&owner), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn undeletable_file_is_reported_as_warning() {
  let h = harness().await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, body) = send(&h.app, upload_request(&token, "scan.pdf", b"%PDF", None)).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = body["record"]["id"].as_i64().unwrap();
  let stored = h.uploads.path().join(body["record"]["file_name"].as_str().unwrap());

  // A non-empty directory in the file's place cannot be removed as a file.
  std::fs::remove_file(&stored).unwrap();
  std::fs::create_dir(&stored).unwrap();
  std::fs::write(stored.join("keep"), b"x").unwrap();

  let uri = format!("/documents/{id}");
  let (status, body) = send(&h.app, request(Method::DELETE, &uri, Some(&token), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "success");
  assert_eq!(body["deleted_id"], id);
  assert_eq!(
    body["warning"],
    "the record was deleted but its file could not be removed"
  );

  let (_, body) = get(&h.app, "/documents", &token).await;
  assert_eq!(body["total"], 0);
  assert!(stored.is_dir());
}

#[tokio::test]
async fn upload_keeps_given_description_and_serves_download() {
  let h = harness().await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let req = upload_request(&token, "xray.png", b"\x89PNG", Some("  Chest X-ray "));
  let (status, body) = send(&h.app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["record"]["description"], "Chest X-ray");
  let id = body["record"]["id"].as_i64().unwrap();

  let uri = format!("/documents/{id}/download");
  let (status, headers, _) = send_raw(&h.app, request(Method::GET, &uri, Some(&token), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(headers[header::CONTENT_TYPE], "image/png");
  assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().starts_with("attachment"));
}

// ─── Chat ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_answers_greetings_locally() {
  let h = harness().await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, body) = post_json(&h.app, "/chat", Some(&token), json!({ "message": "Hello!" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"], GREETING_REPLY);

  let (status, _) = post_json(&h.app, "/chat", Some(&token), json!({ "message": "   " })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = post_json(&h.app, "/chat", None, json!({ "message": "hi" })).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_relays_to_upstream() {
  let upstream = Router::new().route(
    "/generate",
    post(
      |Query(query): Query<std::collections::HashMap<String, String>>,
       axum::Json(body): axum::Json<Value>| async move {
        assert_eq!(query.get("key").map(String::as_str), Some("test-key"));
        assert!(body["system_instruction"]["parts"][0]["text"].is_string());
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
        axum::Json(json!({
          "candidates": [{ "content": { "parts": [{ "text": format!("echo: {text}") }] } }]
        }))
      },
    ),
  );
  let base = spawn_upstream(upstream).await;
  let assistant = Assistant::new(
    format!("{base}/generate"),
    Some("test-key".into()),
    Duration::from_secs(5),
  )
  .unwrap();
  let h = harness_with(assistant, None).await;
  let (doctor, _) = doctor_token(&h.app, "doc@example.com").await;

  let (status, body) = post_json(
    &h.app,
    "/chat",
    Some(&doctor),
    json!({ "message": "What helps a sore throat?" }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"], "echo: What helps a sore throat?");
}

#[tokio::test]
async fn chat_upstream_failure_is_bad_gateway() {
  let upstream = Router::new().route(
    "/generate",
    post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
  );
  let base = spawn_upstream(upstream).await;
  let assistant =
    Assistant::new(format!("{base}/generate"), Some("k".into()), Duration::from_secs(5)).unwrap();
  let h = harness_with(assistant, None).await;
  let token = patient_token(&h.app, "asha@example.com").await;

  let (status, body) =
    post_json(&h.app, "/chat", Some(&token), json!({ "message": "is this rash serious" })).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["status"], "error");
  assert!(!body["message"].as_str().unwrap().contains("boom"));
}

// ─── Prediction ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn prediction_unconfigured_is_unavailable() {
  let h = harness().await;
  let (status, _) = send(&h.app, request(Method::GET, "/predict/symptoms", None, None)).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

  let (status, _) = post_json(&h.app, "/predict", None, json!({ "symptoms": ["itching"] })).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn prediction_sends_feature_vector() {
  let upstream = Router::new().route(
    "/infer",
    post(|axum::Json(body): axum::Json<Value>| async move {
      let label = if body["instances"] == json!([[1, 0, 1]]) { "Fungal infection" } else { "Unknown" };
      axum::Json(json!({ "predictions": [label] }))
    }),
  );
  let base = spawn_upstream(upstream).await;
  let features = vec!["itching".to_string(), "cough".to_string(), "skin_rash".to_string()];
  let predictor = Predictor::new(features, format!("{base}/infer"), Duration::from_secs(5)).unwrap();
  let assistant = Assistant::new(DEAD_URL, None, Duration::from_secs(1)).unwrap();
  let h = harness_with(assistant, Some(predictor)).await;

  let (status, body) = send(&h.app, request(Method::GET, "/predict/symptoms", None, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["symptoms"], json!(["itching", "cough", "skin_rash"]));

  let (status, body) = post_json(
    &h.app,
    "/predict",
    None,
    json!({ "symptoms": ["skin_rash", "itching"] }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Predicted Disease: Fungal infection");
}
