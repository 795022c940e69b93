//! Health-assistant chat relay.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/chat` | Any session. Body: `{"message":"…"}` |
//!
//! Greetings are answered locally; everything else is forwarded to a
//! generative-language `generateContent` endpoint with a fixed system
//! instruction.

use std::time::Duration;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use clinic_core::store::ClinicStore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{AppState, auth::AnySession, error::ApiError};

const SYSTEM_INSTRUCTION: &str = "You are a friendly and knowledgeable AI Health Assistant. \
  You can discuss topics such as symptoms, diseases, first aid, nutrition, mental health, \
  wellness, and healthcare advice. If the user asks something unrelated to health (like \
  programming, jokes, politics, etc.), reply: 'I'm sorry, I can only talk about health and \
  wellness topics.' Always provide clear, simple, and supportive answers. End every \
  health-related response with: 'Note: I'm not a doctor. Please consult a healthcare \
  professional for an accurate diagnosis.'";

pub const GREETING_REPLY: &str =
  "Hello! I'm your Smart Health Assistant. How are you feeling today?";

const GREETINGS: &[&str] = &[
  "hi",
  "hello",
  "hey",
  "good morning",
  "good afternoon",
  "good evening",
  "how are you",
];

/// `true` if the whole message is one of the canned greetings, ignoring
/// case, surrounding whitespace and trailing punctuation.
pub fn is_greeting(message: &str) -> bool {
  let trimmed = message
    .trim()
    .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
    .to_lowercase();
  let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
  GREETINGS.contains(&collapsed.as_str())
}

// ─── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChatError {
  #[error("no API key configured")]
  NotConfigured,

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("reply contained no text")]
  EmptyReply,
}

/// Client for the upstream generative-language API.
#[derive(Debug, Clone)]
pub struct Assistant {
  client:  reqwest::Client,
  api_url: String,
  api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  system_instruction: Content<'a>,
  contents:           [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  role:  Option<&'a str>,
  parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

impl Assistant {
  pub fn new(
    api_url: impl Into<String>,
    api_key: Option<String>,
    timeout: Duration,
  ) -> Result<Self, ChatError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_url: api_url.into(),
      api_key: api_key.filter(|k| !k.is_empty()),
    })
  }

  /// Ask the upstream model and return the first text part of the first
  /// candidate.
  pub async fn reply(&self, message: &str) -> Result<String, ChatError> {
    let key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;
    let body = GenerateRequest {
      system_instruction: Content {
        role:  None,
        parts: [TextPart { text: SYSTEM_INSTRUCTION }],
      },
      contents: [Content {
        role:  Some("user"),
        parts: [TextPart { text: message }],
      }],
    };

    let response: GenerateResponse = self
      .client
      .post(&self.api_url)
      .query(&[("key", key)])
      .json(&body)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    response
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content.parts.into_iter().next())
      .and_then(|p| p.text)
      .filter(|t| !t.trim().is_empty())
      .ok_or(ChatError::EmptyReply)
  }
}

// ─── Handler ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  #[serde(default)]
  pub message: String,
}

/// `POST /chat`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  session: AnySession,
  payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ClinicStore + Clone + 'static,
{
  let Json(body) = payload?;
  let message = body.message.trim();
  if message.is_empty() {
    return Err(ApiError::BadRequest("empty message".into()));
  }

  if is_greeting(message) {
    return Ok(Json(json!({ "status": "success", "response": GREETING_REPLY })));
  }

  match state.assistant.reply(message).await {
    Ok(text) => Ok(Json(json!({ "status": "success", "response": text }))),
    Err(e) => {
      tracing::warn!(principal = ?session.principal, error = %e, "chat upstream failed");
      Err(ApiError::Upstream("the health assistant is unavailable right now".into()))
    }
  }
}
