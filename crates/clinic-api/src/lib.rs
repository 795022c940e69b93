//! JSON REST API for the clinic.
//!
//! Exposes an axum [`Router`] backed by any [`clinic_core::store::ClinicStore`].
//! Callers authenticate with `Authorization: Bearer <token>` obtained from one
//! of the login routes. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest(clinic_api::API_PREFIX, clinic_api::api_router(state))
//! ```

pub mod accounts;
pub mod analysis;
pub mod appointments;
pub mod auth;
pub mod chat;
pub mod directory;
pub mod documents;
pub mod error;
pub mod files;
pub mod predict;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use clinic_core::store::ClinicStore;

pub use error::ApiError;

use crate::{chat::Assistant, files::DocumentFiles, predict::Predictor};

/// Path the router is expected to be nested under; used to build the URLs
/// handed back to clients.
pub const API_PREFIX: &str = "/api";

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:       Arc<S>,
  pub files:       DocumentFiles,
  pub assistant:   Assistant,
  /// `None` when no feature list or inference endpoint is configured.
  pub predictor:   Option<Arc<Predictor>>,
  pub session_ttl: chrono::Duration,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ClinicStore + Clone + 'static,
{
  Router::new()
    // Accounts
    .route("/patients/register", post(accounts::register_patient::<S>))
    .route("/patients/login", post(accounts::login_patient::<S>))
    .route("/doctors/register", post(accounts::register_doctor::<S>))
    .route("/doctors/login", post(accounts::login_doctor::<S>))
    .route("/logout", post(accounts::logout::<S>))
    // Directory
    .route("/specialties", get(directory::specialties::<S>))
    .route("/doctors", get(directory::doctors::<S>))
    .route(
      "/doctor/profile",
      get(directory::profile::<S>).put(directory::update_profile::<S>),
    )
    // Analysis
    .route("/analysis", post(analysis::analyze::<S>))
    .route("/history", get(analysis::history::<S>))
    // Appointments
    .route(
      "/appointments",
      get(appointments::list_mine::<S>).post(appointments::book::<S>),
    )
    .route("/doctor/appointments", get(appointments::list_for_doctor::<S>))
    .route("/doctor/appointments/{id}/status", post(appointments::decide::<S>))
    // Documents
    .route("/documents", get(documents::list::<S>).post(documents::upload::<S>))
    .route("/documents/{id}", delete(documents::delete::<S>))
    .route("/documents/{id}/view", get(documents::view::<S>))
    .route("/documents/{id}/download", get(documents::download::<S>))
    // Chat and prediction
    .route("/chat", post(chat::handler::<S>))
    .route("/predict/symptoms", get(predict::symptoms::<S>))
    .route("/predict", post(predict::handler::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
