//! The `ClinicStore` trait.
//!
//! Implemented by storage backends (e.g. `clinic-store-sqlite`). The resolver
//! and the HTTP layer depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  appointment::{Appointment, AppointmentListing, Decision, NewAppointment, Transition},
  catalog::{Recommendation, Specialty, Symptom},
  document::{NewDocument, UploadedDocument},
  history::{HealthHistoryEntry, NewHistoryEntry},
  people::{Account, Doctor, NewDoctor, NewPatient, Patient, ProfileUpdate, Registration},
  session::Session,
};

/// Abstraction over a clinic store backend.
///
/// Every method is one short unit of work; no method holds a transaction
/// open across calls. Multi-value lookups take owned vectors and must bind
/// every value as a parameter.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ClinicStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  /// Symptoms whose name equals (ignoring case) one of `names`, which are
  /// expected to be lower-case already. Ordered by id.
  fn find_symptoms(
    &self,
    names: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Symptom>, Self::Error>> + Send + '_;

  /// Distinct recommendations linked to any of `symptom_ids`, ordered by
  /// stored type label, then name.
  fn recommendations_for(
    &self,
    symptom_ids: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<Recommendation>, Self::Error>> + Send + '_;

  /// Distinct specialties linked to any of `symptom_ids`, ordered by id.
  fn specialties_for(
    &self,
    symptom_ids: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<Specialty>, Self::Error>> + Send + '_;

  fn list_specialties(
    &self,
  ) -> impl Future<Output = Result<Vec<Specialty>, Self::Error>> + Send + '_;

  fn get_specialty(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Specialty>, Self::Error>> + Send + '_;

  // ── Patients ──────────────────────────────────────────────────────────

  fn register_patient(
    &self,
    input: NewPatient,
  ) -> impl Future<Output = Result<Registration<Patient>, Self::Error>> + Send + '_;

  /// Look up a patient by (case-insensitive) email for login.
  fn patient_account(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account<Patient>>, Self::Error>> + Send + '_;

  // ── Doctors ───────────────────────────────────────────────────────────

  fn register_doctor(
    &self,
    input: NewDoctor,
  ) -> impl Future<Output = Result<Registration<Doctor>, Self::Error>> + Send + '_;

  /// Look up a doctor by (case-insensitive) email for login.
  fn doctor_account(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account<Doctor>>, Self::Error>> + Send + '_;

  fn get_doctor(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Doctor>, Self::Error>> + Send + '_;

  /// All doctors, ordered by name.
  fn list_doctors(
    &self,
  ) -> impl Future<Output = Result<Vec<Doctor>, Self::Error>> + Send + '_;

  /// Doctors filed under any of `specialty_ids`, ordered by id. Callers
  /// apply the rating/experience ordering.
  fn doctors_in(
    &self,
    specialty_ids: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<Doctor>, Self::Error>> + Send + '_;

  /// Apply a profile update. Returns `None` if the doctor does not exist.
  fn update_doctor_profile(
    &self,
    id: i64,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Doctor>, Self::Error>> + Send + '_;

  // ── Appointments ──────────────────────────────────────────────────────

  /// Append a new `Pending` appointment.
  fn book_appointment(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  fn get_appointment(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  /// A patient's appointments with doctor names, newest slot first.
  fn patient_appointments(
    &self,
    patient_id: i64,
  ) -> impl Future<Output = Result<Vec<AppointmentListing>, Self::Error>> + Send + '_;

  /// A doctor's appointments with patient names, newest slot first.
  fn doctor_appointments(
    &self,
    doctor_id: i64,
  ) -> impl Future<Output = Result<Vec<AppointmentListing>, Self::Error>> + Send + '_;

  /// Move a pending appointment owned by `doctor_id` to the decision's
  /// terminal state. Must be a single conditional write so a terminal
  /// appointment is never overwritten.
  fn decide_appointment(
    &self,
    id: i64,
    doctor_id: i64,
    decision: Decision,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  // ── Health history ────────────────────────────────────────────────────

  fn record_history(
    &self,
    input: NewHistoryEntry,
  ) -> impl Future<Output = Result<HealthHistoryEntry, Self::Error>> + Send + '_;

  /// A patient's history, newest first.
  fn list_history(
    &self,
    patient_id: i64,
  ) -> impl Future<Output = Result<Vec<HealthHistoryEntry>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  fn add_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<UploadedDocument, Self::Error>> + Send + '_;

  /// A patient's documents, newest first.
  fn list_documents(
    &self,
    patient_id: i64,
  ) -> impl Future<Output = Result<Vec<UploadedDocument>, Self::Error>> + Send + '_;

  /// Owner-scoped lookup: `None` if missing or owned by someone else.
  fn get_document(
    &self,
    id: i64,
    patient_id: i64,
  ) -> impl Future<Output = Result<Option<UploadedDocument>, Self::Error>> + Send + '_;

  /// Owner-scoped delete. Returns the removed row, or `None` if nothing
  /// owned by `patient_id` matched.
  fn delete_document(
    &self,
    id: i64,
    patient_id: i64,
  ) -> impl Future<Output = Result<Option<UploadedDocument>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Find a session by token digest that is still live at `now`.
  fn find_session(
    &self,
    token_digest: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  fn delete_session(
    &self,
    token_digest: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
