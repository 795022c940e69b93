//! Patients and doctors, the two kinds of account.
//!
//! Credentials never live on these types; stores hand the stored password
//! hash out separately through [`Account`] so a profile can be serialised
//! without leaking it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Patients ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
  pub id:         i64,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ClinicStore::register_patient`].
#[derive(Debug, Clone)]
pub struct NewPatient {
  pub name:          String,
  pub email:         String,
  /// Argon2 PHC string; plaintext never reaches the store.
  pub password_hash: String,
}

// ─── Doctors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
  pub id:               i64,
  pub name:             String,
  pub email:            String,
  pub specialty_id:     Option<i64>,
  /// Resolved from `specialty_id`; `None` when no specialty is set.
  pub specialty_name:   Option<String>,
  pub rating:           f64,
  pub experience_years: u32,
  /// Free text such as `"Online/10:00-14:00"`.
  pub availability:     String,
  pub biography:        Option<String>,
}

/// Input to [`crate::store::ClinicStore::register_doctor`].
#[derive(Debug, Clone)]
pub struct NewDoctor {
  pub name:             String,
  pub email:            String,
  pub password_hash:    String,
  pub specialty_id:     Option<i64>,
  pub rating:           f64,
  pub experience_years: u32,
  pub availability:     String,
  pub biography:        Option<String>,
}

impl NewDoctor {
  /// A freshly registered doctor: unrated, no experience on file.
  pub fn new(
    name: impl Into<String>,
    email: impl Into<String>,
    password_hash: impl Into<String>,
  ) -> Self {
    Self {
      name:             name.into(),
      email:            email.into(),
      password_hash:    password_hash.into(),
      specialty_id:     None,
      rating:           0.0,
      experience_years: 0,
      availability:     "Available".to_string(),
      biography:        None,
    }
  }
}

/// Fields a doctor may change on their own profile. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub name:             Option<String>,
  pub specialty_id:     Option<i64>,
  pub availability:     Option<String>,
  pub biography:        Option<String>,
  pub experience_years: Option<u32>,
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A profile together with the stored password hash, as returned by the
/// login lookups.
#[derive(Debug, Clone)]
pub struct Account<T> {
  pub profile:       T,
  pub password_hash: String,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone)]
pub enum Registration<T> {
  Created(T),
  /// Another account already uses this email address.
  EmailTaken,
}

/// Capitalise the first letter of every whitespace-separated word and
/// lower-case the rest.
pub fn title_case(s: &str) -> String {
  s.split_whitespace()
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first
          .to_uppercase()
          .chain(chars.flat_map(char::to_lowercase))
          .collect::<String>(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}
