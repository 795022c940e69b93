//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microseconds,
//! `Z` suffix) so that text order is time order; appointment dates as
//! `YYYY-MM-DD` and times as `HH:MM`. Multi-value query parameters are bound
//! as a single JSON array and expanded with `json_each`.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use clinic_core::{
  appointment::{Appointment, AppointmentListing, AppointmentStatus, DATE_FORMAT, TIME_FORMAT},
  catalog::{Recommendation, RecommendationKind},
  document::UploadedDocument,
  history::HealthHistoryEntry,
  people::{Doctor, Patient},
  session::{Principal, Session},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_status(s: &str) -> Result<AppointmentStatus> {
  AppointmentStatus::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

fn decode_count(column: &'static str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::UnknownValue { column, value: n.to_string() })
}

/// Encode a list of values as the JSON array bound to `json_each(?)`.
pub fn encode_list<T: serde::Serialize>(values: &[T]) -> Result<String> {
  Ok(serde_json::to_string(values)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a doctor, joined with the specialty name.
pub const DOCTOR_SELECT: &str = "
  SELECT d.doctor_id, d.name, d.email, d.specialty_id, s.specialty_name,
         d.rating, d.experience, d.availability, d.biography
  FROM doctors d
  LEFT JOIN specialties s ON s.specialty_id = d.specialty_id";

pub struct RawDoctor {
  pub doctor_id:      i64,
  pub name:           String,
  pub email:          String,
  pub specialty_id:   Option<i64>,
  pub specialty_name: Option<String>,
  pub rating:         f64,
  pub experience:     i64,
  pub availability:   String,
  pub biography:      Option<String>,
}

impl RawDoctor {
  /// Map a row produced by [`DOCTOR_SELECT`] (plus any trailing columns).
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      doctor_id:      row.get(0)?,
      name:           row.get(1)?,
      email:          row.get(2)?,
      specialty_id:   row.get(3)?,
      specialty_name: row.get(4)?,
      rating:         row.get(5)?,
      experience:     row.get(6)?,
      availability:   row.get(7)?,
      biography:      row.get(8)?,
    })
  }

  pub fn into_doctor(self) -> Result<Doctor> {
    Ok(Doctor {
      id:               self.doctor_id,
      name:             self.name,
      email:            self.email,
      specialty_id:     self.specialty_id,
      specialty_name:   self.specialty_name,
      rating:           self.rating,
      experience_years: decode_count("experience", self.experience)?,
      availability:     self.availability,
      biography:        self.biography,
    })
  }
}

pub struct RawPatient {
  pub patient_id: i64,
  pub name:       String,
  pub email:      String,
  pub created_at: String,
}

impl RawPatient {
  pub fn into_patient(self) -> Result<Patient> {
    Ok(Patient {
      id:         self.patient_id,
      name:       self.name,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawRecommendation {
  pub rec_id:       i64,
  pub rec_name:     String,
  pub rec_type:     String,
  pub instructions: String,
  pub disclaimer:   Option<String>,
}

impl RawRecommendation {
  pub fn into_recommendation(self) -> Result<Recommendation> {
    let kind = RecommendationKind::from_label(&self.rec_type).ok_or_else(|| {
      Error::UnknownValue { column: "rec_type", value: self.rec_type.clone() }
    })?;
    Ok(Recommendation {
      id:           self.rec_id,
      name:         self.rec_name,
      kind,
      instructions: self.instructions,
      disclaimer:   self.disclaimer,
    })
  }
}

/// Columns selected for an appointment.
pub const APPOINTMENT_COLUMNS: &str = "
  a.appointment_id, a.patient_id, a.doctor_id, a.appointment_date,
  a.appointment_time, a.status, a.reason, a.created_at";

pub struct RawAppointment {
  pub appointment_id:   i64,
  pub patient_id:       i64,
  pub doctor_id:        i64,
  pub appointment_date: String,
  pub appointment_time: String,
  pub status:           String,
  pub reason:           Option<String>,
  pub created_at:       String,
}

impl RawAppointment {
  /// Map a row whose first columns are [`APPOINTMENT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appointment_id:   row.get(0)?,
      patient_id:       row.get(1)?,
      doctor_id:        row.get(2)?,
      appointment_date: row.get(3)?,
      appointment_time: row.get(4)?,
      status:           row.get(5)?,
      reason:           row.get(6)?,
      created_at:       row.get(7)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      id:         self.appointment_id,
      patient_id: self.patient_id,
      doctor_id:  self.doctor_id,
      date:       decode_date(&self.appointment_date)?,
      time:       decode_time(&self.appointment_time)?,
      status:     decode_status(&self.status)?,
      reason:     self.reason,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_listing(self, counterpart_name: String) -> Result<AppointmentListing> {
    Ok(AppointmentListing { appointment: self.into_appointment()?, counterpart_name })
  }
}

pub struct RawHistoryEntry {
  pub entry_id:             i64,
  pub patient_id:           i64,
  pub symptom_summary:      String,
  pub recommendation_count: i64,
  pub doctor_count:         i64,
  pub recorded_at:          String,
}

impl RawHistoryEntry {
  pub fn into_entry(self) -> Result<HealthHistoryEntry> {
    Ok(HealthHistoryEntry {
      id:                   self.entry_id,
      patient_id:           self.patient_id,
      symptom_summary:      self.symptom_summary,
      recommendation_count: decode_count("recommendation_count", self.recommendation_count)?,
      doctor_count:         decode_count("doctor_count", self.doctor_count)?,
      recorded_at:          decode_dt(&self.recorded_at)?,
    })
  }
}

pub const DOCUMENT_COLUMNS: &str =
  "record_id, patient_id, file_name, description, upload_date";

pub struct RawDocument {
  pub record_id:   i64,
  pub patient_id:  i64,
  pub file_name:   String,
  pub description: Option<String>,
  pub upload_date: String,
}

impl RawDocument {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:   row.get(0)?,
      patient_id:  row.get(1)?,
      file_name:   row.get(2)?,
      description: row.get(3)?,
      upload_date: row.get(4)?,
    })
  }

  pub fn into_document(self) -> Result<UploadedDocument> {
    Ok(UploadedDocument {
      id:          self.record_id,
      patient_id:  self.patient_id,
      file_name:   self.file_name,
      description: self.description,
      uploaded_at: decode_dt(&self.upload_date)?,
    })
  }
}

pub struct RawSession {
  pub token_digest: String,
  pub principal:    String,
  pub principal_id: i64,
  pub created_at:   String,
  pub expires_at:   String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    let principal = Principal::from_parts(&self.principal, self.principal_id)
      .ok_or_else(|| Error::UnknownValue { column: "principal", value: self.principal.clone() })?;
    Ok(Session {
      token_digest: self.token_digest,
      principal,
      created_at:   decode_dt(&self.created_at)?,
      expires_at:   decode_dt(&self.expires_at)?,
    })
  }
}
