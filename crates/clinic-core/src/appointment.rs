//! Appointments and their one-way status machine.
//!
//! An appointment is booked as [`AppointmentStatus::Pending`] and moves
//! exactly once to a terminal state, by the doctor it was booked with.
//! Nothing in the service moves it back.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
  Pending,
  Approved,
  Rejected,
}

impl AppointmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "Pending",
      Self::Approved => "Approved",
      Self::Rejected => "Rejected",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "Pending" => Some(Self::Pending),
      "Approved" => Some(Self::Approved),
      "Rejected" => Some(Self::Rejected),
      _ => None,
    }
  }
}

/// The only two transitions a doctor can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Approve,
  Reject,
}

impl Decision {
  /// Parse a requested target status. `Pending` and anything unknown are
  /// rejected: appointments are never moved back.
  pub fn parse(status: &str) -> Result<Self> {
    match AppointmentStatus::parse(status.trim()) {
      Some(AppointmentStatus::Approved) => Ok(Self::Approve),
      Some(AppointmentStatus::Rejected) => Ok(Self::Reject),
      _ => Err(Error::InvalidStatus(status.to_string())),
    }
  }

  pub fn target(self) -> AppointmentStatus {
    match self {
      Self::Approve => AppointmentStatus::Approved,
      Self::Reject => AppointmentStatus::Rejected,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
  pub id:         i64,
  pub patient_id: i64,
  pub doctor_id:  i64,
  pub date:       NaiveDate,
  #[serde(with = "hh_mm")]
  pub time:       NaiveTime,
  pub status:     AppointmentStatus,
  pub reason:     Option<String>,
  pub created_at: DateTime<Utc>,
}

/// An appointment joined with the name of the other party, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentListing {
  #[serde(flatten)]
  pub appointment:      Appointment,
  /// Doctor's name in a patient's listing, patient's name in a doctor's.
  pub counterpart_name: String,
}

/// Validated input to [`crate::store::ClinicStore::book_appointment`].
#[derive(Debug, Clone)]
pub struct NewAppointment {
  pub patient_id: i64,
  pub doctor_id:  i64,
  pub date:       NaiveDate,
  pub time:       NaiveTime,
  pub reason:     Option<String>,
}

/// Raw booking form as submitted by a patient; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
  pub doctor_id:        Option<i64>,
  pub appointment_date: Option<String>,
  pub appointment_time: Option<String>,
  pub reason:           Option<String>,
}

impl BookingForm {
  /// Check required fields and formats. Nothing is written on failure.
  pub fn validate(self, patient_id: i64) -> Result<NewAppointment> {
    let doctor_id = self.doctor_id.ok_or(Error::MissingField("doctor_id"))?;
    let date_raw  = required(self.appointment_date, "appointment_date")?;
    let time_raw  = required(self.appointment_time, "appointment_time")?;

    let date = NaiveDate::parse_from_str(&date_raw, DATE_FORMAT)
      .map_err(|_| Error::InvalidDate(date_raw.clone()))?;
    let time = NaiveTime::parse_from_str(&time_raw, TIME_FORMAT)
      .map_err(|_| Error::InvalidTime(time_raw.clone()))?;

    let reason = self
      .reason
      .map(|r| r.trim().to_string())
      .filter(|r| !r.is_empty());

    Ok(NewAppointment { patient_id, doctor_id, date, time, reason })
  }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
    .ok_or(Error::MissingField(field))
}

/// Outcome of [`crate::store::ClinicStore::decide_appointment`].
#[derive(Debug, Clone)]
pub enum Transition {
  /// The appointment was pending and now carries the new status.
  Applied(Appointment),
  /// No appointment with this id belongs to the acting doctor.
  NotFound,
  /// The appointment already reached a terminal state; it is unchanged.
  AlreadyDecided(Appointment),
}

/// Serialise times as `HH:MM`, the format patients submit.
mod hh_mm {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer};

  use super::TIME_FORMAT;

  pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&t.format(TIME_FORMAT))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(d)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form() -> BookingForm {
    BookingForm {
      doctor_id:        Some(1),
      appointment_date: Some("2025-11-15".into()),
      appointment_time: Some("11:00".into()),
      reason:           Some("  ".into()),
    }
  }

  #[test]
  fn valid_form_parses() {
    let appt = form().validate(7).unwrap();
    assert_eq!(appt.patient_id, 7);
    assert_eq!(appt.date, NaiveDate::from_ymd_opt(2025, 11, 15).unwrap());
    assert_eq!(appt.time, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
    assert_eq!(appt.reason, None);
  }

  #[test]
  fn missing_time_is_rejected() {
    let f = BookingForm { appointment_time: None, ..form() };
    assert!(matches!(f.validate(1), Err(Error::MissingField("appointment_time"))));

    let f = BookingForm { appointment_time: Some(" ".into()), ..form() };
    assert!(matches!(f.validate(1), Err(Error::MissingField("appointment_time"))));
  }

  #[test]
  fn malformed_date_is_rejected() {
    let f = BookingForm { appointment_date: Some("15/11/2025".into()), ..form() };
    assert!(matches!(f.validate(1), Err(Error::InvalidDate(_))));
  }

  #[test]
  fn decisions_never_target_pending() {
    assert_eq!(Decision::parse("Approved").unwrap(), Decision::Approve);
    assert_eq!(Decision::parse("Rejected").unwrap().target(), AppointmentStatus::Rejected);
    assert!(matches!(Decision::parse("Pending"), Err(Error::InvalidStatus(_))));
    assert!(matches!(Decision::parse("approved"), Err(Error::InvalidStatus(_))));
  }
}
