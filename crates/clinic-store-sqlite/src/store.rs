//! [`SqliteStore`]: the SQLite implementation of [`ClinicStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use clinic_core::{
  appointment::{
    Appointment, AppointmentListing, AppointmentStatus, Decision, NewAppointment, Transition,
  },
  catalog::{Recommendation, Specialty, Symptom},
  document::{NewDocument, UploadedDocument},
  history::{HealthHistoryEntry, NewHistoryEntry},
  people::{Account, Doctor, NewDoctor, NewPatient, Patient, ProfileUpdate, Registration},
  session::Session,
  store::ClinicStore,
};
use rusqlite::{ErrorCode, OptionalExtension as _, params};

use crate::{
  Result,
  encode::{
    APPOINTMENT_COLUMNS, DOCTOR_SELECT, DOCUMENT_COLUMNS, RawAppointment, RawDoctor,
    RawDocument, RawHistoryEntry, RawPatient, RawRecommendation, RawSession,
    encode_date, encode_dt, encode_list, encode_time,
  },
  schema::SCHEMA,
  seed::{DEMO_DOCTORS, demo_biography, seed_reference_data, specialty_name},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A clinic store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// `true` if `e` is a UNIQUE/CHECK/FOREIGN KEY violation.
fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
  )
}

impl SqliteStore {
  /// Open (or create) a store at `path`, run schema initialisation and seed
  /// the reference data.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        seed_reference_data(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register the demo doctor directory, all sharing `password_hash`.
  /// Doctors whose email is already registered are skipped. Returns the
  /// number of doctors inserted.
  pub async fn seed_demo_doctors(&self, password_hash: String) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO doctors
               (name, email, password_hash, specialty_id, rating, experience,
                availability, biography)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          for (name, specialty_id, rating, experience, availability, email) in DEMO_DOCTORS {
            let biography =
              demo_biography(name, specialty_name(*specialty_id), *experience, availability);
            inserted += stmt.execute(params![
              name,
              email,
              password_hash,
              specialty_id,
              rating,
              experience,
              availability,
              biography,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  /// Remove sessions that expired at or before `now`.
  pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
    let now = encode_dt(now);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?)
      })
      .await?;
    Ok(removed)
  }

  async fn fetch_appointment_listings(
    &self,
    sql: &'static str,
    owner_id: i64,
  ) -> Result<Vec<AppointmentListing>> {
    let raws: Vec<(RawAppointment, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(params![owner_id], |row| Ok((RawAppointment::from_row(row)?, row.get(8)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, name)| raw.into_listing(name))
      .collect()
  }
}

// ─── ClinicStore impl ────────────────────────────────────────────────────────

impl ClinicStore for SqliteStore {
  type Error = crate::Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn find_symptoms(&self, names: Vec<String>) -> Result<Vec<Symptom>> {
    let list = encode_list(&names)?;

    let symptoms = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT symptom_id, symptom_name, description, doctor_advice, priority
           FROM symptoms
           WHERE LOWER(symptom_name) IN (SELECT value FROM json_each(?1))
           ORDER BY symptom_id",
        )?;
        let rows = stmt
          .query_map(params![list], |row| {
            Ok(Symptom {
              id:          row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
              advice:      row.get(3)?,
              priority:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(symptoms)
  }

  async fn recommendations_for(&self, symptom_ids: Vec<i64>) -> Result<Vec<Recommendation>> {
    let list = encode_list(&symptom_ids)?;

    let raws: Vec<RawRecommendation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT r.rec_id, r.rec_name, r.rec_type, r.instructions, r.disclaimer
           FROM symptom_recommendations m
           JOIN recommendations r ON r.rec_id = m.rec_id
           WHERE m.symptom_id IN (SELECT value FROM json_each(?1))
           ORDER BY r.rec_type, r.rec_name",
        )?;
        let rows = stmt
          .query_map(params![list], |row| {
            Ok(RawRecommendation {
              rec_id:       row.get(0)?,
              rec_name:     row.get(1)?,
              rec_type:     row.get(2)?,
              instructions: row.get(3)?,
              disclaimer:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecommendation::into_recommendation).collect()
  }

  async fn specialties_for(&self, symptom_ids: Vec<i64>) -> Result<Vec<Specialty>> {
    let list = encode_list(&symptom_ids)?;

    let specialties = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT s.specialty_id, s.specialty_name, s.description
           FROM symptom_specialties m
           JOIN specialties s ON s.specialty_id = m.specialty_id
           WHERE m.symptom_id IN (SELECT value FROM json_each(?1))
           ORDER BY s.specialty_id",
        )?;
        let rows = stmt
          .query_map(params![list], |row| {
            Ok(Specialty {
              id:          row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(specialties)
  }

  async fn list_specialties(&self) -> Result<Vec<Specialty>> {
    let specialties = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT specialty_id, specialty_name, description
           FROM specialties ORDER BY specialty_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Specialty {
              id:          row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(specialties)
  }

  async fn get_specialty(&self, id: i64) -> Result<Option<Specialty>> {
    let specialty = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT specialty_id, specialty_name, description
             FROM specialties WHERE specialty_id = ?1",
            params![id],
            |row| {
              Ok(Specialty {
                id:          row.get(0)?,
                name:        row.get(1)?,
                description: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    Ok(specialty)
  }

  // ── Patients ──────────────────────────────────────────────────────────────

  async fn register_patient(&self, input: NewPatient) -> Result<Registration<Patient>> {
    let created_at = encode_dt(Utc::now());

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO patients (name, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![input.name, input.email, input.password_hash, created_at],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => return Ok(None),
          Err(e) => return Err(e.into()),
        }
        Ok(Some(RawPatient {
          patient_id: conn.last_insert_rowid(),
          name:       input.name,
          email:      input.email,
          created_at,
        }))
      })
      .await?;

    match raw {
      Some(raw) => Ok(Registration::Created(raw.into_patient()?)),
      None => Ok(Registration::EmailTaken),
    }
  }

  async fn patient_account(&self, email: String) -> Result<Option<Account<Patient>>> {
    let raw: Option<(RawPatient, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT patient_id, name, email, created_at, password_hash
             FROM patients WHERE email = ?1",
            params![email],
            |row| {
              Ok((
                RawPatient {
                  patient_id: row.get(0)?,
                  name:       row.get(1)?,
                  email:      row.get(2)?,
                  created_at: row.get(3)?,
                },
                row.get(4)?,
              ))
            },
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(raw, password_hash)| {
        Ok(Account { profile: raw.into_patient()?, password_hash })
      })
      .transpose()
  }

  // ── Doctors ───────────────────────────────────────────────────────────────

  async fn register_doctor(&self, input: NewDoctor) -> Result<Registration<Doctor>> {
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO doctors
             (name, email, password_hash, specialty_id, rating, experience,
              availability, biography)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            input.name,
            input.email,
            input.password_hash,
            input.specialty_id,
            input.rating,
            input.experience_years,
            input.availability,
            input.biography,
          ],
        );
        match inserted {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_constraint_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let Some(id) = id else {
      return Ok(Registration::EmailTaken);
    };
    match self.get_doctor(id).await? {
      Some(doctor) => Ok(Registration::Created(doctor)),
      None => Err(crate::Error::UnknownValue { column: "doctor_id", value: id.to_string() }),
    }
  }

  async fn doctor_account(&self, email: String) -> Result<Option<Account<Doctor>>> {
    let raw: Option<(RawDoctor, String)> = self
      .conn
      .call(move |conn| {
        let sql = format!("{DOCTOR_SELECT} WHERE d.email = ?1");
        let hash_sql = "SELECT password_hash FROM doctors WHERE email = ?1";
        let doctor = conn
          .query_row(&sql, params![email], RawDoctor::from_row)
          .optional()?;
        let Some(doctor) = doctor else { return Ok(None) };
        let hash: String = conn.query_row(hash_sql, params![email], |r| r.get(0))?;
        Ok(Some((doctor, hash)))
      })
      .await?;

    raw
      .map(|(raw, password_hash)| Ok(Account { profile: raw.into_doctor()?, password_hash }))
      .transpose()
  }

  async fn get_doctor(&self, id: i64) -> Result<Option<Doctor>> {
    let raw: Option<RawDoctor> = self
      .conn
      .call(move |conn| {
        let sql = format!("{DOCTOR_SELECT} WHERE d.doctor_id = ?1");
        Ok(conn.query_row(&sql, params![id], RawDoctor::from_row).optional()?)
      })
      .await?;

    raw.map(RawDoctor::into_doctor).transpose()
  }

  async fn list_doctors(&self) -> Result<Vec<Doctor>> {
    let raws: Vec<RawDoctor> = self
      .conn
      .call(|conn| {
        let sql = format!("{DOCTOR_SELECT} ORDER BY d.name, d.doctor_id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawDoctor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDoctor::into_doctor).collect()
  }

  async fn doctors_in(&self, specialty_ids: Vec<i64>) -> Result<Vec<Doctor>> {
    let list = encode_list(&specialty_ids)?;

    let raws: Vec<RawDoctor> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{DOCTOR_SELECT}
           WHERE d.specialty_id IN (SELECT value FROM json_each(?1))
           ORDER BY d.doctor_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![list], RawDoctor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDoctor::into_doctor).collect()
  }

  async fn update_doctor_profile(
    &self,
    id: i64,
    update: ProfileUpdate,
  ) -> Result<Option<Doctor>> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE doctors SET
             name         = COALESCE(?1, name),
             specialty_id = COALESCE(?2, specialty_id),
             availability = COALESCE(?3, availability),
             biography    = COALESCE(?4, biography),
             experience   = COALESCE(?5, experience)
           WHERE doctor_id = ?6",
          params![
            update.name,
            update.specialty_id,
            update.availability,
            update.biography,
            update.experience_years,
            id,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_doctor(id).await
  }

  // ── Appointments ──────────────────────────────────────────────────────────

  async fn book_appointment(&self, input: NewAppointment) -> Result<Appointment> {
    let created_at = Utc::now();
    let date_str   = encode_date(input.date);
    let time_str   = encode_time(input.time);
    let at_str     = encode_dt(created_at);
    let reason     = input.reason.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO appointments
             (patient_id, doctor_id, appointment_date, appointment_time, status, reason, created_at)
           VALUES (?1, ?2, ?3, ?4, 'Pending', ?5, ?6)",
          params![input.patient_id, input.doctor_id, date_str, time_str, reason, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Appointment {
      id,
      patient_id: input.patient_id,
      doctor_id:  input.doctor_id,
      date:       input.date,
      time:       input.time,
      status:     AppointmentStatus::Pending,
      reason:     input.reason,
      created_at,
    })
  }

  async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>> {
    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.appointment_id = ?1");
        Ok(conn.query_row(&sql, params![id], RawAppointment::from_row).optional()?)
      })
      .await?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn patient_appointments(&self, patient_id: i64) -> Result<Vec<AppointmentListing>> {
    const SQL: &str = "
      SELECT a.appointment_id, a.patient_id, a.doctor_id, a.appointment_date,
             a.appointment_time, a.status, a.reason, a.created_at, d.name
      FROM appointments a
      JOIN doctors d ON d.doctor_id = a.doctor_id
      WHERE a.patient_id = ?1
      ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.appointment_id DESC";
    self.fetch_appointment_listings(SQL, patient_id).await
  }

  async fn doctor_appointments(&self, doctor_id: i64) -> Result<Vec<AppointmentListing>> {
    const SQL: &str = "
      SELECT a.appointment_id, a.patient_id, a.doctor_id, a.appointment_date,
             a.appointment_time, a.status, a.reason, a.created_at, p.name
      FROM appointments a
      JOIN patients p ON p.patient_id = a.patient_id
      WHERE a.doctor_id = ?1
      ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.appointment_id DESC";
    self.fetch_appointment_listings(SQL, doctor_id).await
  }

  async fn decide_appointment(
    &self,
    id: i64,
    doctor_id: i64,
    decision: Decision,
  ) -> Result<Transition> {
    let target = decision.target().as_str();

    let (changed, raw): (usize, Option<RawAppointment>) = self
      .conn
      .call(move |conn| {
        // Conditional on 'Pending': a terminal status is never overwritten.
        let changed = conn.execute(
          "UPDATE appointments SET status = ?1
           WHERE appointment_id = ?2 AND doctor_id = ?3 AND status = 'Pending'",
          params![target, id, doctor_id],
        )?;
        let sql = format!(
          "SELECT {APPOINTMENT_COLUMNS} FROM appointments a
           WHERE a.appointment_id = ?1 AND a.doctor_id = ?2"
        );
        let raw = conn
          .query_row(&sql, params![id, doctor_id], RawAppointment::from_row)
          .optional()?;
        Ok((changed, raw))
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(Transition::NotFound);
    };
    let appointment = raw.into_appointment()?;
    if changed == 1 {
      Ok(Transition::Applied(appointment))
    } else {
      Ok(Transition::AlreadyDecided(appointment))
    }
  }

  // ── Health history ────────────────────────────────────────────────────────

  async fn record_history(&self, input: NewHistoryEntry) -> Result<HealthHistoryEntry> {
    let recorded_at = Utc::now();
    let at_str      = encode_dt(recorded_at);
    let summary     = input.symptom_summary.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO health_history
             (patient_id, symptom_summary, recommendation_count, doctor_count, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            input.patient_id,
            summary,
            input.recommendation_count,
            input.doctor_count,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(HealthHistoryEntry {
      id,
      patient_id:           input.patient_id,
      symptom_summary:      input.symptom_summary,
      recommendation_count: input.recommendation_count,
      doctor_count:         input.doctor_count,
      recorded_at,
    })
  }

  async fn list_history(&self, patient_id: i64) -> Result<Vec<HealthHistoryEntry>> {
    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, patient_id, symptom_summary, recommendation_count,
                  doctor_count, recorded_at
           FROM health_history
           WHERE patient_id = ?1
           ORDER BY entry_id DESC",
        )?;
        let rows = stmt
          .query_map(params![patient_id], |row| {
            Ok(RawHistoryEntry {
              entry_id:             row.get(0)?,
              patient_id:           row.get(1)?,
              symptom_summary:      row.get(2)?,
              recommendation_count: row.get(3)?,
              doctor_count:         row.get(4)?,
              recorded_at:          row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_document(&self, input: NewDocument) -> Result<UploadedDocument> {
    let at_str      = encode_dt(input.uploaded_at);
    let file_name   = input.file_name.clone();
    let description = input.description.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (patient_id, file_name, description, upload_date)
           VALUES (?1, ?2, ?3, ?4)",
          params![input.patient_id, file_name, description, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(UploadedDocument {
      id,
      patient_id:  input.patient_id,
      file_name:   input.file_name,
      description: input.description,
      uploaded_at: input.uploaded_at,
    })
  }

  async fn list_documents(&self, patient_id: i64) -> Result<Vec<UploadedDocument>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents
           WHERE patient_id = ?1
           ORDER BY upload_date DESC, record_id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![patient_id], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn get_document(&self, id: i64, patient_id: i64) -> Result<Option<UploadedDocument>> {
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE record_id = ?1 AND patient_id = ?2"
        );
        Ok(conn.query_row(&sql, params![id, patient_id], RawDocument::from_row).optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn delete_document(
    &self,
    id: i64,
    patient_id: i64,
  ) -> Result<Option<UploadedDocument>> {
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql = format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE record_id = ?1 AND patient_id = ?2"
        );
        let raw = tx
          .query_row(&sql, params![id, patient_id], RawDocument::from_row)
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM documents WHERE record_id = ?1 AND patient_id = ?2",
            params![id, patient_id],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, session: Session) -> Result<()> {
    let kind       = session.principal.kind();
    let id         = session.principal.id();
    let created_at = encode_dt(session.created_at);
    let expires_at = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_digest, principal, principal_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![session.token_digest, kind, id, created_at, expires_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_session(
    &self,
    token_digest: String,
    now: DateTime<Utc>,
  ) -> Result<Option<Session>> {
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_digest, principal, principal_id, created_at, expires_at
             FROM sessions WHERE token_digest = ?1",
            params![token_digest],
            |row| {
              Ok(RawSession {
                token_digest: row.get(0)?,
                principal:    row.get(1)?,
                principal_id: row.get(2)?,
                created_at:   row.get(3)?,
                expires_at:   row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    let Some(session) = raw.map(RawSession::into_session).transpose()? else {
      return Ok(None);
    };
    if session.is_live(now) {
      Ok(Some(session))
    } else {
      tracing::debug!(principal = ?session.principal, "session expired");
      self.delete_session(session.token_digest).await?;
      Ok(None)
    }
  }

  async fn delete_session(&self, token_digest: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token_digest = ?1", params![token_digest])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
