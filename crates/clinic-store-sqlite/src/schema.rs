//! SQL schema for the clinic SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision; future migrations will be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Reference data (seeded, read-only) ─────────────────────────────────────

CREATE TABLE IF NOT EXISTS symptoms (
    symptom_id    INTEGER PRIMARY KEY,
    symptom_name  TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description   TEXT,
    doctor_advice TEXT,
    priority      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS recommendations (
    rec_id       INTEGER PRIMARY KEY,
    rec_name     TEXT NOT NULL,
    rec_type     TEXT NOT NULL
                 CHECK (rec_type IN ('Home Remedy', 'Dietary', 'Ayurvedic', 'Tablet')),
    instructions TEXT NOT NULL,
    disclaimer   TEXT
);

CREATE TABLE IF NOT EXISTS specialties (
    specialty_id   INTEGER PRIMARY KEY,
    specialty_name TEXT NOT NULL UNIQUE,
    description    TEXT
);

CREATE TABLE IF NOT EXISTS symptom_recommendations (
    symptom_id INTEGER NOT NULL REFERENCES symptoms(symptom_id),
    rec_id     INTEGER NOT NULL REFERENCES recommendations(rec_id),
    PRIMARY KEY (symptom_id, rec_id)
);

CREATE TABLE IF NOT EXISTS symptom_specialties (
    symptom_id   INTEGER NOT NULL REFERENCES symptoms(symptom_id),
    specialty_id INTEGER NOT NULL REFERENCES specialties(specialty_id),
    PRIMARY KEY (symptom_id, specialty_id)
);

-- ── Accounts ───────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS patients (
    patient_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS doctors (
    doctor_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    specialty_id  INTEGER REFERENCES specialties(specialty_id),
    rating        REAL NOT NULL DEFAULT 0,
    experience    INTEGER NOT NULL DEFAULT 0,
    availability  TEXT NOT NULL DEFAULT 'Available',
    biography     TEXT
);

CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,   -- hex SHA-256 of the bearer token
    principal    TEXT NOT NULL,      -- 'patient' | 'doctor'
    principal_id INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    expires_at   TEXT NOT NULL
);

-- ── Activity ───────────────────────────────────────────────────────────────

-- Status only ever moves from 'Pending' to a terminal value.
CREATE TABLE IF NOT EXISTS appointments (
    appointment_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id       INTEGER NOT NULL REFERENCES patients(patient_id),
    doctor_id        INTEGER NOT NULL REFERENCES doctors(doctor_id),
    appointment_date TEXT NOT NULL,  -- YYYY-MM-DD
    appointment_time TEXT NOT NULL,  -- HH:MM
    status           TEXT NOT NULL DEFAULT 'Pending'
                     CHECK (status IN ('Pending', 'Approved', 'Rejected')),
    reason           TEXT,
    created_at       TEXT NOT NULL
);

-- Append-only.
CREATE TABLE IF NOT EXISTS health_history (
    entry_id             INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id           INTEGER NOT NULL REFERENCES patients(patient_id),
    symptom_summary      TEXT NOT NULL,
    recommendation_count INTEGER NOT NULL,
    doctor_count         INTEGER NOT NULL,
    recorded_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    record_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id  INTEGER NOT NULL REFERENCES patients(patient_id),
    file_name   TEXT NOT NULL,
    description TEXT,
    upload_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS doctors_specialty_idx     ON doctors(specialty_id);
CREATE INDEX IF NOT EXISTS appointments_patient_idx  ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS appointments_doctor_idx   ON appointments(doctor_id);
CREATE INDEX IF NOT EXISTS history_patient_idx       ON health_history(patient_id);
CREATE INDEX IF NOT EXISTS documents_patient_idx     ON documents(patient_id);
CREATE INDEX IF NOT EXISTS sessions_expiry_idx       ON sessions(expires_at);

PRAGMA user_version = 1;
";
