//! SQL schema for the Ward SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2 PHC string; opaque here
    role          TEXT NOT NULL,       -- 'patient' | 'doctor' | 'admin'
    department    TEXT                 -- meaningful for doctors only
);

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    date           TEXT NOT NULL,      -- RFC 3339 UTC
    description    TEXT NOT NULL,
    patient_id     TEXT NOT NULL REFERENCES users(user_id),
    doctor_id      TEXT NOT NULL REFERENCES users(user_id),
    status         TEXT NOT NULL DEFAULT 'pending'
);

-- Prescriptions are write-once; no UPDATE or DELETE is ever issued.
CREATE TABLE IF NOT EXISTS prescriptions (
    prescription_id TEXT PRIMARY KEY,
    patient_id      TEXT NOT NULL REFERENCES users(user_id),
    doctor_id       TEXT NOT NULL REFERENCES users(user_id),
    medications     TEXT NOT NULL,
    instructions    TEXT NOT NULL
);

-- Bearer sessions, keyed by SHA-256 digest of the token. The raw token is
-- never stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    role         TEXT NOT NULL,
    expires_at   TEXT NOT NULL         -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS appointments_doctor_idx   ON appointments(doctor_id);
CREATE INDEX IF NOT EXISTS appointments_patient_idx  ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS prescriptions_doctor_idx  ON prescriptions(doctor_id);
CREATE INDEX IF NOT EXISTS prescriptions_patient_idx ON prescriptions(patient_id);

PRAGMA user_version = 1;
";
