//! SQL schema for the RSVP SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    external_id  TEXT NOT NULL UNIQUE,
    email        TEXT NOT NULL UNIQUE,
    username     TEXT NOT NULL UNIQUE,
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    photo_url    TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

-- Users without a phone number share the sentinel value.
CREATE UNIQUE INDEX IF NOT EXISTS users_phone_number_uq
    ON users(phone_number) WHERE phone_number <> '0000000000';

-- Owned by the event-management side; read-only to reservations.
CREATE TABLE IF NOT EXISTS events (
    event_id        TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL,
    location        TEXT NOT NULL,
    start_date_time TEXT NOT NULL,
    end_date_time   TEXT NOT NULL,
    is_free         INTEGER NOT NULL,
    price           TEXT,
    url             TEXT
);

-- One reservation per (event, user). Cancellation deletes the row.
CREATE TABLE IF NOT EXISTS reservations (
    reservation_id TEXT PRIMARY KEY,
    event_id       TEXT NOT NULL REFERENCES events(event_id),
    user_id        TEXT NOT NULL REFERENCES users(user_id),
    created_at     TEXT NOT NULL,
    UNIQUE (event_id, user_id)
);

-- One admission per reservation.
CREATE TABLE IF NOT EXISTS admissions (
    admission_id   TEXT PRIMARY KEY,
    reservation_id TEXT NOT NULL REFERENCES reservations(reservation_id),
    admitted_at    TEXT NOT NULL,
    UNIQUE (reservation_id)
);

CREATE INDEX IF NOT EXISTS reservations_user_idx    ON reservations(user_id);
CREATE INDEX IF NOT EXISTS reservations_created_idx ON reservations(created_at);

PRAGMA user_version = 1;
";
