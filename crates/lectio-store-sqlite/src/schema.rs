//! SQL schema for the Lectio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id              TEXT PRIMARY KEY,
    email                TEXT NOT NULL UNIQUE,   -- trimmed, lowercased
    pin_hash             TEXT NOT NULL,          -- argon2 PHC string
    role                 TEXT NOT NULL,          -- 'user' | 'admin'
    first_name           TEXT NOT NULL,
    last_name            TEXT NOT NULL,
    country              TEXT NOT NULL,
    birth_date           TEXT,                   -- ISO 8601 date
    sex                  TEXT,
    subscription_status  TEXT NOT NULL,
    currency             TEXT NOT NULL,
    payment_method_id    TEXT,                   -- opaque processor reference
    payment_method_kind  TEXT,
    notifications_opt_in INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL,
    last_login_at        TEXT,
    pin_changed_at       TEXT
);

CREATE TABLE IF NOT EXISTS books (
    book_id      TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    author       TEXT NOT NULL,
    genre        TEXT,
    summary      TEXT NOT NULL DEFAULT '',
    content_url  TEXT NOT NULL DEFAULT '',
    published_at TEXT,
    published    INTEGER NOT NULL DEFAULT 0,
    ranking      INTEGER,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- One row per (user, book); rows are never deleted.
-- book_id is a weak reference: removing a book does not cascade here.
CREATE TABLE IF NOT EXISTS reading_progress (
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    book_id       TEXT NOT NULL,
    status        TEXT NOT NULL,   -- 'not_started' | 'in_progress' | 'completed'
    percent       REAL NOT NULL DEFAULT 0,
    last_chapter  TEXT,
    last_position INTEGER NOT NULL DEFAULT 0,
    started_at    TEXT NOT NULL,
    completed_at  TEXT,
    updated_at    TEXT NOT NULL,
    PRIMARY KEY (user_id, book_id)
);

CREATE TABLE IF NOT EXISTS contact_messages (
    message_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL,
    subject    TEXT NOT NULL,
    body       TEXT NOT NULL,
    read       INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Append-only log of admin sends.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    sent_at         TEXT NOT NULL,
    recipient_count INTEGER NOT NULL,
    status          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    expense_id  TEXT PRIMARY KEY,
    amount      INTEGER NOT NULL,   -- minor units, VAT included
    currency    TEXT NOT NULL,
    date        TEXT NOT NULL,      -- ISO 8601 date
    category    TEXT NOT NULL,
    country     TEXT NOT NULL,
    vat_amount  INTEGER NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_payment_method_idx ON users(payment_method_id);
CREATE INDEX IF NOT EXISTS books_published_idx      ON books(published, published_at);
CREATE INDEX IF NOT EXISTS progress_updated_idx     ON reading_progress(updated_at);
CREATE INDEX IF NOT EXISTS expenses_date_idx        ON expenses(date);

PRAGMA user_version = 1;
";
