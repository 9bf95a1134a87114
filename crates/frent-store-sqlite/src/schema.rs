//! SQL schema for the Frent SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    role          TEXT NOT NULL,   -- 'member' | 'employee' | 'admin'
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movies (
    movie_id  TEXT PRIMARY KEY,
    title     TEXT NOT NULL,
    director  TEXT NOT NULL DEFAULT '',
    available INTEGER NOT NULL DEFAULT 1,
    price     REAL NOT NULL CHECK (price >= 0)
);

-- Keyed by username rather than user_id: the username is the identity the
-- notification engine addresses.
CREATE TABLE IF NOT EXISTS wishlist (
    username TEXT NOT NULL,
    movie_id TEXT NOT NULL REFERENCES movies(movie_id) ON DELETE CASCADE,
    PRIMARY KEY (username, movie_id)
);

-- Dates are ISO 8601 (YYYY-MM-DD) so that text comparison is date order.
CREATE TABLE IF NOT EXISTS rentals (
    rental_id   TEXT PRIMARY KEY,
    owner       TEXT NOT NULL,
    movie_id    TEXT NOT NULL REFERENCES movies(movie_id),
    rental_date TEXT NOT NULL,
    due_date    TEXT NOT NULL,
    return_date TEXT,
    returned    INTEGER NOT NULL DEFAULT 0,
    price       REAL NOT NULL CHECK (price >= 0),
    CHECK (due_date >= rental_date),
    CHECK ((returned = 1) = (return_date IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS wishlist_movie_idx  ON wishlist(movie_id);
CREATE INDEX IF NOT EXISTS rentals_owner_idx   ON rentals(owner);
CREATE INDEX IF NOT EXISTS rentals_active_idx  ON rentals(due_date) WHERE return_date IS NULL;

-- At most one active rental per owner and movie.
CREATE UNIQUE INDEX IF NOT EXISTS rentals_one_active
    ON rentals(owner, movie_id) WHERE return_date IS NULL;

PRAGMA user_version = 1;
";
