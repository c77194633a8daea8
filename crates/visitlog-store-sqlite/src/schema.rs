//! SQL schema for the visit-log SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One SQL row per logical table row. A write replaces every row of a table.
CREATE TABLE IF NOT EXISTS table_rows (
    table_name  TEXT    NOT NULL,   -- 'visits' | 'stores' | 'employees'
    position    INTEGER NOT NULL,   -- 0-based order within the table
    row_json    TEXT    NOT NULL,   -- JSON object: column -> cell text
    PRIMARY KEY (table_name, position)
);

PRAGMA user_version = 1;
";
