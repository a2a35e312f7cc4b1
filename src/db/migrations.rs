use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS calendar_cache (
            latitude    TEXT    NOT NULL,
            longitude   TEXT    NOT NULL,
            year        INTEGER NOT NULL,
            month       INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
            method      INTEGER NOT NULL,
            school      TEXT    NOT NULL CHECK(school IN ('hanafi','shafi')),
            days_json   TEXT    NOT NULL,
            fetched_at  TEXT    DEFAULT (datetime('now')),
            PRIMARY KEY (latitude, longitude, year, month, method, school)
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;
    Ok(())
}
