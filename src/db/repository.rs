use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{CalendarKey, RawDay};

// ─── Cached calendar months ──────────────────────────────────────────────────

pub struct CacheRepo;

impl CacheRepo {
    /// Raw month payload stored for `key`, if any.
    pub fn get_month(conn: &Connection, key: &CalendarKey) -> Result<Option<Vec<RawDay>>> {
        let json: Option<String> = conn
            .query_row(
                "SELECT days_json FROM calendar_cache
                 WHERE latitude = ?1 AND longitude = ?2 AND year = ?3
                   AND month = ?4 AND method = ?5 AND school = ?6",
                params![
                    key.coordinates.lat_key(),
                    key.coordinates.lng_key(),
                    key.year,
                    key.month,
                    key.method,
                    key.school.as_str(),
                ],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            None => Ok(None),
            Some(json) => {
                let days = serde_json::from_str(&json)
                    .with_context(|| format!("Decoding cached month {}", key))?;
                Ok(Some(days))
            }
        }
    }

    pub fn store_month(conn: &Connection, key: &CalendarKey, days: &[RawDay]) -> Result<()> {
        let json = serde_json::to_string(days).context("Encoding month for cache")?;
        conn.execute(
            "INSERT OR REPLACE INTO calendar_cache
                (latitude, longitude, year, month, method, school, days_json, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))",
            params![
                key.coordinates.lat_key(),
                key.coordinates.lng_key(),
                key.year,
                key.month,
                key.method,
                key.school.as_str(),
                json,
            ],
        )?;
        Ok(())
    }

    pub fn clear_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM calendar_cache", [])?)
    }

    #[cfg(test)]
    pub fn count(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM calendar_cache", [], |row| row.get(0))?)
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}
