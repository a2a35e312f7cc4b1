use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::Connection;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::repository::CacheRepo;
use crate::models::{CalendarKey, MonthTimetable, RawDay, School};
use crate::prayer_times::client::{CalendarSource, FetchError};
use crate::prayer_times::normalizer::normalize_month;

#[derive(Error, Debug)]
pub enum CalendarError {
    /// The calendar service could not be reached or answered badly.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Prayer calendar cache: {0}")]
    Cache(#[from] anyhow::Error),
}

/// Key for the month containing `date` under the current settings.
pub fn key_for(config: &AppConfig, date: NaiveDate) -> CalendarKey {
    CalendarKey::for_date(
        config.location.coordinates(),
        date,
        config.calendar.method,
        config.calendar.school,
    )
}

/// Raw month for `key`: from the cache unless `force`, otherwise from the
/// source, which then refreshes the cache.
pub fn load_raw_month(
    conn: &Connection,
    source: &dyn CalendarSource,
    key: &CalendarKey,
    force: bool,
) -> Result<Vec<RawDay>, CalendarError> {
    if !force {
        if let Some(days) = CacheRepo::get_month(conn, key)? {
            debug!("Cache hit for {}", key);
            return Ok(days);
        }
        debug!("Cache miss for {}", key);
    }

    let days = source.fetch_month(key)?;
    CacheRepo::store_month(conn, key, &days)?;
    Ok(days)
}

pub fn load_month(
    conn: &Connection,
    source: &dyn CalendarSource,
    key: &CalendarKey,
    today: NaiveDate,
    force: bool,
) -> Result<MonthTimetable, CalendarError> {
    let days = load_raw_month(conn, source, key, force)?;
    Ok(normalize_month(key.clone(), &days, today))
}

/// Switch the school in `config`, dropping every cached month. Returns
/// `false` when it was already set. The caller persists the config.
pub fn set_school(conn: &Connection, config: &mut AppConfig, school: School) -> anyhow::Result<bool> {
    if config.calendar.school == school {
        return Ok(false);
    }
    config.calendar.school = school;
    let dropped = CacheRepo::clear_all(conn)?;
    info!("School set to {}; dropped {} cached months", school, dropped);
    Ok(true)
}
