use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{PrayerName, School};

// ─── Wire format ─────────────────────────────────────────────────────────────

/// One day of the upstream monthly calendar, as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDay {
    /// Field name → `"HH:MM (TZ)"`. Object order is preserved.
    pub timings: serde_json::Map<String, serde_json::Value>,
    pub date: RawDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RawMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readable: Option<String>,
    pub gregorian: RawGregorian,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hijri: Option<RawHijri>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGregorian {
    /// `dd-MM-yyyy`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<RawName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHijri {
    pub date: String,
    pub day: String,
    pub month: RawHijriMonth,
    pub year: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHijriMonth {
    pub number: u32,
    pub en: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawName {
    pub en: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

// ─── Fetch key ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn lat_key(&self) -> String {
        format!("{:.4}", self.latitude)
    }

    pub fn lng_key(&self) -> String {
        format!("{:.4}", self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// Compared at cache-key precision.
impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.lat_key() == other.lat_key() && self.lng_key() == other.lng_key()
    }
}

/// Everything that determines which month of prayer times the calendar
/// service returns. A change in any component means a different month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarKey {
    pub coordinates: Coordinates,
    pub year: i32,
    pub month: u32,
    pub method: u8,
    pub school: School,
}

impl CalendarKey {
    pub fn for_date(coordinates: Coordinates, date: NaiveDate, method: u8, school: School) -> Self {
        Self {
            coordinates,
            year: date.year(),
            month: date.month(),
            method,
            school,
        }
    }
}

impl std::fmt::Display for CalendarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{} {}-{:02} method={} school={}",
            self.coordinates.lat_key(),
            self.coordinates.lng_key(),
            self.year,
            self.month,
            self.method,
            self.school.as_str()
        )
    }
}

// ─── Normalized timetable ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTime {
    pub name: String,
    /// Bare `HH:MM`.
    pub time: String,
}

impl PrayerTime {
    pub fn new(name: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: time.into(),
        }
    }

    pub fn prayer_name(&self) -> Option<PrayerName> {
        self.name.parse().ok()
    }
}

/// One day's named times, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimeEntry {
    times: Vec<PrayerTime>,
}

impl PrayerTimeEntry {
    pub fn new(times: Vec<PrayerTime>) -> Self {
        Self { times }
    }

    /// Build from `(name, time)` pairs.
    #[cfg(test)]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, time)| PrayerTime::new(name, time))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrayerTime> {
        self.times.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn get(&self, name: PrayerName) -> Option<&str> {
        self.times
            .iter()
            .find(|t| t.prayer_name() == Some(name))
            .map(|t| t.time.as_str())
    }

    /// Only the five obligatory prayers, in their original order.
    pub fn prayers_only(&self) -> PrayerTimeEntry {
        Self::new(
            self.times
                .iter()
                .filter(|t| t.prayer_name().is_some_and(|n| !n.is_auxiliary()))
                .cloned()
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    /// Source `dd-MM-yyyy`.
    pub gregorian_date: String,
    /// `dd MMM`, or the source string if it did not parse.
    pub formatted_date: String,
    pub weekday: Option<String>,
    pub hijri: Option<RawHijri>,
    pub timings: PrayerTimeEntry,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthTimetable {
    pub key: CalendarKey,
    pub days: Vec<DayRecord>,
}

impl MonthTimetable {
    pub fn today(&self) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.is_today)
    }

    /// The day after today, when it falls inside this month.
    pub fn tomorrow(&self) -> Option<&DayRecord> {
        let today = self.days.iter().position(|d| d.is_today)?;
        self.days.get(today + 1)
    }

    /// Re-derive the `is_today` flags after the wall-clock date moved.
    pub fn mark_today(&mut self, today: NaiveDate) {
        let today_str = crate::prayer_times::normalizer::date_key(today);
        for day in &mut self.days {
            day.is_today = day.gregorian_date == today_str;
        }
    }
}
