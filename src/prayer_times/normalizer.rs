use chrono::NaiveDate;
use log::warn;

use crate::models::{CalendarKey, DayRecord, MonthTimetable, PrayerTime, PrayerTimeEntry, RawDay};

const SOURCE_DATE_FORMAT: &str = "%d-%m-%Y";
const DISPLAY_DATE_FORMAT: &str = "%d %b";

/// `"05:12 (PKT)"` → `"05:12"`. Values without an annotation come back unchanged.
pub fn strip_timezone(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or(value)
}

/// `dd-MM-yyyy` → `dd MMM`; unparseable input is returned as-is.
pub fn format_display_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, SOURCE_DATE_FORMAT)
        .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// A date rendered the way the calendar service writes it.
pub fn date_key(date: NaiveDate) -> String {
    date.format(SOURCE_DATE_FORMAT).to_string()
}

pub fn normalize_day(day: &RawDay, today: NaiveDate) -> DayRecord {
    let raw_date = &day.date.gregorian.date;

    let mut times = Vec::with_capacity(day.timings.len());
    for (name, value) in &day.timings {
        match value.as_str() {
            Some(s) => times.push(PrayerTime::new(name.as_str(), strip_timezone(s))),
            None => warn!("Skipping non-text timing {}={} on {}", name, value, raw_date),
        }
    }

    DayRecord {
        gregorian_date: raw_date.clone(),
        formatted_date: format_display_date(raw_date),
        weekday: day.date.gregorian.weekday.as_ref().map(|w| w.en.clone()),
        hijri: day.date.hijri.clone(),
        timings: PrayerTimeEntry::new(times),
        is_today: *raw_date == date_key(today),
    }
}

/// Normalize a whole fetched month. Upstream day order is kept.
pub fn normalize_month(key: CalendarKey, days: &[RawDay], today: NaiveDate) -> MonthTimetable {
    MonthTimetable {
        key,
        days: days.iter().map(|d| normalize_day(d, today)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, PrayerName, School};

    fn raw_day(date: &str) -> RawDay {
        serde_json::from_value(serde_json::json!({
            "timings": {
                "Fajr": "03:41 (PKT)",
                "Sunrise": "05:00 (PKT)",
                "Dhuhr": "12:05 (PKT)",
                "Asr": "16:57 (PKT)",
                "Sunset": "19:10 (PKT)",
                "Maghrib": "19:10 (PKT)",
                "Isha": "20:38 (PKT)",
                "Imsak": "03:31 (PKT)",
                "Midnight": "00:05 (PKT)",
                "Firstthird": "22:26 (PKT)",
                "Lastthird": "01:43 (PKT)"
            },
            "date": {
                "readable": "05 Jun 2024",
                "gregorian": { "date": date, "weekday": { "en": "Wednesday" } },
                "hijri": {
                    "date": "28-11-1445",
                    "day": "28",
                    "month": { "number": 11, "en": "Dhū al-Qaʿdah" },
                    "year": "1445"
                }
            },
            "meta": { "timezone": "Asia/Karachi" }
        }))
        .unwrap()
    }

    fn fake_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    #[test]
    fn test_strip_timezone() {
        assert_eq!(strip_timezone("05:12 (PKT)"), "05:12");
        assert_eq!(strip_timezone("05:12"), "05:12");
        assert_eq!(strip_timezone(strip_timezone("05:12 (PKT)")), "05:12");
        assert_eq!(strip_timezone(""), "");
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date("05-06-2024"), "05 Jun");
        assert_eq!(format_display_date("31-12-2023"), "31 Dec");
    }

    #[test]
    fn test_format_display_date_falls_back_to_raw() {
        assert_eq!(format_display_date("2024/06/05"), "2024/06/05");
        assert_eq!(format_display_date("31-02-2024"), "31-02-2024");
        assert_eq!(format_display_date(""), "");
    }

    #[test]
    fn test_normalize_day_strips_every_value() {
        let record = normalize_day(&raw_day("05-06-2024"), fake_today());
        assert_eq!(record.timings.len(), 11);
        assert!(record.timings.iter().all(|t| !t.time.contains('(')));
        assert_eq!(record.timings.get(PrayerName::Fajr), Some("03:41"));
        assert_eq!(record.timings.get(PrayerName::Lastthird), Some("01:43"));
        assert_eq!(record.formatted_date, "05 Jun");
        assert_eq!(record.weekday.as_deref(), Some("Wednesday"));
        assert_eq!(record.hijri.as_ref().map(|h| h.day.as_str()), Some("28"));
    }

    #[test]
    fn test_normalize_day_preserves_field_order() {
        let record = normalize_day(&raw_day("05-06-2024"), fake_today());
        let first: Vec<&str> = record.timings.iter().take(3).map(|t| t.name.as_str()).collect();
        assert_eq!(first, vec!["Fajr", "Sunrise", "Dhuhr"]);
    }

    #[test]
    fn test_is_today() {
        assert!(normalize_day(&raw_day("05-06-2024"), fake_today()).is_today);
        assert!(!normalize_day(&raw_day("06-06-2024"), fake_today()).is_today);
        assert!(!normalize_day(&raw_day("05-06-2023"), fake_today()).is_today);
        assert!(!normalize_day(&raw_day("5-6-2024"), fake_today()).is_today);
    }

    #[test]
    fn test_normalize_month_keeps_source_order() {
        let key = CalendarKey::for_date(
            Coordinates::new(33.6938, 73.0651),
            fake_today(),
            1,
            School::Hanafi,
        );
        let days = vec![raw_day("06-06-2024"), raw_day("04-06-2024"), raw_day("05-06-2024")];
        let month = normalize_month(key, &days, fake_today());
        let dates: Vec<&str> = month.days.iter().map(|d| d.gregorian_date.as_str()).collect();
        assert_eq!(dates, vec!["06-06-2024", "04-06-2024", "05-06-2024"]);
        assert_eq!(month.today().map(|d| d.gregorian_date.as_str()), Some("05-06-2024"));
    }

    #[test]
    fn test_non_text_timing_is_skipped() {
        let mut day = raw_day("05-06-2024");
        day.timings.insert("Extra".to_string(), serde_json::json!(42));
        let record = normalize_day(&day, fake_today());
        assert_eq!(record.timings.len(), 11);
    }
}
