use chrono::{NaiveTime, Timelike};
use log::warn;
use thiserror::Error;

use crate::models::{PrayerSlot, PrayerTimeEntry, ResolvedPrayerState};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No prayer times available for today")]
    NoData,
}

/// `"HH:MM"` → minutes since midnight. Hours may be unpadded.
pub fn minutes_since_midnight(time: &str) -> Option<u32> {
    let (h, m) = time.trim().split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Locate `now` on the day's prayer cycle.
///
/// Auxiliary fields (Sunrise, Sunset, Imsak, Midnight, Firstthird, Lastthird)
/// are dropped first. A prayer has passed only once its minute is strictly
/// earlier than `now`: at exactly 12:00, Dhuhr (12:00) is still the next prayer.
pub fn resolve(entry: &PrayerTimeEntry, now: NaiveTime) -> Result<ResolvedPrayerState, ResolveError> {
    let now_minutes = now.hour() * 60 + now.minute();

    let mut prayers: Vec<(u32, PrayerSlot)> = entry
        .prayers_only()
        .iter()
        .filter_map(|t| match minutes_since_midnight(&t.time) {
            Some(m) => Some((m, PrayerSlot::new(t.name.as_str(), t.time.as_str()))),
            None => {
                warn!("Ignoring {} with unreadable time '{}'", t.name, t.time);
                None
            }
        })
        .collect();

    // Stable: equal times keep their upstream order.
    prayers.sort_by_key(|(minutes, _)| *minutes);

    let last = prayers.len().checked_sub(1).ok_or(ResolveError::NoData)?;

    let (current, next) = match prayers.iter().position(|(m, _)| now_minutes <= *m) {
        Some(0) => (last, 0),
        Some(i) => (i - 1, i),
        None => (last, 0),
    };

    Ok(ResolvedPrayerState {
        current: prayers[current].1.clone(),
        next: prayers[next].1.clone(),
    })
}

/// Seconds from `now` until `slot` next comes around. Zero during the
/// prayer's own minute.
///
/// Once the slot has passed today it next falls tomorrow, and its time is
/// read from `tomorrow` when the next day's timetable is at hand. Without it,
/// today's time stands in for tomorrow's, off by the overnight drift.
pub fn seconds_until(
    slot: &PrayerSlot,
    tomorrow: Option<&PrayerTimeEntry>,
    now: NaiveTime,
) -> Option<i64> {
    let target = i64::from(minutes_since_midnight(&slot.time)?) * 60;
    let now_secs = i64::from(now.num_seconds_from_midnight());
    let minute_start = now_secs - now_secs % 60;
    if target >= minute_start {
        return Some((target - now_secs).max(0));
    }

    let tomorrow_target = tomorrow
        .and_then(|entry| entry.iter().find(|t| t.name == slot.name))
        .and_then(|t| minutes_since_midnight(&t.time))
        .map_or(target, |m| i64::from(m) * 60);
    Some(tomorrow_target - now_secs + SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrayerTimeEntry;

    fn day() -> PrayerTimeEntry {
        PrayerTimeEntry::from_pairs([
            ("Fajr", "05:00"),
            ("Dhuhr", "12:00"),
            ("Asr", "16:00"),
            ("Maghrib", "19:00"),
            ("Isha", "20:30"),
        ])
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(name: &str, time: &str) -> PrayerSlot {
        PrayerSlot::new(name, time)
    }

    #[test]
    fn test_minutes_since_midnight() {
        assert_eq!(minutes_since_midnight("00:00"), Some(0));
        assert_eq!(minutes_since_midnight("20:30"), Some(1230));
        assert_eq!(minutes_since_midnight("9:05"), Some(545));
        assert_eq!(minutes_since_midnight("24:00"), None);
        assert_eq!(minutes_since_midnight("12:60"), None);
        assert_eq!(minutes_since_midnight("noon"), None);
    }

    #[test]
    fn test_unpadded_hours_sort_numerically() {
        let entry = PrayerTimeEntry::from_pairs([("Dhuhr", "10:00"), ("Fajr", "9:00")]);
        let state = resolve(&entry, at(9, 30)).unwrap();
        assert_eq!(state.current, slot("Fajr", "9:00"));
        assert_eq!(state.next, slot("Dhuhr", "10:00"));
    }

    #[test]
    fn test_mid_day() {
        let state = resolve(&day(), at(13, 0)).unwrap();
        assert_eq!(state.current, slot("Dhuhr", "12:00"));
        assert_eq!(state.next, slot("Asr", "16:00"));
    }

    #[test]
    fn test_before_first_prayer_wraps_to_previous_isha() {
        let state = resolve(&day(), at(4, 0)).unwrap();
        assert_eq!(state.current, slot("Isha", "20:30"));
        assert_eq!(state.next, slot("Fajr", "05:00"));
    }

    #[test]
    fn test_after_last_prayer_wraps_to_next_fajr() {
        let state = resolve(&day(), at(23, 0)).unwrap();
        assert_eq!(state.current, slot("Isha", "20:30"));
        assert_eq!(state.next, slot("Fajr", "05:00"));
    }

    #[test]
    fn test_exact_minute_is_not_yet_passed() {
        let state = resolve(&day(), at(12, 0)).unwrap();
        assert_eq!(state.current, slot("Fajr", "05:00"));
        assert_eq!(state.next, slot("Dhuhr", "12:00"));

        let state = resolve(&day(), at(12, 1)).unwrap();
        assert_eq!(state.current, slot("Dhuhr", "12:00"));
        assert_eq!(state.next, slot("Asr", "16:00"));
    }

    #[test]
    fn test_exact_first_and_last_minute() {
        let state = resolve(&day(), at(5, 0)).unwrap();
        assert_eq!(state.current, slot("Isha", "20:30"));
        assert_eq!(state.next, slot("Fajr", "05:00"));

        let state = resolve(&day(), at(20, 30)).unwrap();
        assert_eq!(state.current, slot("Maghrib", "19:00"));
        assert_eq!(state.next, slot("Isha", "20:30"));
    }

    #[test]
    fn test_auxiliary_fields_never_resolved() {
        let entry = PrayerTimeEntry::from_pairs([
            ("Imsak", "04:50"),
            ("Fajr", "05:00"),
            ("Sunrise", "06:20"),
            ("Dhuhr", "12:00"),
            ("Asr", "16:00"),
            ("Sunset", "19:00"),
            ("Maghrib", "19:00"),
            ("Isha", "20:30"),
            ("Firstthird", "22:40"),
            ("Midnight", "00:10"),
            ("Lastthird", "02:20"),
        ]);
        let aux = ["Imsak", "Sunrise", "Sunset", "Midnight", "Firstthird", "Lastthird"];
        for h in 0..24 {
            for m in [0, 15, 30, 45] {
                let state = resolve(&entry, at(h, m)).unwrap();
                assert!(!aux.contains(&state.current.name.as_str()), "{:?}", state);
                assert!(!aux.contains(&state.next.name.as_str()), "{:?}", state);
            }
        }
        // 06:30 is past Sunrise but Fajr stays current.
        let state = resolve(&entry, at(6, 30)).unwrap();
        assert_eq!(state.current, slot("Fajr", "05:00"));
        // 23:30 is past Firstthird but Isha stays current.
        let state = resolve(&entry, at(23, 30)).unwrap();
        assert_eq!(state.current, slot("Isha", "20:30"));
    }

    #[test]
    fn test_result_keeps_original_time_string() {
        let entry = PrayerTimeEntry::from_pairs([("Fajr", "5:00"), ("Dhuhr", "12:00")]);
        let state = resolve(&entry, at(4, 0)).unwrap();
        assert_eq!(state.next.time, "5:00");
    }

    #[test]
    fn test_equal_times_keep_input_order() {
        let entry = PrayerTimeEntry::from_pairs([
            ("Fajr", "05:00"),
            ("Maghrib", "19:00"),
            ("Asr", "19:00"),
            ("Isha", "20:30"),
        ]);
        let state = resolve(&entry, at(18, 0)).unwrap();
        assert_eq!(state.next.name, "Maghrib");
        let state = resolve(&entry, at(19, 30)).unwrap();
        assert_eq!(state.current.name, "Asr");
        assert_eq!(state.next.name, "Isha");
    }

    #[test]
    fn test_empty_after_filtering_is_no_data() {
        assert_eq!(resolve(&PrayerTimeEntry::default(), at(12, 0)), Err(ResolveError::NoData));
        let only_aux = PrayerTimeEntry::from_pairs([("Sunrise", "06:00"), ("Sunset", "19:00")]);
        assert_eq!(resolve(&only_aux, at(12, 0)), Err(ResolveError::NoData));
        let unreadable = PrayerTimeEntry::from_pairs([("Fajr", "--:--")]);
        assert_eq!(resolve(&unreadable, at(12, 0)), Err(ResolveError::NoData));
    }

    #[test]
    fn test_single_prayer_is_both_current_and_next() {
        let entry = PrayerTimeEntry::from_pairs([("Fajr", "05:00")]);
        let state = resolve(&entry, at(12, 0)).unwrap();
        assert_eq!(state.current, state.next);
    }

    #[test]
    fn test_seconds_until() {
        let asr = slot("Asr", "16:00");
        assert_eq!(seconds_until(&asr, None, at(13, 0)), Some(3 * 3600));
        let fajr = slot("Fajr", "05:00");
        assert_eq!(seconds_until(&fajr, None, at(23, 0)), Some(6 * 3600));
        assert_eq!(seconds_until(&fajr, None, at(5, 0)), Some(0));
        assert_eq!(seconds_until(&fajr, None, at(5, 1)), Some(24 * 3600 - 60));
        let late = NaiveTime::from_hms_opt(4, 59, 30).unwrap();
        assert_eq!(seconds_until(&fajr, None, late), Some(30));
        assert_eq!(seconds_until(&slot("Fajr", "??"), None, at(1, 0)), None);
    }

    #[test]
    fn test_seconds_until_after_isha_uses_tomorrow() {
        let fajr = slot("Fajr", "03:41");
        let tomorrow = PrayerTimeEntry::from_pairs([("Fajr", "03:40"), ("Dhuhr", "12:05")]);
        // 21:00 to 03:40 next day.
        assert_eq!(seconds_until(&fajr, Some(&tomorrow), at(21, 0)), Some(400 * 60));
        // Without the next day, today's Fajr stands in.
        assert_eq!(seconds_until(&fajr, None, at(21, 0)), Some(401 * 60));
        // Not yet passed today: tomorrow is irrelevant.
        assert_eq!(seconds_until(&fajr, Some(&tomorrow), at(2, 0)), Some(101 * 60));
        // Tomorrow without that prayer, or unreadable: fall back.
        let other = PrayerTimeEntry::from_pairs([("Fajr", "--:--")]);
        assert_eq!(seconds_until(&fajr, Some(&other), at(21, 0)), Some(401 * 60));
    }
}
