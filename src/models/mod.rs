pub mod prayer;
pub mod resolved;
pub mod timetable;

pub use prayer::{PrayerName, School};
pub use resolved::{PrayerSlot, ResolvedPrayerState};
pub use timetable::{
    CalendarKey, Coordinates, DayRecord, MonthTimetable, PrayerTime, PrayerTimeEntry, RawDay,
    RawHijri,
};
