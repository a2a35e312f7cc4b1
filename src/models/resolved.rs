use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerSlot {
    pub name: String,
    pub time: String,
}

impl PrayerSlot {
    pub fn new(name: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: time.into(),
        }
    }
}

/// Where "now" sits on the daily prayer cycle. Derived on every render,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrayerState {
    /// Most recently passed prayer; yesterday's last one before the day's first.
    pub current: PrayerSlot,
    /// Soonest upcoming prayer; tomorrow's first one after the day's last.
    pub next: PrayerSlot,
}
