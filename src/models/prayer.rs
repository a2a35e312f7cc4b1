use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Every field the prayer calendar reports for a day. Only five of them are
/// prayers; the rest are solar events and night divisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerName {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Sunset,
    Maghrib,
    Isha,
    Imsak,
    Midnight,
    Firstthird,
    Lastthird,
}

impl PrayerName {
    /// The five obligatory prayers in their daily order.
    pub fn obligatory() -> [PrayerName; 5] {
        [
            PrayerName::Fajr,
            PrayerName::Dhuhr,
            PrayerName::Asr,
            PrayerName::Maghrib,
            PrayerName::Isha,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Sunrise => "Sunrise",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Sunset => "Sunset",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
            PrayerName::Imsak => "Imsak",
            PrayerName::Midnight => "Midnight",
            PrayerName::Firstthird => "Firstthird",
            PrayerName::Lastthird => "Lastthird",
        }
    }

    pub fn is_obligatory(&self) -> bool {
        matches!(
            self,
            PrayerName::Fajr
                | PrayerName::Dhuhr
                | PrayerName::Asr
                | PrayerName::Maghrib
                | PrayerName::Isha
        )
    }

    /// Timetable bookkeeping entries that are never "current" or "next".
    pub fn is_auxiliary(&self) -> bool {
        !self.is_obligatory()
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrayerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fajr" => Ok(PrayerName::Fajr),
            "sunrise" => Ok(PrayerName::Sunrise),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(PrayerName::Dhuhr),
            "asr" => Ok(PrayerName::Asr),
            "sunset" => Ok(PrayerName::Sunset),
            "maghrib" => Ok(PrayerName::Maghrib),
            "isha" => Ok(PrayerName::Isha),
            "imsak" => Ok(PrayerName::Imsak),
            "midnight" => Ok(PrayerName::Midnight),
            "firstthird" => Ok(PrayerName::Firstthird),
            "lastthird" => Ok(PrayerName::Lastthird),
            _ => Err(anyhow::anyhow!("Unknown prayer name: {}", s)),
        }
    }
}

/// School of thought used for the Asr calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum School {
    #[default]
    Hanafi,
    Shafi,
}

impl School {
    pub fn as_str(&self) -> &'static str {
        match self {
            School::Hanafi => "hanafi",
            School::Shafi => "shafi",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            School::Hanafi => "Hanafi",
            School::Shafi => "Shafi",
        }
    }

    /// Value of the `school` query parameter: 0 = Shafi (standard Asr), 1 = Hanafi.
    pub fn api_param(&self) -> u8 {
        match self {
            School::Shafi => 0,
            School::Hanafi => 1,
        }
    }

    pub fn toggled(&self) -> School {
        match self {
            School::Hanafi => School::Shafi,
            School::Shafi => School::Hanafi,
        }
    }
}

impl std::fmt::Display for School {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for School {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hanafi" | "hanfi" => Ok(School::Hanafi),
            "shafi" | "shafii" | "shafi'i" => Ok(School::Shafi),
            _ => Err(anyhow::anyhow!("Unknown school: '{}' (use hanafi or shafi)", s)),
        }
    }
}
