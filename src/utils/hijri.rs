use crate::models::RawHijri;

/// Islamic month names in English (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

fn hijri_month_name(month: u32) -> Option<&'static str> {
    match month {
        1..=12 => Some(HIJRI_MONTH_NAMES[month as usize - 1]),
        _ => None,
    }
}

/// "28 Dhu al-Qi'dah 1445". Plain ASCII month names; the service's own
/// transliteration is used only for month numbers we do not know.
pub fn format_hijri(hijri: &RawHijri) -> String {
    let month = hijri_month_name(hijri.month.number).unwrap_or(hijri.month.en.as_str());
    let day = hijri.day.trim_start_matches('0');
    format!("{} {} {}", day, month, hijri.year)
}
