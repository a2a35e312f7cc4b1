use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, Local, NaiveDate, Timelike};
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;

use crate::config::AppConfig;
use crate::db::repository::{CacheRepo, MetaRepo};
use crate::models::{Coordinates, MonthTimetable, PrayerName, School};
use crate::prayer_times::calendar::{self, CalendarError};
use crate::prayer_times::client::{method_name, AladhanClient, CalendarSource, CALC_METHODS};
use crate::prayer_times::resolver::{minutes_since_midnight, resolve, seconds_until};
use crate::utils::format::{format_duration_secs, time_cell};
use crate::utils::hijri::format_hijri;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

// ─── Loading ─────────────────────────────────────────────────────────────────

pub fn make_client(config: &AppConfig) -> Result<AladhanClient> {
    Ok(AladhanClient::new(
        &config.calendar.api_url,
        config.calendar.timeout_secs,
    )?)
}

/// Load the month containing `date`, turning upstream failures into a
/// message that tells the user how to retry.
fn load_month(
    conn: &Connection,
    config: &AppConfig,
    source: &dyn CalendarSource,
    date: NaiveDate,
    today: NaiveDate,
    force: bool,
) -> Result<MonthTimetable> {
    let key = calendar::key_for(config, date);
    calendar::load_month(conn, source, &key, today, force).map_err(describe_failure)
}

fn describe_failure(err: CalendarError) -> anyhow::Error {
    match err {
        CalendarError::Fetch(e) if e.is_retryable() => {
            anyhow!(e).context("Could not fetch prayer times; run `waqt refresh` to retry")
        }
        CalendarError::Fetch(e) => anyhow!(e).context("Could not fetch prayer times"),
        CalendarError::Cache(e) => e,
    }
}

// ─── Setup ───────────────────────────────────────────────────────────────────

pub struct SetupArgs {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub method: Option<u8>,
    pub school: Option<String>,
    pub list_methods: bool,
    pub reset: bool,
}

pub fn handle_setup(
    conn: &Connection,
    config: &mut AppConfig,
    config_path: &Path,
    args: SetupArgs,
) -> Result<()> {
    if args.list_methods {
        println!();
        for (id, name) in CALC_METHODS {
            println!("  {:>2}  {}", id, name);
        }
        println!();
        return Ok(());
    }

    // Validate everything before touching the cache or the config.
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        if !Coordinates::new(lat, lng).is_valid() {
            bail!("Coordinates out of range: {}, {}", lat, lng);
        }
    }
    if let Some(method) = args.method {
        if method_name(method).is_none() {
            bail!("Unknown calculation method {}. Use --list-methods to see them.", method);
        }
    }
    let school = args.school.as_deref().map(School::from_str).transpose()?;

    if args.reset {
        CacheRepo::clear_all(conn)?;
        *config = AppConfig::default();
    }

    if let Some(name) = args.name {
        config.location.name = name;
    }
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        config.location.latitude = lat;
        config.location.longitude = lng;
    }
    if let Some(method) = args.method {
        config.calendar.method = method;
    }
    if let Some(school) = school {
        calendar::set_school(conn, config, school)?;
    }

    config.save_to(config_path)?;
    MetaRepo::set(conn, "setup_done", "1")?;

    println!();
    println_colored!(GREEN, "  ✓ Settings saved");
    println!(
        "  Location  {} ({:.4}, {:.4})",
        config.location.name, config.location.latitude, config.location.longitude
    );
    println!(
        "  Method    {} ({})",
        method_name(config.calendar.method).unwrap_or("Unknown"),
        config.calendar.method
    );
    println!("  School    {}", config.calendar.school);
    println!();
    Ok(())
}

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn handle_times(conn: &Connection, config: &AppConfig, source: &dyn CalendarSource) -> Result<()> {
    let now = Local::now();
    let today = now.date_naive();
    let now_time = now.time();

    let month = load_month(conn, config, source, today, today, false)?;
    let day = month
        .today()
        .ok_or_else(|| anyhow!("Today is missing from the fetched month"))?;

    println!();
    println_colored!(
        GOLD,
        "  Prayer Times — {} ({}) {}",
        config.location.name,
        config.calendar.school,
        day.formatted_date
    );
    if let Some(hijri) = &day.hijri {
        println_colored!(DIM, "  {}", format_hijri(hijri));
    }
    println!();

    let state = resolve(&day.timings, now_time)?;
    let now_minutes = now_time.hour() * 60 + now_time.minute();
    let current = state.current.name.parse::<PrayerName>().ok();
    let next = state.next.name.parse::<PrayerName>().ok();

    for prayer in PrayerName::obligatory() {
        let time = day.timings.get(prayer);
        let line = format!("{:<10}  {}", prayer.as_str(), time_cell(time));
        if next == Some(prayer) {
            println_colored!(AMBER, "  {}  ← next", line);
        } else if current == Some(prayer) {
            println_colored!(GREEN, "  {}  ← now", line);
        } else if time
            .and_then(minutes_since_midnight)
            .is_some_and(|m| m < now_minutes)
        {
            println_colored!(DIM, "  {}", line);
        } else {
            println_colored!(BOLD, "  {}", line);
        }
    }

    let tomorrow = month.tomorrow().map(|d| &d.timings);
    if let Some(secs) = seconds_until(&state.next, tomorrow, now_time) {
        println!();
        println_colored!(
            AMBER,
            "  Next: {} in {}",
            state.next.name,
            format_duration_secs(secs)
        );
    }

    println!();
    println_colored!(
        DIM,
        "  Sunrise {}  ·  Sunset {}",
        time_cell(day.timings.get(PrayerName::Sunrise)),
        time_cell(day.timings.get(PrayerName::Sunset))
    );
    println!();
    Ok(())
}

// ─── Month ───────────────────────────────────────────────────────────────────

pub fn handle_month(
    conn: &Connection,
    config: &AppConfig,
    source: &dyn CalendarSource,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let date = month_date(today, year, month)?;
    let timetable = load_month(conn, config, source, date, today, false)?;
    print_month(&timetable, config);
    Ok(())
}

/// A day inside the requested month; the current month when none is given.
fn month_date(today: NaiveDate, year: Option<i32>, month: Option<u32>) -> Result<NaiveDate> {
    match month {
        Some(m) => {
            let y = year.unwrap_or_else(|| today.year());
            NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| anyhow!("Invalid month {}-{}", y, m))
        }
        None => Ok(today),
    }
}

fn print_month(timetable: &MonthTimetable, config: &AppConfig) {
    println!();
    println_colored!(
        GOLD,
        "  Monthly Schedule — {} {}-{:02} ({})",
        config.location.name,
        timetable.key.year,
        timetable.key.month,
        config.calendar.school
    );
    println!();

    let mut header = format!("  {:<8}", "Date");
    for prayer in PrayerName::obligatory() {
        header.push_str(&format!("{:>9}", prayer.as_str()));
    }
    println_colored!(BOLD, "{}", header);

    for day in &timetable.days {
        let mut row = format!("  {:<8}", day.formatted_date);
        for prayer in PrayerName::obligatory() {
            row.push_str(&format!("{:>9}", time_cell(day.timings.get(prayer))));
        }
        if day.is_today {
            println_colored!(GREEN, "{}  ◂ today", row);
        } else {
            println!("{}", row);
        }
    }
    println!();
}

// ─── School ──────────────────────────────────────────────────────────────────

pub fn handle_school(
    conn: &Connection,
    config: &mut AppConfig,
    config_path: &Path,
    school: Option<&str>,
) -> Result<()> {
    let Some(school) = school else {
        println!();
        println!("  Prayer timings are calculated for the {} school.", config.calendar.school);
        println_colored!(DIM, "  Change it with `waqt school hanafi` or `waqt school shafi`.");
        println!();
        return Ok(());
    };

    let school = School::from_str(school)?;
    if calendar::set_school(conn, config, school)? {
        config.save_to(config_path)?;
        println_colored!(GREEN, "  ✓ School set to {} — cached timings cleared", school);
    } else {
        println!("  School is already {}", school);
    }
    Ok(())
}

// ─── Refresh ─────────────────────────────────────────────────────────────────

pub fn handle_refresh(conn: &Connection, config: &AppConfig, source: &dyn CalendarSource) -> Result<()> {
    let today = Local::now().date_naive();
    let month = load_month(conn, config, source, today, today, true)?;
    println_colored!(
        GREEN,
        "  ✓ Fetched {} days for {}-{:02}",
        month.days.len(),
        month.key.year,
        month.key.month
    );
    Ok(())
}
