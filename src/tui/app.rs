use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::warn;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use crate::config::AppConfig;
use crate::db::repository::CacheRepo;
use crate::models::{DayRecord, PrayerName, RawDay, ResolvedPrayerState};
use crate::prayer_times::calendar::{key_for, set_school};
use crate::prayer_times::resolver::seconds_until;
use crate::prayer_times::{
    resolve, AladhanClient, CalendarSource, FetchError, FetchTicket, LoadState, TimetableStore,
};
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::{header, month_table, prayer_cards, statusbar, sun_times};
use crate::utils::hijri::format_hijri;

const REFRESHING: &str = "Refreshing…";

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Help,
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub store: TimetableStore,
    pub scroll: usize,
    pub should_quit: bool,
    /// One-line message shown in the status bar until the next action.
    pub status: Option<String>,
    today: NaiveDate,
    config_path: PathBuf,
    source: Arc<dyn CalendarSource>,
    events: mpsc::Sender<Event>,
}

impl App {
    pub fn new(
        config: AppConfig,
        config_path: PathBuf,
        source: Arc<dyn CalendarSource>,
        events: mpsc::Sender<Event>,
        today: NaiveDate,
    ) -> Self {
        Self {
            view: View::Dashboard,
            config,
            store: TimetableStore::new(),
            scroll: 0,
            should_quit: false,
            status: None,
            today,
            config_path,
            source,
            events,
        }
    }

    /// Make sure the month for today under the current settings is loaded
    /// or on its way.
    pub fn ensure_month(&mut self, conn: &Connection) {
        let key = key_for(&self.config, self.today);
        if let Some(ticket) = self.store.request(key) {
            self.start(conn, ticket, false);
        }
    }

    /// Serve `ticket` from the cache when allowed, otherwise fetch it on a
    /// worker thread that reports back through the event channel.
    fn start(&mut self, conn: &Connection, ticket: FetchTicket, force: bool) {
        if !force {
            match CacheRepo::get_month(conn, &ticket.key) {
                Ok(Some(days)) => {
                    self.apply(ticket, Ok(days));
                    return;
                }
                Ok(None) => {}
                Err(e) => warn!("Cache read failed for {}: {:#}", ticket.key, e),
            }
        }

        let source = Arc::clone(&self.source);
        let tx = self.events.clone();
        thread::spawn(move || {
            let result = source.fetch_month(&ticket.key);
            // The loop may already have exited.
            let _ = tx.send(Event::Fetched { ticket, result });
        });
    }

    pub fn on_fetched(
        &mut self,
        conn: &Connection,
        ticket: FetchTicket,
        result: Result<Vec<RawDay>, FetchError>,
    ) {
        if self.store.is_current(&ticket) {
            if let Ok(days) = &result {
                if let Err(e) = CacheRepo::store_month(conn, &ticket.key, days) {
                    warn!("Could not cache {}: {:#}", ticket.key, e);
                }
            }
        }
        self.apply(ticket, result);
    }

    fn apply(&mut self, ticket: FetchTicket, result: Result<Vec<RawDay>, FetchError>) {
        if !self.store.complete(&ticket, result, self.today) {
            return;
        }
        if let Some(e) = self.store.refresh_error() {
            self.status = Some(format!("Refresh failed, showing cached times: {}", e));
            return;
        }
        if self.status.as_deref() == Some(REFRESHING) {
            self.status = None;
        }
        if let Some(month) = self.store.timetable() {
            self.scroll = month_table::today_offset(month);
        }
    }

    /// Follow the wall clock: re-mark today inside the month, and load the
    /// next month once the date crosses into it.
    pub fn tick(&mut self, conn: &Connection, today: NaiveDate) {
        if today != self.today {
            self.today = today;
            self.store.roll_day(today);
            if let Some(month) = self.store.timetable() {
                self.scroll = month_table::today_offset(month);
            }
        }
        self.ensure_month(conn);
    }

    pub fn toggle_school(&mut self, conn: &Connection) {
        let school = self.config.calendar.school.toggled();
        if let Err(e) = set_school(conn, &mut self.config, school) {
            self.status = Some(format!("School change failed: {:#}", e));
            return;
        }
        self.status = match self.config.save_to(&self.config_path) {
            Ok(()) => Some(format!("School: {}", school.display_name())),
            Err(e) => {
                warn!("Could not save config: {:#}", e);
                Some(format!("School: {} (not saved)", school.display_name()))
            }
        };
        self.store.invalidate();
        self.ensure_month(conn);
    }

    /// `r`: retry after a failure, otherwise refetch the loaded month.
    pub fn refresh(&mut self, conn: &Connection) {
        let ticket = match self.store.state() {
            LoadState::Loading | LoadState::Refreshing(_) => return,
            LoadState::Failed(_) => self.store.retry(),
            LoadState::Empty | LoadState::Ready(_) => self.store.reload(),
        };
        match ticket {
            Some(ticket) => {
                self.status = Some(REFRESHING.to_string());
                self.start(conn, ticket, true);
            }
            None => self.ensure_month(conn),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, conn: &Connection) {
        // Ignore release/repeat events from some terminals
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.view {
            View::Help => self.view = View::Dashboard,
            View::Dashboard => self.handle_dashboard_key(key, conn),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent, conn: &Connection) {
        self.status = None;
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.view = View::Help,
            KeyCode::Char('h') => self.toggle_school(conn),
            KeyCode::Char('r') => self.refresh(conn),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => {
                let max = self
                    .store
                    .timetable()
                    .map(|m| m.days.len().saturating_sub(1))
                    .unwrap_or(0);
                if self.scroll < max {
                    self.scroll += 1;
                }
            }
            KeyCode::Home => {
                if let Some(month) = self.store.timetable() {
                    self.scroll = month_table::today_offset(month);
                }
            }
            _ => {}
        }
    }

    fn today_record(&self) -> Option<&DayRecord> {
        self.store.timetable().and_then(|m| m.today())
    }

    /// Recomputed on every frame from the loaded day and the clock.
    pub fn resolved_at(&self, now: NaiveTime) -> Option<ResolvedPrayerState> {
        let day = self.today_record()?;
        resolve(&day.timings, now).ok()
    }

    pub fn draw(&self, frame: &mut Frame) {
        self.draw_dashboard(frame);
        if self.view == View::Help {
            self.draw_help_overlay(frame);
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // header
                Constraint::Length(6), // prayer cards + sun times
                Constraint::Min(0),    // month table
                Constraint::Length(1), // status bar
            ])
            .split(area);

        let day = self.today_record();
        let hijri = day.and_then(|d| d.hijri.as_ref()).map(format_hijri);
        header::render(
            frame,
            outer_chunks[0],
            &self.config.location.name,
            self.config.calendar.school.display_name(),
            hijri.as_deref(),
        );

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(outer_chunks[1]);

        let now = Local::now().time();
        let resolved = self.resolved_at(now);
        let tomorrow = self
            .store
            .timetable()
            .and_then(|m| m.tomorrow())
            .map(|d| &d.timings);
        let countdown = resolved
            .as_ref()
            .and_then(|r| seconds_until(&r.next, tomorrow, now));
        prayer_cards::render(frame, top[0], resolved.as_ref(), countdown);

        let timings = day.map(|d| &d.timings);
        sun_times::render(
            frame,
            top[1],
            timings.and_then(|t| t.get(PrayerName::Sunrise)),
            timings.and_then(|t| t.get(PrayerName::Sunset)),
        );

        month_table::render(frame, outer_chunks[2], self.store.state(), self.scroll);
        statusbar::render(frame, outer_chunks[3], self.status.as_deref());
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();
        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: area.height / 2,
        };

        frame.render_widget(Clear, popup_area);

        let bindings = [
            ("  [h]      ", "Switch school (Hanafi / Shafi)"),
            ("  [r]      ", "Refresh or retry this month"),
            ("  [↑] [↓]  ", "Scroll the month"),
            ("  [Home]   ", "Jump to today"),
            ("  [?]      ", "This help"),
            ("  [Esc]    ", "Quit"),
        ];

        let mut help_text = vec![
            Line::from(Span::styled(
                "  Keybindings",
                theme::gold().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        help_text.extend(bindings.iter().map(|(key, label)| {
            Line::from(vec![
                Span::styled(*key, theme::gold()),
                Span::styled(*label, theme::dim()),
            ])
        }));
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            "  Press any key to close",
            theme::dim(),
        )));

        let block = Block::default()
            .title(Span::styled(" Help ", theme::gold()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::gold())
            .style(theme::surface());

        frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
    }
}

pub fn run(
    conn: Connection,
    config: AppConfig,
    config_path: PathBuf,
    client: AladhanClient,
) -> Result<()> {
    let events = EventHandler::new(500);
    let mut app = App::new(
        config,
        config_path,
        Arc::new(client),
        events.sender(),
        Local::now().date_naive(),
    );
    app.ensure_month(&conn);

    let mut terminal = ratatui::init();

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        match events.next()? {
            Event::Key(key) => {
                app.handle_key(key, &conn);
                if app.should_quit {
                    break;
                }
            }
            Event::Tick => app.tick(&conn, Local::now().date_naive()),
            Event::Fetched { ticket, result } => app.on_fetched(&conn, ticket, result),
        }
    }

    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{CalendarKey, School};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct FakeSource {
        calls: AtomicUsize,
        offline: AtomicBool,
    }

    impl FakeSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                offline: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CalendarSource for FakeSource {
        fn fetch_month(&self, key: &CalendarKey) -> Result<Vec<RawDay>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(FetchError::Network("offline".into()));
            }
            let asr = if key.school == School::Hanafi { "17:50 (PKT)" } else { "16:57 (PKT)" };
            let date = format!("05-{:02}-{}", key.month, key.year);
            Ok(serde_json::from_value(serde_json::json!([
                {
                    "timings": {
                        "Fajr": "03:41 (PKT)", "Sunrise": "05:00 (PKT)", "Dhuhr": "12:05 (PKT)",
                        "Asr": asr, "Sunset": "19:10 (PKT)", "Maghrib": "19:10 (PKT)",
                        "Isha": "20:38 (PKT)"
                    },
                    "date": { "gregorian": { "date": date } }
                }
            ]))
            .unwrap())
        }
    }

    struct Harness {
        app: App,
        conn: Connection,
        rx: mpsc::Receiver<Event>,
        source: Arc<FakeSource>,
        _dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let conn = Connection::open_in_memory().unwrap();
            run_migrations(&conn).unwrap();
            let (tx, rx) = mpsc::channel();
            let source = FakeSource::new();
            let app = App::new(
                AppConfig::default(),
                dir.path().join("config.toml"),
                source.clone(),
                tx,
                june(5),
            );
            Self { app, conn, rx, source, _dir: dir }
        }

        /// Deliver one finished fetch to the app.
        fn pump(&mut self) {
            match self.rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                Event::Fetched { ticket, result } => self.app.on_fetched(&self.conn, ticket, result),
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn asr(app: &App) -> Option<String> {
        app.store
            .timetable()
            .and_then(|m| m.today())
            .and_then(|d| d.timings.get(PrayerName::Asr).map(str::to_string))
    }

    #[test]
    fn test_fetches_once_then_serves_from_memory() {
        let mut h = Harness::new();
        h.app.ensure_month(&h.conn);
        assert!(matches!(h.app.store.state(), LoadState::Loading));
        h.pump();
        assert_eq!(asr(&h.app).as_deref(), Some("17:50"));

        h.app.ensure_month(&h.conn);
        h.app.tick(&h.conn, june(5));
        assert_eq!(h.source.calls(), 1);
        assert_eq!(CacheRepo::count(&h.conn).unwrap(), 1);
    }

    #[test]
    fn test_cached_month_skips_network() {
        let mut h = Harness::new();
        let key = key_for(&h.app.config, june(5));
        let days = h.source.fetch_month(&key).unwrap();
        CacheRepo::store_month(&h.conn, &key, &days).unwrap();

        h.app.ensure_month(&h.conn);
        assert!(matches!(h.app.store.state(), LoadState::Ready(_)));
        assert_eq!(h.source.calls(), 1);
    }

    #[test]
    fn test_school_toggle_mid_flight_keeps_latest() {
        let mut h = Harness::new();
        h.app.ensure_month(&h.conn);
        h.app.toggle_school(&h.conn);
        assert_eq!(h.app.config.calendar.school, School::Shafi);

        // Both responses arrive, in whatever order the threads finish.
        h.pump();
        h.pump();

        let month = h.app.store.timetable().unwrap();
        assert_eq!(month.key.school, School::Shafi);
        assert_eq!(asr(&h.app).as_deref(), Some("16:57"));

        let shafi_key = key_for(&h.app.config, june(5));
        let mut hanafi_key = shafi_key.clone();
        hanafi_key.school = School::Hanafi;
        assert!(CacheRepo::get_month(&h.conn, &shafi_key).unwrap().is_some());
        assert!(CacheRepo::get_month(&h.conn, &hanafi_key).unwrap().is_none());

        let saved = AppConfig::load_from(&h.app.config_path).unwrap();
        assert_eq!(saved.calendar.school, School::Shafi);
    }

    #[test]
    fn test_failure_waits_for_retry() {
        let mut h = Harness::new();
        h.source.offline.store(true, Ordering::SeqCst);
        h.app.ensure_month(&h.conn);
        h.pump();
        assert!(matches!(h.app.store.state(), LoadState::Failed(FetchError::Network(_))));

        h.app.tick(&h.conn, june(5));
        assert_eq!(h.source.calls(), 1);

        h.source.offline.store(false, Ordering::SeqCst);
        h.app.refresh(&h.conn);
        h.pump();
        assert!(h.app.store.timetable().is_some());
        assert_eq!(h.source.calls(), 2);
    }

    #[test]
    fn test_failed_refresh_keeps_loaded_month() {
        let mut h = Harness::new();
        h.app.ensure_month(&h.conn);
        h.pump();

        h.source.offline.store(true, Ordering::SeqCst);
        h.app.refresh(&h.conn);
        assert!(matches!(h.app.store.state(), LoadState::Refreshing(_)));
        h.pump();

        assert!(matches!(h.app.store.state(), LoadState::Ready(_)));
        let state = h.app.resolved_at(NaiveTime::from_hms_opt(13, 0, 0).unwrap()).unwrap();
        assert_eq!(state.next.name, "Asr");
        assert!(h.app.status.as_deref().unwrap().starts_with("Refresh failed"));

        h.app.tick(&h.conn, june(5));
        assert!(h.app.store.timetable().is_some());
        assert_eq!(h.source.calls(), 2);
        assert_eq!(CacheRepo::count(&h.conn).unwrap(), 1);
    }

    #[test]
    fn test_successful_refresh_clears_status() {
        let mut h = Harness::new();
        h.app.ensure_month(&h.conn);
        h.pump();
        h.app.refresh(&h.conn);
        assert_eq!(h.app.status.as_deref(), Some(REFRESHING));
        h.pump();
        assert!(h.app.status.is_none());
        assert!(matches!(h.app.store.state(), LoadState::Ready(_)));
        assert_eq!(h.source.calls(), 2);
    }

    #[test]
    fn test_month_rollover_loads_next_month() {
        let mut h = Harness::new();
        h.app.ensure_month(&h.conn);
        h.pump();

        let july = NaiveDate::from_ymd_opt(2024, 7, 5).unwrap();
        h.app.tick(&h.conn, july);
        assert!(matches!(h.app.store.state(), LoadState::Loading));
        h.pump();
        let month = h.app.store.timetable().unwrap();
        assert_eq!(month.key.month, 7);
        assert!(month.today().is_some());
    }

    #[test]
    fn test_resolved_from_today() {
        let mut h = Harness::new();
        assert!(h.app.resolved_at(NaiveTime::from_hms_opt(13, 0, 0).unwrap()).is_none());
        h.app.ensure_month(&h.conn);
        h.pump();
        let state = h.app.resolved_at(NaiveTime::from_hms_opt(13, 0, 0).unwrap()).unwrap();
        assert_eq!(state.current.name, "Dhuhr");
        assert_eq!(state.next.name, "Asr");
    }
}
