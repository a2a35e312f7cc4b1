use chrono::NaiveDate;
use log::{debug, warn};

use crate::models::{CalendarKey, MonthTimetable, RawDay};
use crate::prayer_times::client::FetchError;
use crate::prayer_times::normalizer::normalize_month;

#[derive(Debug, Clone)]
pub enum LoadState {
    Empty,
    Loading,
    /// A forced reload is in flight; the month it replaces stays usable.
    Refreshing(MonthTimetable),
    Ready(MonthTimetable),
    Failed(FetchError),
}

/// Proof that a fetch was requested. Only the most recent ticket is honoured.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub key: CalendarKey,
    generation: u64,
}

/// Holds the month currently on screen and decides when to fetch another.
///
/// A key is fetched at most once while it stays current. When the key changes
/// while a fetch is in flight, the older response is dropped on arrival.
#[derive(Debug)]
pub struct TimetableStore {
    generation: u64,
    key: Option<CalendarKey>,
    stale: bool,
    state: LoadState,
    refresh_error: Option<FetchError>,
}

impl Default for TimetableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimetableStore {
    pub fn new() -> Self {
        Self {
            generation: 0,
            key: None,
            stale: false,
            state: LoadState::Empty,
            refresh_error: None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn timetable(&self) -> Option<&MonthTimetable> {
        match &self.state {
            LoadState::Ready(month) | LoadState::Refreshing(month) => Some(month),
            _ => None,
        }
    }

    /// Why the last reload failed, while the previously loaded month is kept.
    pub fn refresh_error(&self) -> Option<&FetchError> {
        self.refresh_error.as_ref()
    }

    /// Ask for `key`. Returns a ticket when a fetch must be started, `None`
    /// when that key is already loading, loaded, or has failed (failures wait
    /// for an explicit `retry`).
    pub fn request(&mut self, key: CalendarKey) -> Option<FetchTicket> {
        let same_key = self.key.as_ref() == Some(&key);
        let settled = !matches!(self.state, LoadState::Empty);
        if same_key && settled && !self.stale {
            return None;
        }
        Some(self.issue(key))
    }

    /// Re-issue the current key after a failure.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if !matches!(self.state, LoadState::Failed(_)) {
            return None;
        }
        let key = self.key.clone()?;
        Some(self.issue(key))
    }

    /// Force the current key to be fetched again, whatever the state. A
    /// loaded month stays in place until the reload succeeds.
    pub fn reload(&mut self) -> Option<FetchTicket> {
        let key = self.key.clone()?;
        let previous = match std::mem::replace(&mut self.state, LoadState::Empty) {
            LoadState::Ready(month) | LoadState::Refreshing(month) => Some(month),
            _ => None,
        };
        let ticket = self.issue(key);
        if let Some(month) = previous {
            self.state = LoadState::Refreshing(month);
        }
        Some(ticket)
    }

    /// The loaded month no longer matches the settings; next request refetches.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Whether `ticket` is still the latest request.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply a fetch result. Returns `false` if the ticket was superseded and
    /// the result discarded.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<RawDay>, FetchError>,
        today: NaiveDate,
    ) -> bool {
        if !self.is_current(ticket) {
            warn!("Discarding stale calendar response for {}", ticket.key);
            return false;
        }
        let previous = std::mem::replace(&mut self.state, LoadState::Empty);
        self.state = match (result, previous) {
            (Ok(days), _) => LoadState::Ready(normalize_month(ticket.key.clone(), &days, today)),
            (Err(e), LoadState::Refreshing(month)) => {
                warn!("Reload of {} failed, keeping loaded month: {}", ticket.key, e);
                self.refresh_error = Some(e);
                LoadState::Ready(month)
            }
            (Err(e), _) => LoadState::Failed(e),
        };
        true
    }

    /// Keep `is_today` in step with the clock inside the loaded month.
    pub fn roll_day(&mut self, today: NaiveDate) {
        if let LoadState::Ready(month) | LoadState::Refreshing(month) = &mut self.state {
            month.mark_today(today);
        }
    }

    fn issue(&mut self, key: CalendarKey) -> FetchTicket {
        self.generation += 1;
        debug!("Requesting {} (generation {})", key, self.generation);
        self.key = Some(key.clone());
        self.stale = false;
        self.state = LoadState::Loading;
        self.refresh_error = None;
        FetchTicket {
            key,
            generation: self.generation,
        }
    }
}
