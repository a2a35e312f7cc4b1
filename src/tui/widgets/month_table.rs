use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{DayRecord, MonthTimetable, PrayerName};
use crate::prayer_times::LoadState;
use crate::tui::theme;
use crate::utils::format::time_cell;

const COLUMNS: [PrayerName; 6] = [
    PrayerName::Fajr,
    PrayerName::Sunrise,
    PrayerName::Dhuhr,
    PrayerName::Asr,
    PrayerName::Maghrib,
    PrayerName::Isha,
];

pub fn render(frame: &mut Frame, area: Rect, state: &LoadState, scroll: usize) {
    match state {
        LoadState::Ready(month) => render_month(frame, area, month, scroll, false),
        LoadState::Refreshing(month) => render_month(frame, area, month, scroll, true),
        LoadState::Loading => message(frame, area, vec![Line::from(Span::styled(
            "Loading prayer times…",
            theme::dim(),
        ))]),
        LoadState::Empty => message(frame, area, vec![Line::from(Span::styled(
            "No prayer times loaded",
            theme::dim(),
        ))]),
        LoadState::Failed(err) => {
            let mut lines = vec![
                Line::from(Span::styled("Could not load prayer times", theme::red())),
                Line::from(""),
                Line::from(Span::styled(err.to_string(), theme::dim())),
            ];
            if err.is_retryable() {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("[r]", theme::gold()),
                    Span::styled(" retry", theme::dim()),
                ]));
            }
            message(frame, area, lines);
        }
    }
}

fn block(title: String) -> Block<'static> {
    Block::default()
        .title(Span::styled(title, theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface())
}

fn message(frame: &mut Frame, area: Rect, lines: Vec<Line>) {
    let paragraph = Paragraph::new(lines)
        .block(block(" Month ".to_string()))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_month(
    frame: &mut Frame,
    area: Rect,
    month: &MonthTimetable,
    scroll: usize,
    refreshing: bool,
) {
    let mut header_cells = vec![Cell::from("Date"), Cell::from("Day")];
    header_cells.extend(COLUMNS.iter().map(|p| Cell::from(p.as_str())));
    let header = Row::new(header_cells).style(theme::gold().add_modifier(Modifier::BOLD));

    let rows = month.days.iter().enumerate().map(|(i, day)| day_row(i, day));

    let mut widths = vec![Constraint::Length(8), Constraint::Length(10)];
    widths.extend(COLUMNS.iter().map(|_| Constraint::Length(8)));

    let mut title = format!(" {}-{:02} ", month.key.year, month.key.month);
    if refreshing {
        title.push_str("· refreshing… ");
    }
    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title))
        .column_spacing(1);

    let mut state = TableState::default().with_offset(scroll);
    frame.render_stateful_widget(table, area, &mut state);
}

fn day_row(index: usize, day: &DayRecord) -> Row<'static> {
    let mut cells = vec![
        Cell::from(day.formatted_date.clone()),
        Cell::from(day.weekday.clone().unwrap_or_default()),
    ];
    cells.extend(
        COLUMNS
            .iter()
            .map(|p| Cell::from(time_cell(day.timings.get(*p)))),
    );

    let style = if day.is_today {
        theme::today_row()
    } else {
        theme::stripe_row(index)
    };
    Row::new(cells).style(style)
}

/// Scroll offset that puts today's row first, if the month has one.
pub fn today_offset(month: &MonthTimetable) -> usize {
    month.days.iter().position(|d| d.is_today).unwrap_or(0)
}
