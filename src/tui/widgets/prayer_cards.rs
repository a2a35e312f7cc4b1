use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::{PrayerSlot, ResolvedPrayerState};
use crate::tui::theme;
use crate::utils::format::format_duration_secs;

/// Current and upcoming prayer side by side. `countdown` is seconds until
/// the next prayer.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    resolved: Option<&ResolvedPrayerState>,
    countdown: Option<i64>,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let current = resolved.map(|r| &r.current);
    let next = resolved.map(|r| &r.next);

    let footer = match countdown {
        Some(secs) => Line::from(vec![
            Span::styled("  in  ", theme::dim()),
            Span::styled(
                format_duration_secs(secs),
                theme::amber().add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(""),
    };

    card(frame, columns[0], " Current Prayer ", current, theme::green(), Line::from(""));
    card(frame, columns[1], " Upcoming Prayer ", next, theme::amber(), footer);
}

fn card(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    slot: Option<&PrayerSlot>,
    accent: Style,
    footer: Line,
) {
    let block = Block::default()
        .title(Span::styled(title, theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());

    let content: Vec<Line> = match slot {
        None => vec![
            Line::from(""),
            Line::from(Span::styled("  No data", theme::dim())),
        ],
        Some(slot) => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", slot.name.to_uppercase()),
                accent.add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(format!("  {}", slot.time), theme::bold())),
            footer,
        ],
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
