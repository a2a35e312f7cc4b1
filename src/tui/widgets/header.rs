use chrono::Local;
use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, location: &str, school: &str, hijri: Option<&str>) {
    let gregorian_str = Local::now().format("%A, %b %d, %Y").to_string();

    let title_line = Line::from(vec![
        Span::styled("  وقت  ", theme::gold().add_modifier(Modifier::BOLD)),
        Span::styled("waqt", theme::gold()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(location, theme::bold()),
        Span::styled(format!("  ({})", school), theme::dim()),
    ]);

    let mut date_spans = Vec::new();
    if let Some(hijri) = hijri {
        date_spans.push(Span::styled(hijri, theme::amber()));
        date_spans.push(Span::styled("  ·  ", theme::dim()));
    }
    date_spans.push(Span::styled(gregorian_str, theme::dim()));

    let text = vec![title_line, Line::from(""), Line::from(date_spans)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold().add_modifier(Modifier::BOLD))
        .style(theme::base());

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
