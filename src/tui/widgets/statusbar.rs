use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, status: Option<&str>) {
    let hints = [
        ("[h]", " school  "),
        ("[r]", " refresh  "),
        ("[↑↓]", " scroll  "),
        ("[?]", " help  "),
        ("[Esc]", " quit"),
    ];

    let mut spans = Vec::new();
    if let Some(status) = status {
        spans.push(Span::styled(status, theme::amber()));
        spans.push(Span::styled("   ", theme::dim()));
    }
    for (key, label) in &hints {
        spans.push(Span::styled(*key, theme::gold()));
        spans.push(Span::styled(*label, theme::dim()));
    }

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
