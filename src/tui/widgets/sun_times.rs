use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::tui::theme;
use crate::utils::format::time_cell;

pub fn render(frame: &mut Frame, area: Rect, sunrise: Option<&str>, sunset: Option<&str>) {
    let block = Block::default()
        .title(Span::styled(" Sun Times ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());

    let lines = vec![
        Line::from(vec![
            Span::styled("  ☀ Sunrise  ", theme::amber()),
            Span::styled(time_cell(sunrise), theme::bold()),
        ]),
        Line::from(vec![
            Span::styled("  ☾ Sunset   ", theme::dim()),
            Span::styled(time_cell(sunset), theme::bold()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
