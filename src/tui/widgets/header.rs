use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::app::App;
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = Span::styled(
        " SPEED TEST ",
        Style::default()
            .fg(theme::HEADER_COLOR)
            .add_modifier(Modifier::BOLD),
    );

    let info = if let Some(ref server) = app.current_server {
        Span::styled(
            format!(" {server} · server {}/{} ", app.server_index, app.server_total),
            Style::default().fg(theme::DIM_TEXT),
        )
    } else {
        Span::styled(
            format!(" {} servers queued ", app.server_total),
            Style::default().fg(theme::DIM_TEXT),
        )
    };

    let line = Line::from(vec![title, Span::raw("  "), info]);
    let paragraph = Paragraph::new(line);
    f.render_widget(paragraph, area);
}
