use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::app::{App, Phase};
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let progress = app.overall_progress();
    let bar_width = area.width.saturating_sub(24) as usize;
    let filled = (progress * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);

    let label = match app.phase {
        Phase::Connecting => "Connecting...".to_string(),
        Phase::Latency => {
            format!("Latency {}/{}", app.latency_index, app.latency_total)
        }
        Phase::Download | Phase::Upload => {
            let direction = app
                .current_test_type
                .map(|t| t.to_string())
                .unwrap_or_default();
            match app.transfer_percent {
                Some(p) => format!("{direction} {p:.0}%"),
                None => format!("{direction} …"),
            }
        }
        Phase::Results => "Complete".to_string(),
        Phase::Cancelled => "Cancelled".to_string(),
        Phase::Failed => "Failed".to_string(),
    };

    let line = Line::from(vec![
        Span::styled("▰".repeat(filled), Style::default().fg(theme::HEADER_COLOR)),
        Span::styled("▱".repeat(empty), Style::default().fg(theme::DIM_TEXT)),
        Span::raw("  "),
        Span::styled(label, Style::default().fg(theme::DIM_TEXT)),
    ]);

    let paragraph = Paragraph::new(line);
    f.render_widget(paragraph, area);
}
