use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::engine::types::{SpeedUnit, TestType};
use crate::rating::SpeedRating;
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, bits_per_second: f64, test_type: TestType, unit: SpeedUnit) {
    let color = theme::transfer_color(test_type);
    let rating = SpeedRating::from_rounded_mbps(bits_per_second / 1_000_000.0);

    let mut speed_text = format!("{:.1}", unit.convert(bits_per_second));
    if unit == SpeedUnit::Both {
        speed_text.push_str(&format!(
            " / {:.1} {}",
            SpeedUnit::MegabytesPerSec.convert(bits_per_second),
            SpeedUnit::MegabytesPerSec.label()
        ));
    }
    let lines = vec![
        Line::from(Span::styled(
            speed_text,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(unit.label(), Style::default().fg(theme::DIM_TEXT)),
            Span::raw(" · "),
            Span::styled(
                rating.to_string(),
                Style::default().fg(theme::rating_color(rating)),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
