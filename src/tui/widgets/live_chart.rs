use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType};
use ratatui::Frame;

use crate::engine::types::{SpeedUnit, TestType};
use crate::tui::theme;

/// Plot live throughput samples (given in Mbps) in the selected unit.
pub fn render(f: &mut Frame, area: Rect, data_mbps: &[f64], test_type: TestType, unit: SpeedUnit) {
    if data_mbps.is_empty() || area.width < 10 || area.height < 4 {
        return;
    }

    let color = theme::transfer_color(test_type);

    let points: Vec<(f64, f64)> = data_mbps
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, unit.convert(v * 1_000_000.0)))
        .collect();

    let max_y = points.iter().map(|p| p.1).fold(0.0_f64, f64::max).max(1.0);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let x_axis = Axis::default()
        .bounds([0.0, (points.len().max(2) - 1) as f64])
        .style(Style::default().fg(theme::DIM_TEXT));

    let y_axis = Axis::default()
        .bounds([0.0, max_y * 1.1])
        .labels(vec![
            Span::from("0"),
            Span::from(format!("{:.0}", max_y / 2.0)),
            Span::from(format!("{:.0} {}", max_y, unit.label())),
        ])
        .style(Style::default().fg(theme::DIM_TEXT));

    let chart = Chart::new(vec![dataset]).x_axis(x_axis).y_axis(y_axis);

    f.render_widget(chart, area);
}
