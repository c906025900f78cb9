use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Sparkline};
use ratatui::Frame;

use crate::engine::types::LatencyResult;
use crate::tui::theme;

/// Sparkline of the probes taken so far plus summary stats.
///
/// `done` and `total` count probes against the current server.
pub fn render(
    f: &mut Frame,
    area: Rect,
    samples: &[f64],
    stats: &LatencyResult,
    done: u32,
    total: u32,
) {
    if area.height < 4 {
        return;
    }

    // Sparkline for latency samples
    let spark_height = area.height.saturating_sub(2).min(3);
    let spark_area = Rect {
        x: area.x + 2,
        y: area.y,
        width: area.width.saturating_sub(4),
        height: spark_height,
    };

    if !samples.is_empty() {
        // Sparkline wants integers; keep 0.01 ms resolution.
        let spark_data: Vec<u64> = samples.iter().map(|&v| (v * 100.0) as u64).collect();
        let sparkline = Sparkline::default()
            .data(&spark_data)
            .style(Style::default().fg(theme::LATENCY_COLOR));
        f.render_widget(sparkline, spark_area);
    }

    let stats_area = Rect {
        x: area.x,
        y: area.y + spark_height + 1,
        width: area.width,
        height: 1,
    };

    let dim = Style::default().fg(theme::DIM_TEXT);
    let stats_line = Line::from(vec![
        Span::styled(
            format!("{:.1} ms", stats.avg_ms),
            Style::default().fg(theme::LATENCY_COLOR),
        ),
        Span::styled(" avg    ", dim),
        Span::styled(format!("{:.1}", stats.median_ms), dim),
        Span::styled(" median    ", dim),
        Span::styled(format!("{:.1}", stats.min_ms), dim),
        Span::styled(" min    ", dim),
        Span::styled(format!("{:.1}", stats.max_ms), dim),
        Span::styled(" max    ", dim),
        Span::styled(format!("{:.1}", stats.jitter_ms), dim),
        Span::styled(" jitter    ", dim),
        Span::styled(format!("{done}/{total}"), dim),
        Span::styled(" probes", dim),
    ]);

    let paragraph = Paragraph::new(stats_line).alignment(Alignment::Center);
    f.render_widget(paragraph, stats_area);
}
