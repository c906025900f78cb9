use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::app::{App, Phase};
use super::theme;
use super::widgets;
use crate::engine::types::TestType;

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    // Outer border
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_COLOR));
    f.render_widget(block, size);

    let inner = Rect {
        x: size.x + 2,
        y: size.y + 1,
        width: size.width.saturating_sub(4),
        height: size.height.saturating_sub(2),
    };

    if inner.height < 3 || inner.width < 20 {
        return;
    }

    // Layout: header (1) | phase (1) | content (flex) | progress (1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(inner);

    widgets::header::render(f, chunks[0], app);
    render_phase_label(f, chunks[1], app);

    let content = chunks[2];
    match app.phase {
        Phase::Connecting => {
            render_message(f, content, "Preparing servers...", theme::DIM_TEXT);
        }
        Phase::Latency => {
            render_latency(f, content, app);
        }
        Phase::Download | Phase::Upload => {
            render_throughput(f, content, app);
        }
        Phase::Results => {
            widgets::results::render(f, content, app);
        }
        Phase::Cancelled => {
            render_message(f, content, "Test cancelled. Press q to quit", theme::DIM_TEXT);
        }
        Phase::Failed => {
            widgets::results::render(f, content, app);
        }
    }

    widgets::progress::render(f, chunks[3], app);
}

fn render_phase_label(f: &mut Frame, area: Rect, app: &App) {
    let (label, color) = match app.phase {
        Phase::Connecting => ("CONNECTING", theme::DIM_TEXT),
        Phase::Latency => ("LATENCY", theme::LATENCY_COLOR),
        Phase::Download => ("DOWNLOAD", theme::DOWNLOAD_COLOR),
        Phase::Upload => ("UPLOAD", theme::UPLOAD_COLOR),
        Phase::Results => ("RESULTS", theme::BRIGHT_TEXT),
        Phase::Cancelled => ("CANCELLED", theme::DIM_TEXT),
        Phase::Failed => ("ALL SERVERS FAILED", theme::ERROR_COLOR),
    };

    let mut spans = vec![Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(failure) = app.result.failures.last().filter(|_| !app.is_finished()) {
        spans.push(Span::styled(
            format!("   ✗ {}: {} failed", failure.server, failure.stage),
            Style::default().fg(theme::ERROR_COLOR),
        ));
    } else if let Some(err) = app.errors.last().filter(|_| app.phase == Phase::Latency) {
        spans.push(Span::styled(
            format!("   {err}"),
            Style::default().fg(theme::DIM_TEXT),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_message(f: &mut Frame, area: Rect, text: &str, color: ratatui::style::Color) {
    let msg = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
        .alignment(Alignment::Center);

    let centered = Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 1,
    };
    f.render_widget(msg, centered);
}

fn render_latency(f: &mut Frame, area: Rect, app: &App) {
    let live = crate::engine::types::LatencyResult::from_samples(app.latency_samples.clone());
    let stats = app.latency_result.as_ref().unwrap_or(&live);

    widgets::latency_plot::render(
        f,
        area,
        &app.latency_samples,
        stats,
        app.latency_index,
        app.latency_total,
    );
}

fn render_throughput(f: &mut Frame, area: Rect, app: &App) {
    let test_type = app.current_test_type.unwrap_or(TestType::Download);
    let bits_per_second = app.current_mbps * 1_000_000.0;

    if area.height < 6 {
        // Small terminal: just show speed gauge
        widgets::speed_gauge::render(f, area, bits_per_second, test_type, app.unit);
        return;
    }

    // Split: gauge (3) | chart (rest)
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);

    widgets::speed_gauge::render(f, chunks[0], bits_per_second, test_type, app.unit);
    widgets::live_chart::render(f, chunks[1], &app.chart_data, test_type, app.unit);
}
