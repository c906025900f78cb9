use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::engine::types::{ServerReport, SpeedUnit, TransferReport};
use crate::tui::app::App;
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    if area.height < 6 {
        return;
    }

    let mut y = area.y;

    // Hero numbers
    if !app.result.reports.is_empty() {
        let hero_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height: 3,
        };
        render_hero(f, hero_area, app);
        y += 4;
    }

    // Per-server table
    if !app.result.reports.is_empty() {
        let table_height =
            (app.result.reports.len() as u16 + 1).min(area.height.saturating_sub(y - area.y + 1));
        let table_area = Rect {
            x: area.x + 1,
            y,
            width: area.width.saturating_sub(2),
            height: table_height,
        };
        render_server_table(f, table_area, &app.result.reports, app.unit);
        y += table_height + 1;
    }

    // Failures
    for failure in &app.result.failures {
        if y >= area.y + area.height - 1 {
            break;
        }
        let line = Line::from(Span::styled(
            format!("✗ {}: {} failed ({})", failure.server, failure.stage, failure.reason),
            Style::default().fg(theme::ERROR_COLOR),
        ));
        let line_area = Rect {
            x: area.x + 1,
            y,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(line), line_area);
        y += 1;
    }

    // Quit hint
    let quit_area = Rect {
        x: area.x,
        y: area.y + area.height - 1,
        width: area.width,
        height: 1,
    };
    let quit = Paragraph::new(Line::from(Span::styled(
        "Press q to quit",
        Style::default().fg(theme::DIM_TEXT),
    )))
    .alignment(Alignment::Center);
    f.render_widget(quit, quit_area);
}

fn render_hero(f: &mut Frame, area: Rect, app: &App) {
    let col_width = (area.width / 3) as usize;
    let result = &app.result;

    let mut spans_top = Vec::new();
    let mut spans_mid = Vec::new();

    let mut push = |label: &str, value: Option<String>, color: Color| {
        match value {
            Some(value) => {
                spans_top.push(Span::styled(
                    pad_center(label, col_width),
                    Style::default().fg(color),
                ));
                spans_mid.push(Span::styled(
                    pad_center(&value, col_width),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ));
            }
            None => {
                spans_top.push(Span::raw(pad_center("", col_width)));
                spans_mid.push(Span::raw(pad_center("", col_width)));
            }
        }
    };

    push(
        "↓ DOWNLOAD",
        result.best_download().map(|r| app.unit.format(r.bits_per_second)),
        theme::DOWNLOAD_COLOR,
    );
    push(
        "↑ UPLOAD",
        result.best_upload().map(|r| app.unit.format(r.bits_per_second)),
        theme::UPLOAD_COLOR,
    );
    push(
        "⏱ LATENCY",
        result.best_latency().map(|l| format!("{:.1} ms", l.avg_ms)),
        theme::LATENCY_COLOR,
    );

    let lines = vec![
        Line::from(spans_top),
        Line::from(vec![]),
        Line::from(spans_mid),
    ];
    let paragraph = Paragraph::new(lines).alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn render_server_table(f: &mut Frame, area: Rect, reports: &[ServerReport], unit: SpeedUnit) {
    let dim = Style::default().fg(theme::DIM_TEXT);
    let header = Row::new([
        Cell::from(Span::styled(
            "Server",
            Style::default()
                .fg(theme::BRIGHT_TEXT)
                .add_modifier(Modifier::BOLD),
        )),
        Cell::from(Span::styled("download", dim)),
        Cell::from(Span::styled("upload", dim)),
        Cell::from(Span::styled("latency", dim)),
    ]);

    let transfer_cell = |report: &Option<TransferReport>| match report {
        Some(r) => Cell::from(Line::from(vec![
            Span::styled(
                format!("{:>12}", unit.format(r.bits_per_second)),
                Style::default().fg(theme::BRIGHT_TEXT),
            ),
            Span::raw(" "),
            Span::styled(r.rating.to_string(), Style::default().fg(theme::rating_color(r.rating))),
        ])),
        None => Cell::from(Span::styled("-", dim)),
    };

    let rows: Vec<Row> = reports
        .iter()
        .map(|r| {
            let latency = r
                .latency
                .as_ref()
                .filter(|l| !l.samples.is_empty())
                .map(|l| format!("{:.1} ms", l.avg_ms))
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(Span::styled(r.server.clone(), dim)),
                transfer_cell(&r.download),
                transfer_cell(&r.upload),
                Cell::from(Span::styled(latency, Style::default().fg(theme::LATENCY_COLOR))),
            ])
        })
        .collect();

    let transfer_width = if unit == SpeedUnit::Both { 38 } else { 24 };
    let widths = [
        Constraint::Min(12),
        Constraint::Length(transfer_width),
        Constraint::Length(transfer_width),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header);
    f.render_widget(table, area);
}

fn pad_center(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{s}", " ".repeat(pad))
}
