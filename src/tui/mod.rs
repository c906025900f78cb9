pub mod app;
pub mod theme;
pub mod ui;
pub mod widgets;

use std::io;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::cancel::{CancelToken, Canceller};
use crate::engine::runner::run_speed_test;
use crate::engine::servers::ServerList;
use crate::engine::types::{SpeedTestConfig, SpeedTestEvent, SpeedTestResult, SpeedUnit};

use app::App;

/// Run the full-screen TUI speed test.
pub async fn run(
    client: reqwest::Client,
    servers: ServerList,
    config: SpeedTestConfig,
    unit: SpeedUnit,
    canceller: Canceller,
    cancel: CancelToken,
) -> Result<SpeedTestResult> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_inner(&mut terminal, client, servers, config, unit, canceller, cancel).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_inner(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: reqwest::Client,
    servers: ServerList,
    config: SpeedTestConfig,
    unit: SpeedUnit,
    canceller: Canceller,
    cancel: CancelToken,
) -> Result<SpeedTestResult> {
    let mut app = App::new(config.clone(), unit, servers.len());

    let (tx, mut rx) = mpsc::channel::<SpeedTestEvent>(256);

    // Spawn engine
    let engine_handle = tokio::spawn(async move {
        run_speed_test(&client, &servers, &config, tx, cancel).await
    });

    let tick_rate = Duration::from_millis(50);

    loop {
        // Draw
        terminal.draw(|f| ui::draw(f, &app))?;

        // Drain all pending engine events
        loop {
            match rx.try_recv() {
                Ok(event) => app.handle_event(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }

        // Check for key events (non-blocking)
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let ctrl_c = key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL);
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        _ if ctrl_c => app.should_quit = true,
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            if !app.is_finished() {
                debug!("Quit requested while running, cancelling");
                canceller.cancel();
            }
            break;
        }
    }

    // Wait for engine to finish (or abort)
    drop(rx);
    let outcome = engine_handle
        .await
        .map_err(|e| anyhow!("speed test task failed: {e}"))?;
    Ok(outcome?)
}
