use std::fs::OpenOptions;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use speedtest_client::cli::{Cli, OutputMode};
use speedtest_client::engine::cancel::{cancel_signal, CancelToken};
use speedtest_client::engine::client::build_client;
use speedtest_client::engine::error::SpeedTestError;
use speedtest_client::engine::ping::{ping, DEFAULT_PING_TIMEOUT};
use speedtest_client::engine::runner::run_speed_test;
use speedtest_client::engine::servers::ServerList;
use speedtest_client::engine::types::{
    SpeedTestConfig, SpeedTestEvent, SpeedTestResult, SpeedUnit,
};
use speedtest_client::output;
use speedtest_client::tui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        clap_complete::generate(shell, &mut Cli::command(), "speedtest-client", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_tracing(&cli) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e.downcast_ref::<SpeedTestError>(), Some(SpeedTestError::Cancelled)) {
                eprintln!("Speed test cancelled");
                ExitCode::from(130)
            } else {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    if let Some(ref path) = cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if cli.output_mode() == OutputMode::Tui && cli.ping.is_none() {
        // Log lines would tear the alternate screen apart.
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .with_writer(io::sink)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let local_addr = cli.local_address().map_err(|e| anyhow!(e))?;
    let client = build_client(local_addr)?;
    let mode = cli.output_mode();

    if let Some(ref host) = cli.ping {
        let result = ping(host, DEFAULT_PING_TIMEOUT).await?;
        let mut stdout = io::stdout().lock();
        match mode {
            OutputMode::Json => output::json::write_json(&mut stdout, &result)?,
            OutputMode::JsonPretty => output::json::write_json_pretty(&mut stdout, &result)?,
            _ => output::simple::write_ping(&mut stdout, &result)?,
        }
        return Ok(());
    }

    let servers = match cli.servers {
        Some(ref path) => ServerList::from_file(path)
            .with_context(|| format!("Failed to load servers from {}", path.display()))?,
        None => ServerList::builtin()?,
    };
    let servers = match cli.server {
        Some(ref name) => servers.filter(name)?,
        None => servers,
    };

    let config = cli.to_config();
    let unit = SpeedUnit::from(cli.units);
    let (canceller, cancel) = cancel_signal();

    let result = if mode == OutputMode::Tui {
        tui::run(client, servers, config, unit, canceller, cancel).await?
    } else {
        let ctrl_c = canceller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling speed test");
                ctrl_c.cancel();
            }
        });
        run_headless(&client, &servers, &config, cancel).await?
    };

    let mut stdout = io::stdout().lock();
    match mode {
        // The TUI leaves nothing behind once the alternate screen closes.
        OutputMode::Tui | OutputMode::Simple => {
            output::simple::write_simple(&mut stdout, &result, unit)?
        }
        OutputMode::Json => output::json::write_json(&mut stdout, &result)?,
        OutputMode::JsonPretty => output::json::write_json_pretty(&mut stdout, &result)?,
        OutputMode::Csv => output::csv::write_csv(&mut stdout, &result)?,
    }
    stdout.flush()?;

    if let Some(ref path) = cli.output_file {
        output::file::write_report(path, &result)?;
    }

    Ok(())
}

/// Run without a UI; engine events only feed the log.
async fn run_headless(
    client: &reqwest::Client,
    servers: &ServerList,
    config: &SpeedTestConfig,
    cancel: CancelToken,
) -> Result<SpeedTestResult> {
    let (tx, mut rx) = mpsc::channel::<SpeedTestEvent>(256);

    let drain = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SpeedTestEvent::TransferProgress { .. } | SpeedTestEvent::LatencySample { .. } => {}
                SpeedTestEvent::ServerFailed(failure) => {
                    warn!("{}: {} failed ({})", failure.server, failure.stage, failure.reason)
                }
                other => debug!("{other:?}"),
            }
        }
    });

    let result = run_speed_test(client, servers, config, tx, cancel).await;
    let _ = drain.await;
    Ok(result?)
}
