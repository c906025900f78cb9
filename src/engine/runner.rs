use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::cancel::CancelToken;
use super::download::test_download;
use super::error::SpeedTestError;
use super::latency::test_latency;
use super::servers::{Server, ServerList};
use super::types::*;
use super::upload::test_upload;

/// Latency probing against a server stops after this many failures in a row.
const MAX_CONSECUTIVE_LATENCY_FAILURES: u32 = 3;

/// Run the speed test against every server in order, emitting events as
/// progress is made.
///
/// A server that fails or times out in any phase is recorded and skipped.
/// The run only fails when no server completes, or when it is cancelled.
pub async fn run_speed_test(
    client: &reqwest::Client,
    servers: &ServerList,
    config: &SpeedTestConfig,
    tx: EventSender,
    mut cancel: CancelToken,
) -> Result<SpeedTestResult, SpeedTestError> {
    let mut result = SpeedTestResult::default();
    let total = servers.len();

    for (i, server) in servers.servers().iter().enumerate() {
        if config
            .max_servers
            .is_some_and(|max| result.reports.len() >= max)
        {
            debug!("Reached {} successful servers, stopping", result.reports.len());
            break;
        }

        info!("Testing server {} ({}/{total})", server.name, i + 1);
        let _ = tx
            .send(SpeedTestEvent::ServerStart {
                server: server.name.clone(),
                index: i + 1,
                total,
            })
            .await;

        match run_server(client, server, config, &tx, &mut cancel).await {
            Ok(report) => {
                let _ = tx.send(SpeedTestEvent::ServerComplete(report.clone())).await;
                result.reports.push(report);
            }
            Err((_, SpeedTestError::Cancelled)) => {
                info!("Speed test cancelled during {}", server.name);
                let _ = tx.send(SpeedTestEvent::Cancelled).await;
                return Err(SpeedTestError::Cancelled);
            }
            Err((stage, e)) => {
                warn!("{stage} failed on {}: {e}. Trying next server.", server.name);
                let failure = ServerFailure {
                    server: server.name.clone(),
                    stage,
                    reason: e.to_string(),
                };
                let _ = tx.send(SpeedTestEvent::ServerFailed(failure.clone())).await;
                result.failures.push(failure);
            }
        }
    }

    if result.reports.is_empty() {
        error!("All {} speed test servers failed", result.failures.len());
        let _ = tx.send(SpeedTestEvent::AllServersFailed).await;
        return Err(SpeedTestError::AllServersFailed);
    }

    let _ = tx.send(SpeedTestEvent::Complete(result.clone())).await;
    Ok(result)
}

async fn run_server(
    client: &reqwest::Client,
    server: &Server,
    config: &SpeedTestConfig,
    tx: &EventSender,
    cancel: &mut CancelToken,
) -> Result<ServerReport, (Stage, SpeedTestError)> {
    let latency = if config.nr_latency_tests > 0 {
        Some(run_latency_tests(client, server, config, tx, cancel).await?)
    } else {
        None
    };

    let download = if config.download {
        let _ = tx
            .send(SpeedTestEvent::PhaseStart(TestType::Download))
            .await;
        let fut = test_download(client, &server.download_url, Some(tx));
        let report = guarded(fut, Stage::Download, config.phase_timeout, cancel)
            .await
            .map_err(|e| (Stage::Download, e))?;
        let _ = tx
            .send(SpeedTestEvent::TransferComplete(report.clone()))
            .await;
        Some(report)
    } else {
        None
    };

    let upload = if config.upload {
        let _ = tx.send(SpeedTestEvent::PhaseStart(TestType::Upload)).await;
        let fut = test_upload(client, &server.upload_url, config.upload_size, Some(tx));
        let report = guarded(fut, Stage::Upload, config.phase_timeout, cancel)
            .await
            .map_err(|e| (Stage::Upload, e))?;
        let _ = tx
            .send(SpeedTestEvent::TransferComplete(report.clone()))
            .await;
        Some(report)
    } else {
        None
    };

    Ok(ServerReport {
        server: server.name.clone(),
        latency,
        download,
        upload,
    })
}

async fn run_latency_tests(
    client: &reqwest::Client,
    server: &Server,
    config: &SpeedTestConfig,
    tx: &EventSender,
    cancel: &mut CancelToken,
) -> Result<LatencyResult, (Stage, SpeedTestError)> {
    let count = config.nr_latency_tests;
    let mut samples = Vec::with_capacity(count as usize);
    let mut consecutive_failures = 0;

    for i in 0..count {
        let fut = test_latency(client, server.latency_target());
        match guarded(fut, Stage::Latency, config.phase_timeout, cancel).await {
            Ok(rtt_ms) => {
                consecutive_failures = 0;
                samples.push(rtt_ms);
                let _ = tx
                    .send(SpeedTestEvent::LatencySample {
                        rtt_ms,
                        index: i + 1,
                        total: count,
                    })
                    .await;
            }
            Err(SpeedTestError::Cancelled) => {
                return Err((Stage::Latency, SpeedTestError::Cancelled));
            }
            Err(e) => {
                consecutive_failures += 1;
                debug!("Latency test {} on {} failed: {e}", i + 1, server.name);
                let _ = tx
                    .send(SpeedTestEvent::Error(format!(
                        "Latency test {} on {}: {e}",
                        i + 1,
                        server.name
                    )))
                    .await;
                if consecutive_failures >= MAX_CONSECUTIVE_LATENCY_FAILURES {
                    warn!(
                        "Giving up latency tests on {} after {consecutive_failures} failures",
                        server.name
                    );
                    break;
                }
            }
        }
    }

    let result = LatencyResult::from_samples(samples);
    let _ = tx
        .send(SpeedTestEvent::LatencyComplete(result.clone()))
        .await;
    Ok(result)
}

/// Bound `fut` by `limit` and abort it on cancellation.
async fn guarded<T, F>(
    fut: F,
    stage: Stage,
    limit: Duration,
    cancel: &mut CancelToken,
) -> Result<T, SpeedTestError>
where
    F: Future<Output = Result<T, SpeedTestError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SpeedTestError::Cancelled),
        res = tokio::time::timeout(limit, fut) => {
            res.unwrap_or_else(|_| Err(SpeedTestError::Timeout { stage, limit }))
        }
    }
}
