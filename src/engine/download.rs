use futures::StreamExt;
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

use super::error::SpeedTestError;
use super::types::{format_bytes, EventSender, SpeedTestEvent, TestType, TransferReport};

/// Run a single download test, optionally emitting progress events.
pub async fn test_download(
    client: &Client,
    url: &str,
    tx: Option<&EventSender>,
) -> Result<TransferReport, SpeedTestError> {
    let start = Instant::now();
    let resp = client.get(url).send().await?.error_for_status()?;
    let expected = resp.content_length();

    let mut total_bytes: u64 = 0;
    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        total_bytes += chunk.len() as u64;

        if let Some(tx) = tx {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let current_mbps = (total_bytes as f64 * 8.0) / (elapsed * 1_000_000.0);
                let _ = tx.try_send(SpeedTestEvent::TransferProgress {
                    test_type: TestType::Download,
                    bytes_so_far: total_bytes,
                    total_bytes: expected,
                    current_mbps,
                });
            }
        }
    }

    let report = TransferReport::new(TestType::Download, total_bytes, start.elapsed());
    debug!(
        "Download {}: {:.1} Mbps in {:.0}ms",
        format_bytes(total_bytes as usize),
        report.mbps,
        report.elapsed_ms
    );

    Ok(report)
}
