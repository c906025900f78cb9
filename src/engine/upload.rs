use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client};
use std::time::Instant;
use tracing::debug;

use super::error::SpeedTestError;
use super::types::{format_bytes, EventSender, SpeedTestEvent, TestType, TransferReport};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Run a single upload test with a generated payload of `size` bytes.
pub async fn test_upload(
    client: &Client,
    url: &str,
    size: usize,
    tx: Option<&EventSender>,
) -> Result<TransferReport, SpeedTestError> {
    let total = size as u64;
    let progress_tx = tx.cloned();
    let start = Instant::now();
    let mut sent: u64 = 0;

    let chunks = futures::stream::iter(chunk_lengths(size)).map(move |len| {
        sent += len as u64;
        if let Some(tx) = &progress_tx {
            let elapsed = start.elapsed().as_secs_f64();
            let current_mbps = if elapsed > 0.0 {
                (sent as f64 * 8.0) / (elapsed * 1_000_000.0)
            } else {
                0.0
            };
            let _ = tx.try_send(SpeedTestEvent::TransferProgress {
                test_type: TestType::Upload,
                bytes_so_far: sent,
                total_bytes: Some(total),
                current_mbps,
            });
        }
        Ok::<_, std::io::Error>(vec![1u8; len])
    });

    let resp = client
        .post(url)
        .header(CONTENT_LENGTH, total)
        .body(Body::wrap_stream(chunks))
        .send()
        .await?
        .error_for_status()?;
    let elapsed = start.elapsed();

    // Drain response body after timing
    let _ = resp.bytes().await?;

    let report = TransferReport::new(TestType::Upload, total, elapsed);
    debug!(
        "Upload {}: {:.1} Mbps in {:.0}ms",
        format_bytes(size),
        report.mbps,
        report.elapsed_ms
    );

    Ok(report)
}

fn chunk_lengths(size: usize) -> Vec<usize> {
    let mut lengths = vec![UPLOAD_CHUNK_SIZE; size / UPLOAD_CHUNK_SIZE];
    if size % UPLOAD_CHUNK_SIZE != 0 {
        lengths.push(size % UPLOAD_CHUNK_SIZE);
    }
    lengths
}
