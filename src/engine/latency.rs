use reqwest::Client;
use std::time::Instant;
use tracing::{debug, warn};

use super::error::SpeedTestError;

/// Run a single latency measurement against `url`.
///
/// Sends a HEAD request and measures the time to response headers minus
/// server processing time (from the Server-Timing header, when present).
pub async fn test_latency(client: &Client, url: &str) -> Result<f64, SpeedTestError> {
    let start = Instant::now();
    let resp = client.head(url).send().await?;
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;

    let server_time_ms = resp
        .headers()
        .get("server-timing")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_server_timing)
        .unwrap_or(0.0);

    let latency = total_ms - server_time_ms;
    if latency < 0.0 {
        warn!("Negative latency calculated ({latency:.2}ms), clamping to 0");
        Ok(0.0)
    } else {
        debug!("Latency: {latency:.2}ms (total: {total_ms:.2}ms, server: {server_time_ms:.2}ms)");
        Ok(latency)
    }
}

/// Parse `name;dur=X.XX` from a Server-Timing header.
fn parse_server_timing(header: &str) -> Option<f64> {
    header
        .split([';', ','])
        .find_map(|p| p.trim().strip_prefix("dur="))
        .and_then(|v| v.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_timing() {
        assert_eq!(
            parse_server_timing("cfRequestDuration;dur=12.34"),
            Some(12.34)
        );
        assert_eq!(parse_server_timing("app;dur=0.5, db;dur=3"), Some(0.5));
        assert_eq!(parse_server_timing("invalid"), None);
        assert_eq!(parse_server_timing(""), None);
    }
}
