use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

use super::error::SpeedTestError;

pub const DEFAULT_PING_PORT: u16 = 80;
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a reachability check.
#[derive(Debug, Clone, Serialize)]
pub struct PingResult {
    pub host: String,
    pub address: SocketAddr,
    pub reachable: bool,
    pub elapsed_ms: f64,
}

impl fmt::Display for PingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reachable {
            write!(f, "Success from {} in {:.0}ms", self.host, self.elapsed_ms)
        } else {
            write!(f, "Failed: Host not reachable")
        }
    }
}

/// Check whether `host` accepts a TCP connection within `timeout`.
///
/// `host` may carry a port (`example.com:443`, `[::1]:8080`); port 80 is
/// used otherwise. The elapsed time includes name resolution.
pub async fn ping(host: &str, timeout: Duration) -> Result<PingResult, SpeedTestError> {
    let (name, port) = split_host_port(host)?;
    let start = Instant::now();

    let address = lookup_host((name.as_str(), port))
        .await
        .map_err(|e| SpeedTestError::Resolve {
            host: name.clone(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| SpeedTestError::Resolve {
            host: name.clone(),
            reason: "no addresses found".to_string(),
        })?;

    let remaining = timeout.saturating_sub(start.elapsed());
    let reachable = match tokio::time::timeout(remaining, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!("Connect to {address} failed: {e}");
            false
        }
        Err(_) => {
            debug!("Connect to {address} timed out after {timeout:?}");
            false
        }
    };

    Ok(PingResult {
        host: host.to_string(),
        address,
        reachable,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

fn split_host_port(input: &str) -> Result<(String, u16), SpeedTestError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SpeedTestError::Other("Please enter a host to ping".to_string()));
    }

    let parse_port = |p: &str| {
        p.parse::<u16>()
            .map_err(|_| SpeedTestError::Other(format!("Invalid port '{p}' in '{input}'")))
    };

    if let Some(rest) = input.strip_prefix('[') {
        let (addr, tail) = rest
            .split_once(']')
            .ok_or_else(|| SpeedTestError::Other(format!("Unterminated '[' in '{input}'")))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => parse_port(p)?,
            None => DEFAULT_PING_PORT,
        };
        return Ok((addr.to_string(), port));
    }

    match input.rsplit_once(':') {
        // A bare IPv6 address has more than one colon and no port.
        Some((name, port)) if !name.contains(':') => Ok((name.to_string(), parse_port(port)?)),
        _ => Ok((input.to_string(), DEFAULT_PING_PORT)),
    }
}
