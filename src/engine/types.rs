use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::rating::SpeedRating;

/// Which direction a throughput test measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Download,
    Upload,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Download => write!(f, "Download"),
            TestType::Upload => write!(f, "Upload"),
        }
    }
}

/// The part of a server run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Latency,
    Download,
    Upload,
}

impl From<TestType> for Stage {
    fn from(test_type: TestType) -> Self {
        match test_type {
            TestType::Download => Stage::Download,
            TestType::Upload => Stage::Upload,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Latency => write!(f, "latency"),
            Stage::Download => write!(f, "download"),
            Stage::Upload => write!(f, "upload"),
        }
    }
}

/// Unit used when rendering speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedUnit {
    #[default]
    Mbps,
    MegabytesPerSec,
    /// Mbps, followed by the same speed in MB/s.
    Both,
}

impl SpeedUnit {
    pub fn convert(self, bits_per_second: f64) -> f64 {
        match self {
            SpeedUnit::Mbps | SpeedUnit::Both => bits_per_second / 1_000_000.0,
            SpeedUnit::MegabytesPerSec => bits_per_second / 8_000_000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::Mbps | SpeedUnit::Both => "Mbps",
            SpeedUnit::MegabytesPerSec => "MB/s",
        }
    }

    pub fn format(self, bits_per_second: f64) -> String {
        match self {
            SpeedUnit::Both => format!(
                "{} / {}",
                SpeedUnit::Mbps.format(bits_per_second),
                SpeedUnit::MegabytesPerSec.format(bits_per_second)
            ),
            unit => format!("{:.2} {}", unit.convert(bits_per_second), unit.label()),
        }
    }
}

/// Outcome of a single download or upload.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub test_type: TestType,
    pub bytes: u64,
    pub elapsed_ms: f64,
    pub bits_per_second: f64,
    pub mbps: f64,
    pub rating: SpeedRating,
}

impl TransferReport {
    pub fn new(test_type: TestType, bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let bits_per_second = if secs > 0.0 {
            bytes as f64 * 8.0 / secs
        } else {
            0.0
        };
        let mbps = bits_per_second / 1_000_000.0;
        Self {
            test_type,
            bytes,
            elapsed_ms: secs * 1000.0,
            bits_per_second,
            mbps,
            rating: SpeedRating::from_rounded_mbps(mbps),
        }
    }

    pub fn megabytes_per_second(&self) -> f64 {
        SpeedUnit::MegabytesPerSec.convert(self.bits_per_second)
    }
}

/// Aggregated latency results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencyResult {
    pub avg_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub jitter_ms: f64,
    pub samples: Vec<f64>,
}

impl LatencyResult {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let (min_ms, _q1, median_ms, _q3, max_ms, avg_ms) = calc_stats(&samples);
        let jitter_ms = if samples.len() < 2 {
            0.0
        } else {
            let diffs: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
            diffs / (samples.len() - 1) as f64
        };
        Self {
            avg_ms,
            median_ms,
            min_ms,
            max_ms,
            jitter_ms,
            samples,
        }
    }
}

/// Everything measured against one server that completed its run.
#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    pub server: String,
    pub latency: Option<LatencyResult>,
    pub download: Option<TransferReport>,
    pub upload: Option<TransferReport>,
}

/// A server that was abandoned, and why.
#[derive(Debug, Clone, Serialize)]
pub struct ServerFailure {
    pub server: String,
    pub stage: Stage,
    pub reason: String,
}

/// Final result of a complete speed test run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpeedTestResult {
    pub reports: Vec<ServerReport>,
    pub failures: Vec<ServerFailure>,
}

impl SpeedTestResult {
    pub fn best_download(&self) -> Option<&TransferReport> {
        best_transfer(self.reports.iter().filter_map(|r| r.download.as_ref()))
    }

    pub fn best_upload(&self) -> Option<&TransferReport> {
        best_transfer(self.reports.iter().filter_map(|r| r.upload.as_ref()))
    }

    pub fn best_latency(&self) -> Option<&LatencyResult> {
        self.reports
            .iter()
            .filter_map(|r| r.latency.as_ref())
            .filter(|l| !l.samples.is_empty())
            .min_by(|a, b| a.avg_ms.total_cmp(&b.avg_ms))
    }
}

fn best_transfer<'a>(
    reports: impl Iterator<Item = &'a TransferReport>,
) -> Option<&'a TransferReport> {
    reports.max_by(|a, b| a.bits_per_second.total_cmp(&b.bits_per_second))
}

/// Events emitted by the engine for real-time consumption.
#[derive(Debug, Clone)]
pub enum SpeedTestEvent {
    ServerStart {
        server: String,
        index: usize,
        total: usize,
    },
    LatencySample {
        rtt_ms: f64,
        index: u32,
        total: u32,
    },
    LatencyComplete(LatencyResult),
    PhaseStart(TestType),
    TransferProgress {
        test_type: TestType,
        bytes_so_far: u64,
        total_bytes: Option<u64>,
        current_mbps: f64,
    },
    TransferComplete(TransferReport),
    ServerFailed(ServerFailure),
    ServerComplete(ServerReport),
    Complete(SpeedTestResult),
    Cancelled,
    AllServersFailed,
    Error(String),
}

impl SpeedTestEvent {
    /// Completion of a transfer in percent, if the event carries one.
    pub fn percent(&self) -> Option<f64> {
        match self {
            SpeedTestEvent::TransferProgress {
                bytes_so_far,
                total_bytes: Some(total),
                ..
            } if *total > 0 => Some((*bytes_so_far as f64 / *total as f64 * 100.0).min(100.0)),
            _ => None,
        }
    }
}

pub type EventSender = mpsc::Sender<SpeedTestEvent>;

pub const DEFAULT_UPLOAD_SIZE: usize = 25_000_000;
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(20);

/// Configuration for a speed test run.
#[derive(Debug, Clone)]
pub struct SpeedTestConfig {
    pub nr_latency_tests: u32,
    pub upload_size: usize,
    pub phase_timeout: Duration,
    pub download: bool,
    pub upload: bool,
    /// Stop after this many servers completed successfully.
    pub max_servers: Option<usize>,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            nr_latency_tests: 10,
            upload_size: DEFAULT_UPLOAD_SIZE,
            phase_timeout: DEFAULT_PHASE_TIMEOUT,
            download: true,
            upload: true,
            max_servers: None,
        }
    }
}

/// Compute statistics for a slice of f64 values.
pub fn calc_stats(values: &[f64]) -> (f64, f64, f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let median = calc_median(&sorted);

    let (lower, upper) = if sorted.len().is_multiple_of(2) {
        let mid = sorted.len() / 2;
        (&sorted[..mid], &sorted[mid..])
    } else {
        let mid = sorted.len().div_ceil(2);
        (&sorted[..mid], &sorted[sorted.len() - mid..])
    };
    let q1 = calc_median(lower);
    let q3 = calc_median(upper);

    (min, q1, median, q3, max, avg)
}

fn calc_median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Format bytes into a human-readable string.
pub fn format_bytes(bytes: usize) -> String {
    match bytes {
        1_000..=999_999 => format!("{}KB", bytes / 1_000),
        1_000_000..=999_999_999 => format!("{}MB", bytes / 1_000_000),
        1_000_000_000..=999_999_999_999 => format!("{}GB", bytes / 1_000_000_000),
        _ => format!("{bytes} bytes"),
    }
}

/// Parse a payload size such as `25m`, `100kb` or `1_000_000` into bytes.
pub fn parse_size(input: &str) -> Result<usize, String> {
    let normalized = input.trim().to_lowercase().replace('_', "");
    let (digits, multiplier) = if let Some(n) = normalized
        .strip_suffix("gb")
        .or_else(|| normalized.strip_suffix('g'))
    {
        (n, 1_000_000_000)
    } else if let Some(n) = normalized
        .strip_suffix("mb")
        .or_else(|| normalized.strip_suffix('m'))
    {
        (n, 1_000_000)
    } else if let Some(n) = normalized
        .strip_suffix("kb")
        .or_else(|| normalized.strip_suffix('k'))
    {
        (n, 1_000)
    } else {
        (normalized.as_str(), 1)
    };

    let value: usize = digits
        .parse()
        .map_err(|_| format!("Invalid size '{input}', expected e.g. 100k, 10m or 25000000"))?;
    match value.checked_mul(multiplier) {
        Some(0) => Err("Size must be greater than zero".to_string()),
        Some(bytes) => Ok(bytes),
        None => Err(format!("Size '{input}' is too large")),
    }
}
