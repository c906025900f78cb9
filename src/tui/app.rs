use crate::engine::types::*;

/// Points kept in the live throughput chart.
const CHART_CAPACITY: usize = 240;

/// Current phase of the speed test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Latency,
    Download,
    Upload,
    Results,
    Cancelled,
    Failed,
}

/// TUI application state, updated by consuming SpeedTestEvents.
pub struct App {
    pub phase: Phase,
    pub unit: SpeedUnit,
    pub config: SpeedTestConfig,

    // Server being tested
    pub current_server: Option<String>,
    pub server_index: usize,
    pub server_total: usize,

    // Latency
    pub latency_samples: Vec<f64>,
    pub latency_index: u32,
    pub latency_total: u32,
    pub latency_result: Option<LatencyResult>,

    // Throughput
    pub current_test_type: Option<TestType>,
    pub current_mbps: f64,
    pub transfer_percent: Option<f64>,
    pub chart_data: Vec<f64>,

    // Reports and failures collected so far
    pub result: SpeedTestResult,

    // Errors
    pub errors: Vec<String>,

    pub should_quit: bool,
}

impl App {
    pub fn new(config: SpeedTestConfig, unit: SpeedUnit, server_total: usize) -> Self {
        Self {
            phase: Phase::Connecting,
            unit,
            latency_total: config.nr_latency_tests,
            config,
            current_server: None,
            server_index: 0,
            server_total,
            latency_samples: Vec::new(),
            latency_index: 0,
            latency_result: None,
            current_test_type: None,
            current_mbps: 0.0,
            transfer_percent: None,
            chart_data: Vec::new(),
            result: SpeedTestResult::default(),
            errors: Vec::new(),
            should_quit: false,
        }
    }

    /// Whether the engine has stopped producing events.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Results | Phase::Cancelled | Phase::Failed)
    }

    /// Process a speed test event and update state.
    pub fn handle_event(&mut self, event: SpeedTestEvent) {
        let percent = event.percent();
        match event {
            SpeedTestEvent::ServerStart {
                server,
                index,
                total,
            } => {
                self.current_server = Some(server);
                self.server_index = index;
                self.server_total = total;
                self.phase = Phase::Latency;
                self.latency_samples.clear();
                self.latency_index = 0;
                self.latency_result = None;
                self.current_test_type = None;
                self.chart_data.clear();
                self.current_mbps = 0.0;
                self.transfer_percent = None;
            }
            SpeedTestEvent::LatencySample {
                rtt_ms,
                index,
                total,
            } => {
                self.latency_samples.push(rtt_ms);
                self.latency_index = index;
                self.latency_total = total;
            }
            SpeedTestEvent::LatencyComplete(result) => {
                self.latency_result = Some(result);
            }
            SpeedTestEvent::PhaseStart(test_type) => {
                self.phase = match test_type {
                    TestType::Download => Phase::Download,
                    TestType::Upload => Phase::Upload,
                };
                self.current_test_type = Some(test_type);
                self.chart_data.clear();
                self.current_mbps = 0.0;
                self.transfer_percent = Some(0.0);
            }
            SpeedTestEvent::TransferProgress { current_mbps, .. } => {
                self.transfer_percent = percent;
                self.current_mbps = current_mbps;
                if self.chart_data.len() >= CHART_CAPACITY {
                    self.chart_data.remove(0);
                }
                self.chart_data.push(current_mbps);
            }
            SpeedTestEvent::TransferComplete(report) => {
                self.current_mbps = report.mbps;
                self.transfer_percent = Some(100.0);
            }
            SpeedTestEvent::ServerFailed(failure) => {
                self.result.failures.push(failure);
            }
            SpeedTestEvent::ServerComplete(report) => {
                self.result.reports.push(report);
            }
            SpeedTestEvent::Complete(result) => {
                self.result = result;
                self.phase = Phase::Results;
            }
            SpeedTestEvent::Cancelled => {
                self.phase = Phase::Cancelled;
            }
            SpeedTestEvent::AllServersFailed => {
                self.phase = Phase::Failed;
            }
            SpeedTestEvent::Error(msg) => {
                self.errors.push(msg);
            }
        }
    }

    /// Progress within the current server as fraction (0.0..1.0).
    fn server_progress(&self) -> f64 {
        let latency_share = if self.config.nr_latency_tests > 0 { 0.2 } else { 0.0 };
        let directions = [self.config.download, self.config.upload]
            .iter()
            .filter(|d| **d)
            .count() as f64;
        let transfer_share = if directions > 0.0 {
            (1.0 - latency_share) / directions
        } else {
            0.0
        };
        let transfer_fraction = self.transfer_percent.unwrap_or(0.0) / 100.0;
        let latency_fraction = if self.latency_total == 0 {
            0.0
        } else {
            self.latency_index as f64 / self.latency_total as f64
        };

        match self.phase {
            Phase::Latency => latency_share * latency_fraction,
            Phase::Download => latency_share + transfer_share * transfer_fraction,
            Phase::Upload => {
                let done_before = if self.config.download {
                    transfer_share
                } else {
                    0.0
                };
                latency_share + done_before + transfer_share * transfer_fraction
            }
            _ => 0.0,
        }
    }

    /// Current overall progress across all servers as fraction (0.0..1.0).
    pub fn overall_progress(&self) -> f64 {
        match self.phase {
            Phase::Connecting => 0.0,
            Phase::Results | Phase::Cancelled | Phase::Failed => 1.0,
            _ => {
                if self.server_total == 0 {
                    return 0.0;
                }
                let done = self.server_index.saturating_sub(1) as f64;
                ((done + self.server_progress()) / self.server_total as f64).min(1.0)
            }
        }
    }
}
